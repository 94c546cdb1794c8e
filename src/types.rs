// Core types for the pleading analyzer
use crate::config::USER_ERROR_MESSAGE;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Document too large: {size} bytes (limit {limit})")]
    DocumentTooLarge { size: u64, limit: u64 },

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("DOCX error: {0}")]
    Docx(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR timed out on page {page} after {secs}s")]
    OcrTimeout { page: u32, secs: u64 },

    #[error("Entity model error: {0}")]
    Model(String),

    #[error("No text could be extracted")]
    NoText,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalyzerError {
    /// Message suitable for showing to whoever uploaded the document.
    pub fn user_message(&self) -> String {
        match self {
            AnalyzerError::UnsupportedFormat(_)
            | AnalyzerError::NoText
            | AnalyzerError::Pdf(_)
            | AnalyzerError::Docx(_) => USER_ERROR_MESSAGE.to_string(),
            AnalyzerError::DocumentTooLarge { size, limit } => format!(
                "File is too large to analyze ({} bytes, limit is {} bytes).",
                size, limit
            ),
            AnalyzerError::Model(msg) => format!("Named entity recognition failed: {}", msg),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
