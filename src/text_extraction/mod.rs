// Text extraction: any supported upload -> one normalized plain-text string
pub mod docx;
pub mod ocr;
pub mod pdf;

use std::sync::Arc;
use std::time::Instant;

pub use docx::extract_docx_text;
pub use ocr::{OcrBackend, TesseractOcr};
pub use pdf::{PageOutcome, PageText, PdfReport, PdfTextExtractor};

use crate::config::LimitsConfig;
use crate::document::{Document, DocumentFormat};
use crate::types::{AnalyzerError, Result};
use crate::{debug_error, debug_log, debug_timing};

/// Plain text plus how it was obtained
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentFormat,
    /// Present for PDFs only
    pub pdf_report: Option<PdfReport>,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub struct TextExtractor {
    limits: LimitsConfig,
    ocr: Arc<dyn OcrBackend>,
}

impl TextExtractor {
    pub fn new(limits: LimitsConfig, ocr: Arc<dyn OcrBackend>) -> Self {
        Self { limits, ocr }
    }

    /// Extraction with explicit errors for unsupported, oversized or
    /// unreadable uploads. Individual PDF pages never fail the document.
    pub async fn try_extract(&self, document: &Document) -> Result<ExtractedText> {
        let start = Instant::now();
        let format = document.format();

        let (raw, pdf_report) = match &format {
            DocumentFormat::Pdf => {
                self.check_size(document)?;
                let extractor = PdfTextExtractor::new(self.ocr.as_ref(), self.limits.max_pages);
                let (text, report) = extractor.extract(&document.bytes).await?;
                (text, Some(report))
            }
            DocumentFormat::Docx => {
                self.check_size(document)?;
                (extract_docx_text(&document.bytes, self.limits.max_docx_xml_bytes)?, None)
            }
            DocumentFormat::Unsupported(ext) => {
                let shown = if ext.is_empty() { &document.filename } else { ext };
                return Err(AnalyzerError::UnsupportedFormat(shown.clone()));
            }
        };

        let text = normalize_line_endings(&raw);
        debug_log!("{}: {} chars of text", document.filename, text.len());
        debug_timing!("text extraction", start);

        Ok(ExtractedText {
            text,
            format,
            pdf_report,
        })
    }

    fn check_size(&self, document: &Document) -> Result<()> {
        if document.size() > self.limits.max_upload_bytes {
            return Err(AnalyzerError::DocumentTooLarge {
                size: document.size(),
                limit: self.limits.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Never fails: anything that goes wrong is logged and yields "".
    pub async fn extract_text(&self, document: &Document) -> String {
        match self.try_extract(document).await {
            Ok(extracted) => extracted.text,
            Err(e) => {
                debug_error!("text extraction failed for {}: {}", document.filename, e);
                String::new()
            }
        }
    }
}

pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
