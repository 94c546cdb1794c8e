// Uploaded document and format detection
use std::fs;
use std::path::Path;

use crate::types::{AnalyzerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Unsupported(String),
}

impl DocumentFormat {
    /// Detect from the filename suffix, ignoring case
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            _ => DocumentFormat::Unsupported(extension),
        }
    }
}

/// Raw upload bytes plus the name they arrived under. Lives for one request.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read an upload from disk, refusing files over `max_bytes` before
    /// any of it is loaded.
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(AnalyzerError::DocumentTooLarge { size, limit: max_bytes });
        }
        let bytes = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, bytes))
    }

    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_filename(&self.filename)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
