// PDF text: direct text layer first, OCR only for pages that have none
use lopdf::Document as PdfDocument;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;

use super::ocr::OcrBackend;
use crate::types::{AnalyzerError, Result};
use crate::{debug_log, debug_timing, debug_trace, debug_warn};

/// Outcome of one extraction stage on a page
#[derive(Debug, Clone, PartialEq)]
pub enum PageText {
    Found(String),
    Empty,
}

impl PageText {
    fn from_raw(raw: String) -> Self {
        if raw.trim().is_empty() {
            PageText::Empty
        } else {
            PageText::Found(raw)
        }
    }
}

/// How a page ended up contributing to the document text
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Direct,
    Ocr,
    Blank,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct PdfReport {
    pub total_pages: usize,
    pub pages: Vec<PageOutcome>,
    pub truncated: bool,
}

impl PdfReport {
    pub fn ocr_pages(&self) -> usize {
        self.pages.iter().filter(|p| **p == PageOutcome::Ocr).count()
    }
}

/// Upload bytes spooled to disk on first need; the OCR tools read files.
struct Spool<'a> {
    bytes: &'a [u8],
    file: Option<NamedTempFile>,
}

impl<'a> Spool<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, file: None }
    }

    fn path(&mut self) -> Result<&Path> {
        if self.file.is_none() {
            let mut file = tempfile::Builder::new()
                .prefix("pleading_upload")
                .suffix(".pdf")
                .tempfile()?;
            file.write_all(self.bytes)?;
            file.flush()?;
            self.file = Some(file);
        }
        match &self.file {
            Some(file) => Ok(file.path()),
            None => Err(AnalyzerError::Pdf("upload spool unavailable".into())),
        }
    }
}

pub struct PdfTextExtractor<'a> {
    ocr: &'a dyn OcrBackend,
    max_pages: usize,
}

impl<'a> PdfTextExtractor<'a> {
    pub fn new(ocr: &'a dyn OcrBackend, max_pages: usize) -> Self {
        Self { ocr, max_pages }
    }

    pub async fn extract(&self, bytes: &[u8]) -> Result<(String, PdfReport)> {
        let start = Instant::now();
        let document = PdfDocument::load_mem(bytes)
            .map_err(|e| AnalyzerError::Pdf(format!("cannot open PDF: {}", e)))?;

        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        let mut report = PdfReport {
            total_pages: page_numbers.len(),
            ..PdfReport::default()
        };

        if page_numbers.len() > self.max_pages {
            debug_warn!(
                "PDF has {} pages, only the first {} are processed",
                page_numbers.len(),
                self.max_pages
            );
            report.truncated = true;
        }

        let mut spool = Spool::new(bytes);
        let mut text = String::new();

        for &page_number in page_numbers.iter().take(self.max_pages) {
            let outcome = match self.page_text(&document, &mut spool, page_number).await {
                Ok((PageText::Found(page_text), outcome)) => {
                    text.push_str(&page_text);
                    text.push('\n');
                    outcome
                }
                Ok((PageText::Empty, outcome)) => outcome,
                Err(e) => {
                    debug_warn!("page {} contributed no text: {}", page_number, e);
                    PageOutcome::Failed(e.to_string())
                }
            };
            report.pages.push(outcome);
        }

        debug_log!(
            "PDF: {} pages processed, {} via OCR",
            report.pages.len(),
            report.ocr_pages()
        );
        debug_timing!("pdf extraction", start);
        Ok((text, report))
    }

    /// Direct text, then OCR. OCR runs only when the text layer is empty
    /// or unreadable.
    async fn page_text(
        &self,
        document: &PdfDocument,
        spool: &mut Spool<'_>,
        page_number: u32,
    ) -> Result<(PageText, PageOutcome)> {
        match direct_text(document, page_number) {
            Ok(PageText::Found(text)) => return Ok((PageText::Found(text), PageOutcome::Direct)),
            Ok(PageText::Empty) => {
                debug_trace!("page {} has no text layer, trying OCR", page_number);
            }
            Err(e) => {
                debug_warn!("direct text failed on page {}: {}, trying OCR", page_number, e);
            }
        }

        let pdf_path = spool.path()?;
        let recognized = self.ocr.recognize_page(pdf_path, page_number).await?;
        match PageText::from_raw(recognized) {
            PageText::Found(text) => Ok((PageText::Found(text), PageOutcome::Ocr)),
            PageText::Empty => Ok((PageText::Empty, PageOutcome::Blank)),
        }
    }
}

fn direct_text(document: &PdfDocument, page_number: u32) -> Result<PageText> {
    document
        .extract_text(&[page_number])
        .map(PageText::from_raw)
        .map_err(|e| AnalyzerError::Pdf(format!("page {}: {}", page_number, e)))
}
