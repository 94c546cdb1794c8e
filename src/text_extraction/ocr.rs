// OCR fallback for pages without a text layer: pdftoppm raster + tesseract
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::process::Command;

use crate::config::OcrConfig;
use crate::types::{AnalyzerError, Result};
use crate::{debug_timing, debug_trace, debug_warn};

/// Recognises the text of a single PDF page from its rendered image.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    fn backend_id(&self) -> &str;

    /// `page_number` is 1-based, matching PDF page numbering.
    async fn recognize_page(&self, pdf_path: &Path, page_number: u32) -> Result<String>;
}

pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Both external tools must answer a version query
    pub fn is_available(&self) -> bool {
        let answers = |bin: &str, flag: &str| {
            std::process::Command::new(bin)
                .arg(flag)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        };

        let pdftoppm = answers(&self.config.pdftoppm_bin, "-v");
        let tesseract = answers(&self.config.tesseract_bin, "--version");
        if !pdftoppm {
            debug_warn!("{} not found - install poppler-utils for OCR", self.config.pdftoppm_bin);
        }
        if !tesseract {
            debug_warn!("{} not found - install tesseract-ocr for OCR", self.config.tesseract_bin);
        }
        pdftoppm && tesseract
    }

    /// Render one page to PNG inside `scratch`. The image is owned by the
    /// scratch directory and goes away with it.
    async fn rasterize(
        &self,
        pdf_path: &Path,
        page_number: u32,
        scratch: &TempDir,
    ) -> Result<PathBuf> {
        let prefix = scratch.path().join("page");
        let page = page_number.to_string();
        let dpi = self.config.dpi.to_string();

        let output = Command::new(&self.config.pdftoppm_bin)
            .args(["-f", &page, "-l", &page, "-r", &dpi, "-png", "-singlefile"])
            .arg(pdf_path)
            .arg(&prefix)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_failed(&self.config.pdftoppm_bin, e))?;

        if !output.status.success() {
            return Err(AnalyzerError::Ocr(format!(
                "pdftoppm failed for page {}: {}",
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let png = scratch.path().join("page.png");
        if !png.exists() {
            return Err(AnalyzerError::Ocr(format!(
                "pdftoppm produced no image for page {}",
                page_number
            )));
        }

        if self.config.grayscale {
            preprocess_for_ocr(&png)?;
        }

        Ok(png)
    }

    async fn run_tesseract(&self, image_path: &Path, page_number: u32) -> Result<String> {
        let output = Command::new(&self.config.tesseract_bin)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_failed(&self.config.tesseract_bin, e))?;

        if !output.status.success() {
            return Err(AnalyzerError::Ocr(format!(
                "tesseract failed for page {}: {}",
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl OcrBackend for TesseractOcr {
    fn backend_id(&self) -> &str {
        "tesseract"
    }

    async fn recognize_page(&self, pdf_path: &Path, page_number: u32) -> Result<String> {
        let start = Instant::now();
        let mut builder = tempfile::Builder::new();
        builder.prefix("pleading_ocr");
        let scratch = match &self.config.scratch_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        let secs = self.config.timeout_secs;

        let work = async {
            let png = self.rasterize(pdf_path, page_number, &scratch).await?;
            self.run_tesseract(&png, page_number).await
        };

        // Dropping `work` on timeout kills any child still running
        let result = match tokio::time::timeout(Duration::from_secs(secs), work).await {
            Ok(result) => result,
            Err(_) => Err(AnalyzerError::OcrTimeout { page: page_number, secs }),
        };

        if let Err(e) = scratch.close() {
            debug_warn!("could not remove OCR scratch dir: {}", e);
        }

        match &result {
            Ok(text) => debug_trace!("OCR page {}: {} chars", page_number, text.trim().len()),
            Err(e) => debug_warn!("OCR page {} failed: {}", page_number, e),
        }
        debug_timing!("ocr page", start);
        result
    }
}

fn spawn_failed(bin: &str, e: std::io::Error) -> AnalyzerError {
    AnalyzerError::Ocr(format!("failed to start {}: {}", bin, e))
}

/// Grayscale the rendered page in place; tesseract reads it back from disk.
fn preprocess_for_ocr(png: &Path) -> Result<()> {
    let img = image::open(png)
        .map_err(|e| AnalyzerError::Ocr(format!("cannot open rendered page: {}", e)))?;
    img.grayscale()
        .save(png)
        .map_err(|e| AnalyzerError::Ocr(format!("cannot save preprocessed page: {}", e)))
}
