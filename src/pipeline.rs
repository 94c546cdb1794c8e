// One document through extraction, field rules and NER
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::config::AnalyzerConfig;
use crate::document::{Document, DocumentFormat};
use crate::entities::{extract_named_entities_with, init_entity_model, EntityMap, NerBackend};
use crate::export;
use crate::fields::{extract_info, FieldSet};
use crate::text_extraction::{OcrBackend, PdfReport, TesseractOcr, TextExtractor};
use crate::types::{AnalyzerError, Result};
use crate::{debug_log, debug_timing, debug_warn};

/// Everything recovered from one document
#[derive(Debug, Clone)]
pub struct Analysis {
    pub filename: String,
    pub format: DocumentFormat,
    pub text: String,
    pub pdf_report: Option<PdfReport>,
    pub fields: FieldSet,
    pub entities: EntityMap,
}

impl Analysis {
    pub fn merged(&self) -> Map<String, Value> {
        export::merge(&self.fields, &self.entities)
    }

    pub fn to_csv(&self) -> Result<String> {
        export::to_csv(&self.merged())
    }

    pub fn to_json(&self) -> Result<String> {
        export::to_json(&self.merged())
    }
}

pub struct Analyzer {
    config: AnalyzerConfig,
    extractor: TextExtractor,
    ner: Arc<dyn NerBackend>,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig, ocr: Arc<dyn OcrBackend>, ner: Arc<dyn NerBackend>) -> Self {
        let extractor = TextExtractor::new(config.limits.clone(), ocr);
        Self { config, extractor, ner }
    }

    /// Tesseract OCR and the process-wide entity model. Loads the model if
    /// nothing has yet.
    pub fn from_config(config: AnalyzerConfig) -> Self {
        let tesseract = TesseractOcr::new(config.ocr.clone());
        if !tesseract.is_available() {
            debug_warn!("OCR tools missing, scanned pages will contribute no text");
        }
        let ner = init_entity_model(&config.ner);
        Self::new(config, Arc::new(tesseract), ner)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn ner_backend_id(&self) -> &str {
        self.ner.backend_id()
    }

    pub async fn analyze(&self, document: &Document) -> Result<Analysis> {
        let start = Instant::now();
        let extracted = self.extractor.try_extract(document).await?;
        if extracted.is_empty() {
            return Err(AnalyzerError::NoText);
        }

        let fields = extract_info(&extracted.text);

        // Inference is CPU-bound; keep it off the async workers
        let ner = Arc::clone(&self.ner);
        let text = extracted.text.clone();
        let entities =
            tokio::task::spawn_blocking(move || extract_named_entities_with(ner.as_ref(), &text))
                .await
                .map_err(|e| AnalyzerError::Model(format!("entity task failed: {}", e)))??;

        debug_log!(
            "{}: {} entity labels from {} backend",
            document.filename,
            entities.len(),
            self.ner.backend_id()
        );
        debug_timing!("analysis", start);

        Ok(Analysis {
            filename: document.filename.clone(),
            format: extracted.format,
            text: extracted.text,
            pdf_report: extracted.pdf_report,
            fields,
            entities,
        })
    }
}
