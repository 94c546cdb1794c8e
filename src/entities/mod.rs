//! Named entity recognition over extracted pleading text.
//!
//! Recognition is delegated to a [`NerBackend`]. The ONNX token
//! classification backend is preferred; when its model files are missing the
//! regex backend stands in so a result is always produced. One backend is
//! loaded per process and shared read-only by every request.

pub mod onnx;
pub mod patterns;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

pub use onnx::OnnxNerBackend;
pub use patterns::PatternNerBackend;

use crate::config::NerConfig;
use crate::types::Result;
use crate::{debug_log, debug_timing, debug_warn};

/// Label -> unique entity texts. Sorted, so output is reproducible.
pub type EntityMap = BTreeMap<String, BTreeSet<String>>;

/// One recognised span. Offsets are byte offsets into the text handed to
/// the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub label: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

pub trait NerBackend: Send + Sync {
    fn backend_id(&self) -> &str;

    /// Largest text slice `recognize` should be handed at once
    fn max_chunk_bytes(&self) -> usize;

    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>>;
}

static ENTITY_MODEL: OnceCell<Arc<dyn NerBackend>> = OnceCell::new();

/// Load the process-wide backend. The first caller loads it; concurrent
/// callers block until it is ready and every later call is a lookup.
pub fn init_entity_model(config: &NerConfig) -> Arc<dyn NerBackend> {
    ENTITY_MODEL.get_or_init(|| load_backend(config)).clone()
}

pub fn entity_model() -> Option<Arc<dyn NerBackend>> {
    ENTITY_MODEL.get().cloned()
}

/// ONNX model from `config.model_dir`, or the regex backend if it can't load
pub fn load_backend(config: &NerConfig) -> Arc<dyn NerBackend> {
    let start = Instant::now();
    let backend: Arc<dyn NerBackend> = match OnnxNerBackend::load(config) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            debug_warn!("NER model unavailable ({}), using pattern recognizer", e);
            Arc::new(PatternNerBackend::new(config.max_chunk_bytes))
        }
    };
    debug_log!("NER backend: {}", backend.backend_id());
    debug_timing!("ner model load", start);
    backend
}

/// Entities from the process-wide backend, initialising it with defaults
/// if nothing did so earlier.
pub fn extract_named_entities(text: &str) -> Result<EntityMap> {
    let model = entity_model().unwrap_or_else(|| init_entity_model(&NerConfig::default()));
    extract_named_entities_with(model.as_ref(), text)
}

pub fn extract_named_entities_with(backend: &dyn NerBackend, text: &str) -> Result<EntityMap> {
    let mut entities = EntityMap::new();
    for chunk in chunk_text(text, backend.max_chunk_bytes()) {
        for span in backend.recognize(chunk)? {
            let cleaned = span.text.trim();
            if !cleaned.is_empty() {
                entities.entry(span.label).or_default().insert(cleaned.to_string());
            }
        }
    }
    Ok(entities)
}

/// Split into slices of at most `max_bytes`, cutting after a newline when
/// the window contains one and on a char boundary otherwise.
pub fn chunk_text(text: &str, max_bytes: usize) -> Vec<&str> {
    let max_bytes = max_bytes.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= max_bytes {
            chunks.push(rest);
            break;
        }

        let mut cut = floor_char_boundary(rest, max_bytes);
        if let Some(newline) = rest[..cut].rfind('\n') {
            cut = newline + 1;
        }
        if cut == 0 {
            cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }

        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }

    chunks
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
