// Pleading analyzer: court-pleading text, legal fields and named entities
pub mod debug_capture;

pub mod config;
pub mod document;
pub mod entities;
pub mod export;
pub mod fields;
pub mod pipeline;
pub mod text_extraction;
pub mod types;

pub use config::AnalyzerConfig;
pub use document::{Document, DocumentFormat};
pub use entities::{extract_named_entities, EntityMap, NerBackend};
pub use export::{to_csv, to_json};
pub use fields::{extract_info, FieldSet, FieldValue};
pub use pipeline::{Analysis, Analyzer};
pub use types::{AnalyzerError, Result};
