// Configuration for the pleading analyzer
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{AnalyzerError, Result};

// Diagnostics settings
pub const MAX_DEBUG_LOGS: usize = 1000;

// Shown whenever no text could be recovered from an upload
pub const USER_ERROR_MESSAGE: &str =
    "Could not extract text from file. Ensure it is not a scanned image.";

pub const CONFIG_PATH_ENV: &str = "PLEADING_ANALYZER_CONFIG";
pub const MODEL_DIR_ENV: &str = "PLEADING_NER_MODEL_DIR";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub ner: NerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OcrConfig {
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub grayscale: bool,
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm_bin: String,
    #[serde(default = "default_tesseract")]
    pub tesseract_bin: String,
    /// Parent of the per-page scratch dirs; system temp dir when unset
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Ceiling on the decompressed `word/document.xml` of a DOCX
    #[serde(default = "default_max_docx_xml_bytes")]
    pub max_docx_xml_bytes: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NerConfig {
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_csv_name")]
    pub csv_name: String,
    #[serde(default = "default_json_name")]
    pub json_name: String,
}

fn default_true() -> bool {
    true
}

fn default_dpi() -> u32 {
    300
}

fn default_ocr_timeout() -> u64 {
    60
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_pdftoppm() -> String {
    "pdftoppm".to_string()
}

fn default_tesseract() -> String {
    "tesseract".to_string()
}

fn default_max_pages() -> usize {
    500
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_max_docx_xml_bytes() -> u64 {
    256 * 1024 * 1024
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models/ner")
}

fn default_max_tokens() -> usize {
    512
}

fn default_intra_threads() -> usize {
    4
}

fn default_max_chunk_bytes() -> usize {
    100_000
}

fn default_csv_name() -> String {
    "extracted_info.csv".to_string()
}

fn default_json_name() -> String {
    "extracted_info.json".to_string()
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            timeout_secs: default_ocr_timeout(),
            language: default_language(),
            grayscale: true,
            pdftoppm_bin: default_pdftoppm(),
            tesseract_bin: default_tesseract(),
            scratch_dir: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_upload_bytes: default_max_upload_bytes(),
            max_docx_xml_bytes: default_max_docx_xml_bytes(),
        }
    }
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            max_tokens: default_max_tokens(),
            intra_threads: default_intra_threads(),
            max_chunk_bytes: default_max_chunk_bytes(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_name: default_csv_name(),
            json_name: default_json_name(),
        }
    }
}

impl NerConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join("model.onnx")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }
}

impl AnalyzerConfig {
    /// Load configuration from an explicit path, the `PLEADING_ANALYZER_CONFIG`
    /// file, or built-in defaults, in that order. `PLEADING_NER_MODEL_DIR`
    /// overrides the model directory last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match env::var(CONFIG_PATH_ENV) {
                Ok(p) if !p.trim().is_empty() => Self::from_file(Path::new(&p))?,
                _ => Self::default(),
            },
        };

        if let Ok(dir) = env::var(MODEL_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.ner.model_dir = PathBuf::from(dir);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| AnalyzerError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.ocr.dpi == 0 {
            return Err(AnalyzerError::Config("ocr.dpi must be positive".into()));
        }
        if self.ocr.timeout_secs == 0 {
            return Err(AnalyzerError::Config("ocr.timeout_secs must be positive".into()));
        }
        if self.limits.max_upload_bytes == 0 || self.limits.max_docx_xml_bytes == 0 {
            return Err(AnalyzerError::Config("limits byte ceilings must be positive".into()));
        }
        if self.limits.max_pages == 0 {
            return Err(AnalyzerError::Config("limits.max_pages must be positive".into()));
        }
        // CLS + SEP leave no room below this
        if self.ner.max_tokens < 8 {
            return Err(AnalyzerError::Config("ner.max_tokens must be at least 8".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.output.csv_name, "extracted_info.csv");
        assert_eq!(config.output.json_name, "extracted_info.json");
        assert_eq!(config.ner.model_path(), PathBuf::from("models/ner/model.onnx"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalyzerConfig::from_toml_str(
            "[ocr]\ndpi = 150\n\n[limits]\nmax_pages = 3\n",
        )
        .unwrap();
        assert_eq!(config.ocr.dpi, 150);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.limits.max_pages, 3);
        assert_eq!(config.ner.max_tokens, 512);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = AnalyzerConfig::from_toml_str("[limits]\nmax_pages = 0\n").unwrap();
        assert!(config.validate().is_err());
        assert!(AnalyzerConfig::from_toml_str("[ocr]\ndpi = \"high\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AnalyzerConfig::load(Some(Path::new("/nonexistent/analyzer.toml"))).unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }
}
