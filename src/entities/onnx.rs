// Token-classification NER on ONNX Runtime (BERT-style BIO tagging)
use ndarray::ArrayView2;
use ort::{
    init,
    inputs,
    session::builder::GraphOptimizationLevel,
    session::Session,
    value::Value,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::sync::Mutex;
use tokenizers::Tokenizer;

use super::{EntitySpan, NerBackend};
use crate::config::NerConfig;
use crate::types::{AnalyzerError, Result};
use crate::debug_log;

fn model_err(e: impl Display) -> AnalyzerError {
    AnalyzerError::Model(e.to_string())
}

/// The `id2label` table from a HuggingFace model `config.json`
#[derive(Debug, Deserialize)]
struct ModelLabels {
    id2label: HashMap<String, String>,
}

fn parse_labels(raw: &str) -> Result<Vec<String>> {
    let parsed: ModelLabels = serde_json::from_str(raw)?;
    let mut labels = vec![String::from("O"); parsed.id2label.len()];
    for (id, label) in parsed.id2label {
        let index: usize = id
            .parse()
            .map_err(|_| model_err(format!("non-numeric label id {:?}", id)))?;
        let slot = labels
            .get_mut(index)
            .ok_or_else(|| model_err(format!("label id {} out of range", index)))?;
        *slot = label;
    }
    Ok(labels)
}

pub struct OnnxNerBackend {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    cls_id: i64,
    sep_id: i64,
    max_tokens: usize,
    max_chunk_bytes: usize,
    needs_token_type_ids: bool,
}

impl OnnxNerBackend {
    pub fn load(config: &NerConfig) -> Result<Self> {
        let model_path = config.model_path();
        if !model_path.exists() {
            return Err(model_err(format!("{} not found", model_path.display())));
        }

        let labels = parse_labels(&fs::read_to_string(config.labels_path())?)?;

        let mut tokenizer = Tokenizer::from_file(config.tokenizer_path()).map_err(model_err)?;
        // Windowing is done here, not by the tokenizer
        tokenizer.with_truncation(None).map_err(model_err)?;
        tokenizer.with_padding(None);

        let special = |names: [&str; 2]| {
            names
                .iter()
                .find_map(|name| tokenizer.token_to_id(name))
                .map(i64::from)
                .ok_or_else(|| model_err(format!("tokenizer has none of {:?}", names)))
        };
        let cls_id = special(["[CLS]", "<s>"])?;
        let sep_id = special(["[SEP]", "</s>"])?;

        let _ = init();
        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(config.intra_threads)
            .map_err(model_err)?
            .commit_from_file(&model_path)
            .map_err(model_err)?;

        let needs_token_type_ids =
            session.inputs.iter().any(|input| input.name == "token_type_ids");
        debug_log!(
            "NER model loaded: {} labels, {} inputs",
            labels.len(),
            session.inputs.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            cls_id,
            sep_id,
            max_tokens: config.max_tokens,
            max_chunk_bytes: config.max_chunk_bytes,
            needs_token_type_ids,
        })
    }

    /// Label per token of `window` (CLS/SEP are added and stripped here)
    fn classify_window(&self, session: &mut Session, window: &[u32]) -> Result<Vec<String>> {
        let ids: Vec<i64> = std::iter::once(self.cls_id)
            .chain(window.iter().map(|&id| i64::from(id)))
            .chain(std::iter::once(self.sep_id))
            .collect();
        let len = ids.len();

        let tensor = |data: Vec<i64>| {
            Value::from_array(([1_usize, len], data.into_boxed_slice())).map_err(model_err)
        };
        let input_ids = tensor(ids)?;
        let attention_mask = tensor(vec![1; len])?;

        let outputs = if self.needs_token_type_ids {
            let token_type_ids = tensor(vec![0; len])?;
            session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            session.run(inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        }
        .map_err(model_err)?;

        let (shape, logits) = outputs[0].try_extract_tensor::<f32>().map_err(model_err)?;
        if shape.len() != 3 || shape[1] as usize != len {
            return Err(model_err(format!("unexpected logits shape {:?}", shape)));
        }
        let view = ArrayView2::from_shape((len, shape[2] as usize), logits).map_err(model_err)?;

        Ok(view
            .rows()
            .into_iter()
            .skip(1)
            .take(window.len())
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f32::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc })
                    .0;
                self.labels.get(best).cloned().unwrap_or_else(|| "O".to_string())
            })
            .collect())
    }
}

impl NerBackend for OnnxNerBackend {
    fn backend_id(&self) -> &str {
        "onnx"
    }

    fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_bytes
    }

    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let encoding = self.tokenizer.encode(text, false).map_err(model_err)?;
        let ids = encoding.get_ids();
        let window = self.max_tokens.saturating_sub(2).max(1);

        let mut session = self
            .session
            .lock()
            .map_err(|_| model_err("NER session lock poisoned"))?;

        let mut token_labels = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(window) {
            token_labels.extend(self.classify_window(&mut session, chunk)?);
        }

        Ok(decode_bio(text, encoding.get_offsets(), &token_labels))
    }
}

fn split_label(label: &str) -> Option<(char, &str)> {
    if label == "O" || label.is_empty() {
        return None;
    }
    match label.split_once('-') {
        Some(("B", kind)) => Some(('B', kind)),
        Some(("I", kind)) => Some(('I', kind)),
        _ => Some(('I', label)),
    }
}

/// Merge BIO-tagged tokens into spans. A `B-` token that starts exactly
/// where the previous token ended is a word piece and extends the span.
pub(crate) fn decode_bio(
    text: &str,
    offsets: &[(usize, usize)],
    labels: &[String],
) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut current: Option<(String, usize, usize)> = None;

    let flush = |current: &mut Option<(String, usize, usize)>, spans: &mut Vec<EntitySpan>| {
        if let Some((label, start, end)) = current.take() {
            if let Some(slice) = text.get(start..end) {
                let trimmed = slice.trim();
                if !trimmed.is_empty() {
                    spans.push(EntitySpan {
                        label,
                        text: trimmed.to_string(),
                        start,
                        end,
                    });
                }
            }
        }
    };

    for (&(start, end), label) in offsets.iter().zip(labels) {
        if start == end {
            continue;
        }
        match split_label(label) {
            None => flush(&mut current, &mut spans),
            Some((prefix, kind)) => {
                let continues = match &current {
                    Some((open, _, prev_end)) => {
                        open == kind && (prefix == 'I' || start == *prev_end)
                    }
                    None => false,
                };
                if continues {
                    if let Some(open) = current.as_mut() {
                        open.2 = end;
                    }
                } else {
                    flush(&mut current, &mut spans);
                    current = Some((kind.to_string(), start, end));
                }
            }
        }
    }
    flush(&mut current, &mut spans);

    spans
}
