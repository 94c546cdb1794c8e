// CSV / JSON export of the merged field + entity mapping
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::debug_warn;
use crate::entities::EntityMap;
use crate::fields::FieldSet;
use crate::types::Result;

/// Fields first in rule order, then entity labels. A label equal to a field
/// name replaces that field's value in place.
pub fn merge(fields: &FieldSet, entities: &EntityMap) -> Map<String, Value> {
    let mut merged = Map::new();
    for (name, value) in fields.iter() {
        merged.insert(name.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
    }
    for (label, texts) in entities {
        let list = Value::Array(texts.iter().cloned().map(Value::String).collect());
        if merged.insert(label.clone(), list).is_some() {
            debug_warn!("entity label {:?} overwrote the field of the same name", label);
        }
    }
    merged
}

/// Header-less `key,value` rows. Lists are JSON-encoded into the cell and
/// null becomes an empty cell.
pub fn to_csv(data: &Map<String, Value>) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    for (key, value) in data {
        let cell = match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other)?,
        };
        writer.write_record([key.as_str(), cell.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Two-space indented JSON object
pub fn to_json(data: &Map<String, Value>) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[derive(Debug, Clone)]
pub struct Artifacts {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

pub fn write_artifacts(
    dir: &Path,
    output: &OutputConfig,
    data: &Map<String, Value>,
) -> Result<Artifacts> {
    fs::create_dir_all(dir)?;
    let csv_path = dir.join(&output.csv_name);
    let json_path = dir.join(&output.json_name);
    fs::write(&csv_path, to_csv(data)?)?;
    fs::write(&json_path, to_json(data)?)?;
    Ok(Artifacts { csv_path, json_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::extract_info;
    use std::collections::BTreeSet;

    fn entities(pairs: &[(&str, &[&str])]) -> EntityMap {
        pairs
            .iter()
            .map(|(label, texts)| {
                (label.to_string(), texts.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>())
            })
            .collect()
    }

    #[test]
    fn test_merge_orders_fields_then_labels() {
        let fields = extract_info("Case No: 7\n");
        let labels = entities(&[("PERSON", &["Jane Doe"]), ("DATE", &["May 1, 2020"])]);
        let merged = merge(&fields, &labels);

        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], "case_number");
        assert_eq!(&keys[10..], ["DATE", "PERSON"]);
    }

    #[test]
    fn test_entity_label_overwrites_field() {
        let fields = extract_info("Plaintiff: Jane Doe\n");
        let merged = merge(&fields, &entities(&[("plaintiff", &["Someone Else"])]));

        assert_eq!(merged.len(), 10);
        assert_eq!(merged["plaintiff"], serde_json::json!(["Someone Else"]));
        // position is kept
        assert_eq!(merged.keys().nth(6).map(String::as_str), Some("plaintiff"));
    }

    #[test]
    fn test_csv_rows() {
        let mut data = Map::new();
        data.insert("case_number".into(), Value::String("Case No: 7".into()));
        data.insert("court_name".into(), Value::Null);
        data.insert("plaintiff".into(), serde_json::json!(["Jane Doe", "John Roe"]));
        data.insert("defendant".into(), serde_json::json!([]));

        let csv = to_csv(&data).unwrap();
        assert_eq!(
            csv,
            "case_number,Case No: 7\r\n\
             court_name,\r\n\
             plaintiff,\"[\"\"Jane Doe\"\",\"\"John Roe\"\"]\"\r\n\
             defendant,[]\r\n"
        );
    }

    #[test]
    fn test_csv_quotes_multiline_values() {
        let mut data = Map::new();
        data.insert(
            "attorney_info".into(),
            Value::String("Attorney for Plaintiff\nMary Major".into()),
        );
        let csv = to_csv(&data).unwrap();
        assert_eq!(csv, "attorney_info,\"Attorney for Plaintiff\nMary Major\"\r\n");
    }

    #[test]
    fn test_json_two_space_indent() {
        let mut data = Map::new();
        data.insert("case_number".into(), Value::Null);
        data.insert("plaintiff".into(), serde_json::json!(["Jane Doe"]));

        let json = to_json(&data).unwrap();
        assert_eq!(
            json,
            "{\n  \"case_number\": null,\n  \"plaintiff\": [\n    \"Jane Doe\"\n  ]\n}"
        );
    }

    #[test]
    fn test_write_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let merged = merge(&extract_info("Case No: 7\n"), &EntityMap::new());
        let artifacts = write_artifacts(dir.path(), &OutputConfig::default(), &merged).unwrap();

        assert!(artifacts.csv_path.ends_with("extracted_info.csv"));
        let json: Map<String, Value> =
            serde_json::from_str(&fs::read_to_string(&artifacts.json_path).unwrap()).unwrap();
        assert_eq!(json, merged);
    }
}
