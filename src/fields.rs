// Legal field extraction from plain pleading text
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Scalar fields keep the first match, list fields keep every match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    First,
    All,
}

pub struct FieldRule {
    pub name: &'static str,
    pub mode: ExtractionMode,
    pattern: &'static str,
}

impl FieldRule {
    const fn new(name: &'static str, mode: ExtractionMode, pattern: &'static str) -> Self {
        Self { name, mode, pattern }
    }
}

macro_rules! months {
    () => {
        "January|February|March|April|May|June|July|August|September|October|November|December"
    };
}

/// Evaluated in this order; it is also the key order of every `FieldSet`.
pub static FIELD_RULES: &[FieldRule] = &[
    FieldRule::new("case_number", ExtractionMode::First, r"(?is)(Case\s*No\.?\s*[:\s]*[\w\-/]+)"),
    FieldRule::new(
        "court_name",
        ExtractionMode::First,
        r"(?is)(In\s+the\s+\w+(?:\s+\w+)*\s+Court.*?)\n",
    ),
    FieldRule::new(
        "filing_date",
        ExtractionMode::First,
        r"(?is)(Filed\s*[:\s]*\w+\s+\d{1,2},\s+\d{4})",
    ),
    FieldRule::new(
        "pleading_type",
        ExtractionMode::First,
        r"(?is)(Complaint|Answer|Motion to Dismiss|Reply|Petition|Notice.*?)\n",
    ),
    FieldRule::new("jurisdiction", ExtractionMode::First, r"(?is)(Jurisdiction.*?)\n"),
    FieldRule::new(
        "attorney_info",
        ExtractionMode::First,
        r"(?is)(Attorney\s+for\s+.*?\n.*?\n.*?)\n",
    ),
    FieldRule::new("plaintiff", ExtractionMode::All, r"(?im)^[ \t]*Plaintiffs?:?[ \t]*(.*?)\r?\n"),
    FieldRule::new("defendant", ExtractionMode::All, r"(?im)^[ \t]*Defendants?:?[ \t]*(.*?)\r?\n"),
    FieldRule::new("causes_of_action", ExtractionMode::All, r"(?is)(CAUSE OF ACTION.*?)\n\n"),
    // month names stay case-sensitive
    FieldRule::new(
        "incident_dates",
        ExtractionMode::All,
        concat!(r"\b((?:", months!(), r")\s+\d{1,2},\s+\d{4})\b"),
    ),
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    FIELD_RULES
        .iter()
        .map(|rule| {
            Regex::new(rule.pattern)
                .unwrap_or_else(|e| panic!("bad pattern for {}: {}", rule.name, e))
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(Option<String>),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(v) => v.as_deref(),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> &[String] {
        match self {
            FieldValue::List(v) => v,
            FieldValue::Scalar(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Scalar(v) => v.is_none(),
            FieldValue::List(v) => v.is_empty(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Scalar(v) => v.serialize(serializer),
            FieldValue::List(v) => v.serialize(serializer),
        }
    }
}

/// Every rule name is present, in rule order, whether it matched or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_scalar)
    }

    pub fn list(&self, name: &str) -> &[String] {
        self.get(name).map(FieldValue::as_list).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Apply the rule table to `text`. Pure and total: a rule that finds
/// nothing produces `None` or an empty list.
pub fn extract_info(text: &str) -> FieldSet {
    let entries = FIELD_RULES
        .iter()
        .zip(COMPILED.iter())
        .map(|(rule, regex)| (rule.name, evaluate(rule.mode, regex, text)))
        .collect();
    FieldSet { entries }
}

fn evaluate(mode: ExtractionMode, regex: &Regex, text: &str) -> FieldValue {
    match mode {
        ExtractionMode::First => FieldValue::Scalar(
            regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty()),
        ),
        ExtractionMode::All => FieldValue::List(
            regex
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: [&str; 10] = [
        "case_number",
        "court_name",
        "filing_date",
        "pleading_type",
        "jurisdiction",
        "attorney_info",
        "plaintiff",
        "defendant",
        "causes_of_action",
        "incident_dates",
    ];

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(COMPILED.len(), FIELD_RULES.len());
    }

    #[test]
    fn test_case_number_and_filing_date() {
        let info = extract_info("Case No: 2023-CV-1045\nFiled: January 5, 2023\n");
        assert_eq!(info.scalar("case_number"), Some("Case No: 2023-CV-1045"));
        assert_eq!(info.scalar("filing_date"), Some("Filed: January 5, 2023"));
        assert_eq!(info.list("incident_dates"), ["January 5, 2023"]);
    }

    #[test]
    fn test_plaintiff_lines_collected_in_order() {
        let info = extract_info("Plaintiff: Jane Doe\nPlaintiff: John Roe\n");
        assert_eq!(info.list("plaintiff"), ["Jane Doe", "John Roe"]);
        assert!(info.list("defendant").is_empty());
    }

    #[test]
    fn test_list_fields_keep_duplicates() {
        let text = "Defendant: ACME Corp.\n\
                    DEFENDANTS: ACME Corp.\n\
                    On March 3, 2021 and again March 3, 2021.\n";
        let info = extract_info(text);
        assert_eq!(info.list("defendant"), ["ACME Corp.", "ACME Corp."]);
        assert_eq!(info.list("incident_dates"), ["March 3, 2021", "March 3, 2021"]);
    }

    #[test]
    fn test_month_names_are_case_sensitive() {
        let info = extract_info("filed on january 5, 2023 and JANUARY 6, 2023\n");
        assert!(info.list("incident_dates").is_empty());
    }

    #[test]
    fn test_scalar_keeps_first_match_only() {
        let text = "Jurisdiction is proper under 28 U.S.C. 1331.\n\
                    Jurisdiction also lies in equity.\n";
        let info = extract_info(text);
        assert_eq!(
            info.scalar("jurisdiction"),
            Some("Jurisdiction is proper under 28 U.S.C. 1331.")
        );
    }

    #[test]
    fn test_court_pleading_type_and_attorney() {
        let text = "In the Superior Court of California\n\
                    COMPLAINT\n\
                    Attorney for Plaintiff\n\
                    Mary Major, Esq.\n\
                    100 Main Street\n\
                    Springfield\n";
        let info = extract_info(text);
        assert_eq!(info.scalar("court_name"), Some("In the Superior Court of California"));
        assert_eq!(info.scalar("pleading_type"), Some("COMPLAINT"));
        assert_eq!(
            info.scalar("attorney_info"),
            Some("Attorney for Plaintiff\nMary Major, Esq.\n100 Main Street")
        );
    }

    #[test]
    fn test_causes_of_action_blocks() {
        let text = "FIRST CAUSE OF ACTION\nNegligence\n\nSECOND CAUSE OF ACTION\nFraud\n\nPRAYER\n";
        let info = extract_info(text);
        assert_eq!(
            info.list("causes_of_action"),
            ["CAUSE OF ACTION\nNegligence", "CAUSE OF ACTION\nFraud"]
        );
    }

    #[test]
    fn test_empty_text_is_fully_keyed() {
        let info = extract_info("");
        assert_eq!(info.keys().collect::<Vec<_>>(), ALL_KEYS);
        for (name, value) in info.iter() {
            assert!(value.is_empty(), "{} should be empty", name);
        }
        assert!(matches!(info.get("case_number"), Some(FieldValue::Scalar(None))));
        assert!(matches!(info.get("plaintiff"), Some(FieldValue::List(v)) if v.is_empty()));
    }

    #[test]
    fn test_serializes_null_and_lists_in_order() {
        let info = extract_info("Plaintiff: Jane Doe\n");
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.starts_with(r#"{"case_number":null,"court_name":null"#));
        assert!(json.contains(r#""plaintiff":["Jane Doe"]"#));
        assert!(json.ends_with(r#""incident_dates":[]}"#));
    }
}
