// Regex entity recognizer used when no NER model is installed
use once_cell::sync::Lazy;
use regex::Regex;

use super::{EntitySpan, NerBackend};
use crate::types::Result;

static PERSON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:(?:Mr|Mrs|Ms|Dr|Hon|Judge)\.?[ \t]+)?",
        r"([A-Z][a-z]+(?:[ \t]+[A-Z]\.)?[ \t]+[A-Z][a-z]+)\b",
    ))
    .unwrap()
});

static ORGANIZATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b([A-Z][A-Za-z&]*(?:[ \t]+[A-Z][A-Za-z&]*)*,?[ \t]+",
        r"(?:Inc|LLC|LLP|Corp|Corporation|Company|Co|Ltd)\b\.?)",
    ))
    .unwrap()
});

static COURT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b((?:United States|Superior|District|Circuit|Supreme|Bankruptcy|Municipal|Family",
        r"|Probate)[ \t]+Court(?:[ \t]+(?:of|for)(?:[ \t]+the)?(?:[ \t]+[A-Z][a-z]+)+)?)",
    ))
    .unwrap()
});

static LOCATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:County|City|Commonwealth|State) of ([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)",
        r"|\b(Alabama|Alaska|Arizona|Arkansas|California|Colorado|Connecticut|Delaware",
        r"|Florida|Georgia|Hawaii|Idaho|Illinois|Indiana|Iowa|Kansas|Kentucky|Louisiana",
        r"|Maine|Maryland|Massachusetts|Michigan|Minnesota|Mississippi|Missouri|Montana",
        r"|Nebraska|Nevada|New Hampshire|New Jersey|New Mexico|New York|North Carolina",
        r"|North Dakota|Ohio|Oklahoma|Oregon|Pennsylvania|Rhode Island|South Carolina",
        r"|South Dakota|Tennessee|Texas|Utah|Vermont|Virginia|Washington|West Virginia",
        r"|Wisconsin|Wyoming)\b",
    ))
    .unwrap()
});

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b((?:January|February|March|April|May|June|July|August|September|October",
        r"|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)",
        r"\.?[ \t]+\d{1,2},?[ \t]+\d{4}",
        r"|\d{1,2}/\d{1,2}/\d{2,4})\b",
    ))
    .unwrap()
});

static MONEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$[ \t]?\d[\d,]*(?:\.\d{2})?)").unwrap()
});

/// Capitalised words that make a two-word match something other than a name
const NON_PERSON_WORDS: &[&str] = &[
    "Action", "Answer", "Attorney", "Avenue", "Case", "Cause", "Circuit", "City", "Co", "Company",
    "Complaint", "Corp", "County", "Court", "Defendant", "Defendants", "District", "Esq", "Filed",
    "First", "Honorable", "Inc", "Judge", "Jurisdiction", "Motion", "Notice", "Petition",
    "Plaintiff", "Plaintiffs", "Prayer", "Reply", "Road", "Second", "State", "States", "Street",
    "Superior", "Supreme", "The", "Third", "United", "January", "February", "March", "April",
    "May", "June", "July", "August", "September", "October", "November", "December",
];

pub struct PatternNerBackend {
    max_chunk_bytes: usize,
}

impl PatternNerBackend {
    pub fn new(max_chunk_bytes: usize) -> Self {
        Self { max_chunk_bytes }
    }
}

impl Default for PatternNerBackend {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl NerBackend for PatternNerBackend {
    fn backend_id(&self) -> &str {
        "pattern"
    }

    fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_bytes
    }

    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut spans = Vec::new();

        collect(&PERSON_PATTERN, "PERSON", text, &mut spans, |name| {
            !name.split_whitespace().any(|w| NON_PERSON_WORDS.contains(&w.trim_end_matches('.')))
        });
        collect(&ORGANIZATION_PATTERN, "ORG", text, &mut spans, |_| true);
        collect(&COURT_PATTERN, "ORG", text, &mut spans, |_| true);
        collect(&LOCATION_PATTERN, "GPE", text, &mut spans, |_| true);
        collect(&DATE_PATTERN, "DATE", text, &mut spans, |_| true);
        collect(&MONEY_PATTERN, "MONEY", text, &mut spans, |_| true);

        Ok(spans)
    }
}

/// First participating capture group of every match becomes a span
fn collect(
    regex: &Regex,
    label: &str,
    text: &str,
    spans: &mut Vec<EntitySpan>,
    keep: impl Fn(&str) -> bool,
) {
    for caps in regex.captures_iter(text) {
        let Some(m) = caps.iter().skip(1).flatten().next() else {
            continue;
        };
        let value = m.as_str().trim_end_matches(',');
        if keep(value) {
            spans.push(EntitySpan {
                label: label.to_string(),
                text: value.to_string(),
                start: m.start(),
                end: m.start() + value.len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[EntitySpan], label: &str) -> Vec<String> {
        spans
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.text.clone())
            .collect()
    }

    const PLEADING: &str = "In the Superior Court of California\n\
                            Plaintiff: Jane Doe\n\
                            Defendant: ACME Corp.\n\
                            Filed: January 5, 2023\n\
                            Damages of $50,000.00 are sought.\n";

    #[test]
    fn test_recognizes_pleading_entities() {
        let spans = PatternNerBackend::default().recognize(PLEADING).unwrap();

        assert_eq!(texts(&spans, "PERSON"), ["Jane Doe"]);
        let orgs = texts(&spans, "ORG");
        assert!(orgs.contains(&"ACME Corp.".to_string()));
        assert!(orgs.contains(&"Superior Court of California".to_string()));
        assert_eq!(texts(&spans, "GPE"), ["California"]);
        assert_eq!(texts(&spans, "DATE"), ["January 5, 2023"]);
        assert_eq!(texts(&spans, "MONEY"), ["$50,000.00"]);
    }

    #[test]
    fn test_offsets_point_into_text() {
        let spans = PatternNerBackend::default().recognize(PLEADING).unwrap();
        for span in spans {
            assert_eq!(&PLEADING[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_honorific_is_not_part_of_name() {
        let spans = PatternNerBackend::default()
            .recognize("Before Judge Mary Smith today")
            .unwrap();
        assert_eq!(texts(&spans, "PERSON"), ["Mary Smith"]);
    }

    #[test]
    fn test_plain_lowercase_text_has_no_entities() {
        assert!(PatternNerBackend::default().recognize("nothing to see here").unwrap().is_empty());
    }
}
