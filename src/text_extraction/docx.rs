// DOCX paragraph text: word/document.xml out of the OOXML zip
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

use crate::types::{AnalyzerError, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Paragraphs joined with newlines. Tabs and breaks are kept, images and
/// every other part of the package are ignored. The document part may
/// inflate to at most `max_xml_bytes`.
pub fn extract_docx_text(bytes: &[u8], max_xml_bytes: u64) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AnalyzerError::Docx(format!("not a DOCX package: {}", e)))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| AnalyzerError::Docx(format!("{} missing: {}", DOCUMENT_PART, e)))?;
    let too_large = || {
        AnalyzerError::Docx(format!("{} inflates past {} bytes", DOCUMENT_PART, max_xml_bytes))
    };
    // Declared size can lie; the read below is capped regardless
    if part.size() > max_xml_bytes {
        return Err(too_large());
    }

    let mut raw = Vec::new();
    part.take(max_xml_bytes.saturating_add(1)).read_to_end(&mut raw)?;
    if raw.len() as u64 > max_xml_bytes {
        return Err(too_large());
    }
    let xml = String::from_utf8(raw)
        .map_err(|e| AnalyzerError::Docx(format!("{} is not UTF-8: {}", DOCUMENT_PART, e)))?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_text_run = true;
                }
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| AnalyzerError::Docx(format!("bad text run: {}", e)))?;
                text.push_str(&unescaped);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AnalyzerError::Docx(format!(
                    "malformed XML at {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(text)
}
