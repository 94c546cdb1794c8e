// Fixture builders shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::write::FileOptions;

use pleading_analyzer::text_extraction::OcrBackend;
use pleading_analyzer::types::{AnalyzerError, Result};

/// One PDF page per entry, one text line per element. An empty slice gives
/// a page with no text layer.
pub fn pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), (760 - 16 * i as i64).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Minimal WordprocessingML package, one paragraph per element
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", FileOptions::default()).unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file("word/document.xml", FileOptions::default()).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Answers every page with a fixed text and records what it was asked
pub struct ScriptedOcr {
    reply: Option<String>,
    pub calls: Mutex<Vec<u32>>,
    pub spooled: Mutex<Vec<PathBuf>>,
}

impl ScriptedOcr {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
            spooled: Mutex::new(Vec::new()),
        }
    }

    /// Every page fails recognition
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
            spooled: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrBackend for ScriptedOcr {
    fn backend_id(&self) -> &str {
        "scripted"
    }

    async fn recognize_page(&self, pdf_path: &Path, page_number: u32) -> Result<String> {
        assert!(pdf_path.exists(), "spooled PDF must exist during OCR");
        self.calls.lock().unwrap().push(page_number);
        self.spooled.lock().unwrap().push(pdf_path.to_path_buf());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(AnalyzerError::Ocr(format!("page {} unreadable", page_number))),
        }
    }
}
