pub mod json_model;
pub mod pdftotext;
pub mod plain_text;

use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::model::{Alignment, BBox};
use crate::session::{DocumentFormat, Session};

/// One paragraph of a word-processing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(default)]
    pub alignment: Alignment,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, alignment: Alignment) -> Self {
        Paragraph {
            text: text.into(),
            alignment,
        }
    }
}

/// A single character with its box on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    #[serde(rename = "char")]
    pub ch: char,
    pub bbox: BBox,
}

/// One visual line of glyphs in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub glyphs: Vec<Glyph>,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }
}

/// Glyph content of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGlyphs {
    pub lines: Vec<TextLine>,
}

/// Paragraph-level document model (word-processing mode).
pub trait DocumentSource: Send + Sync {
    fn paragraphs(&self) -> Result<Vec<Paragraph>, FormError>;
}

/// Glyph-level document model (PDF mode). Pages are fetched one at a time so
/// each can be decoded inside its own worker.
pub trait LayoutSource: Send + Sync {
    fn page_count(&self) -> Result<usize, FormError>;

    fn page(&self, index: usize) -> Result<PageGlyphs, FormError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Persists reconciled paragraph text, one string per paragraph.
pub trait DocumentSink {
    fn save(&self, paragraphs: &[String]) -> Result<(), FormError>;
}

/// A document opened for the paragraph workflow: readable and writable.
pub trait EditableDocument: DocumentSource + DocumentSink {}

impl<T: DocumentSource + DocumentSink> EditableDocument for T {}

/// Open the session's source for paragraph extraction, saving to the session's
/// output path.
pub fn open_editable(session: &Session) -> Result<Box<dyn EditableDocument>, FormError> {
    let output = session.output_path()?;
    match session.format() {
        DocumentFormat::Json => Ok(Box::new(
            json_model::JsonDocument::open(session.source())?.with_output(output),
        )),
        DocumentFormat::Text => Ok(Box::new(
            plain_text::TextDocument::open(session.source())?.with_output(output),
        )),
        DocumentFormat::Pdf => Err(FormError::UnsupportedFormat(
            "PDF files have no paragraph model; use the layout workflow".into(),
        )),
    }
}

/// Open the session's source for layout extraction.
pub fn open_layout(session: &Session) -> Result<Box<dyn LayoutSource>, FormError> {
    match session.format() {
        DocumentFormat::Pdf => {
            let bytes = std::fs::read(session.source())?;
            Ok(Box::new(pdftotext::PdftotextLayout::open(&bytes)?))
        }
        DocumentFormat::Json => Ok(Box::new(json_model::JsonDocument::open(
            session.source(),
        )?)),
        DocumentFormat::Text => Err(FormError::UnsupportedFormat(
            "plain text carries no glyph geometry".into(),
        )),
    }
}
