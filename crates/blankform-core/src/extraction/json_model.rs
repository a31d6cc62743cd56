use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::extraction::{DocumentSink, DocumentSource, LayoutSource, PageGlyphs, Paragraph};

/// Serialized document model: paragraphs for the text workflow and, when a
/// converter produced them, glyph pages for the layout workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentModel {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<PageGlyphs>,
}

/// A [`DocumentModel`] stored as JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    model: DocumentModel,
    output: PathBuf,
}

impl JsonDocument {
    /// Load a model. Saving writes back to the same path unless
    /// [`with_output`](Self::with_output) redirects it.
    pub fn open(path: &Path) -> Result<Self, FormError> {
        let bytes = std::fs::read(path)
            .map_err(|e| FormError::UnreadableDocument(format!("{}: {e}", path.display())))?;
        let model: DocumentModel = serde_json::from_slice(&bytes)
            .map_err(|e| FormError::UnreadableDocument(format!("{}: {e}", path.display())))?;
        Ok(Self::from_model(model, path.to_path_buf()))
    }

    pub fn from_model(model: DocumentModel, output: PathBuf) -> Self {
        JsonDocument { model, output }
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }
}

impl DocumentSource for JsonDocument {
    fn paragraphs(&self) -> Result<Vec<Paragraph>, FormError> {
        Ok(self.model.paragraphs.clone())
    }
}

impl LayoutSource for JsonDocument {
    fn page_count(&self) -> Result<usize, FormError> {
        Ok(self.model.pages.len())
    }

    fn page(&self, index: usize) -> Result<PageGlyphs, FormError> {
        self.model
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| FormError::PageUnreadable {
                page: index,
                reason: "page index out of range".into(),
            })
    }

    fn backend_name(&self) -> &str {
        "json-model"
    }
}

impl DocumentSink for JsonDocument {
    /// Rewrites paragraph text in place; alignment, order and pages are kept.
    fn save(&self, paragraphs: &[String]) -> Result<(), FormError> {
        if paragraphs.len() != self.model.paragraphs.len() {
            return Err(FormError::LineCountMismatch {
                expected: self.model.paragraphs.len(),
                found: paragraphs.len(),
            });
        }

        let mut model = self.model.clone();
        for (paragraph, text) in model.paragraphs.iter_mut().zip(paragraphs) {
            paragraph.text.clone_from(text);
        }

        let json = serde_json::to_string_pretty(&model)?;
        std::fs::write(&self.output, json)?;
        tracing::debug!(path = %self.output.display(), "saved document model");
        Ok(())
    }
}
