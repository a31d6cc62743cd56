use std::path::{Path, PathBuf};

use crate::error::FormError;
use crate::extraction::{DocumentSink, DocumentSource, Paragraph};
use crate::model::Alignment;

/// Plain text document: one paragraph per line, all left aligned.
#[derive(Debug, Clone)]
pub struct TextDocument {
    paragraphs: Vec<String>,
    output: PathBuf,
}

impl TextDocument {
    pub fn open(path: &Path) -> Result<Self, FormError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FormError::UnreadableDocument(format!("{}: {e}", path.display())))?;
        Ok(Self::from_text(&content, path.to_path_buf()))
    }

    pub fn from_text(content: &str, output: PathBuf) -> Self {
        TextDocument {
            paragraphs: content.lines().map(str::to_string).collect(),
            output,
        }
    }

    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }
}

impl DocumentSource for TextDocument {
    fn paragraphs(&self) -> Result<Vec<Paragraph>, FormError> {
        Ok(self
            .paragraphs
            .iter()
            .map(|text| Paragraph::new(text.as_str(), Alignment::Left))
            .collect())
    }
}

impl DocumentSink for TextDocument {
    fn save(&self, paragraphs: &[String]) -> Result<(), FormError> {
        if paragraphs.len() != self.paragraphs.len() {
            return Err(FormError::LineCountMismatch {
                expected: self.paragraphs.len(),
                found: paragraphs.len(),
            });
        }
        let mut out = String::new();
        for paragraph in paragraphs {
            out.push_str(paragraph);
            out.push('\n');
        }
        std::fs::write(&self.output, out)?;
        tracing::debug!(path = %self.output.display(), "saved text document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_become_paragraphs() {
        let doc = TextDocument::from_text("a: ___\n\nb (x)\n", PathBuf::from("x.txt"));
        let paragraphs = doc.paragraphs().unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[1].text, "");
        assert!(paragraphs.iter().all(|p| p.alignment == Alignment::Left));
    }

    #[test]
    fn test_save_writes_one_line_per_paragraph() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("filled.txt");
        let doc = TextDocument::from_text("a\nb", out.clone());
        doc.save(&["x".into(), "y".into()]).unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "x\ny\n");
    }
}
