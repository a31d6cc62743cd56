use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("catalog rules '{first}' and '{second}' claimed overlapping spans {first_range:?} and {second_range:?}")]
    PatternAmbiguity {
        first: &'static str,
        first_range: Range<usize>,
        second: &'static str,
        second_range: Range<usize>,
    },

    #[error("document could not be read: {0}")]
    UnreadableDocument(String),

    #[error("page {page} could not be read: {reason}")]
    PageUnreadable { page: usize, reason: String },

    #[error("line {line} has {expected} field(s) but {found} value(s) were submitted")]
    ValueCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("document has {expected} line(s) but values were submitted for {found}")]
    LineCountMismatch { expected: usize, found: usize },

    #[error("value for {field} does not match the field kind")]
    ValueKindMismatch { field: String },

    #[error("{} marker(s) could not be resolved: {}", .0.len(), UnresolvedList(.0))]
    UnresolvedMarkers(Vec<UnresolvedMarker>),

    #[error("malformed marker annotation: {0}")]
    MalformedAnnotation(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("refusing to overwrite the source document {}", .0.display())]
    OutputCollision(PathBuf),

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One `(value, marker)` pair the marker-token strategy could not place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedMarker {
    /// Position of the pair in the submitted sequence.
    pub index: usize,
    pub template: String,
}

struct UnresolvedList<'a>(&'a [UnresolvedMarker]);

impl fmt::Display for UnresolvedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, marker) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "#{} '{}'", marker.index, marker.template)?;
        }
        Ok(())
    }
}
