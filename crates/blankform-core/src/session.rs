use std::path::{Path, PathBuf};

use crate::error::FormError;

/// Document formats the engine can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Serialized document model.
    Json,
    /// Plain text, one paragraph per line.
    Text,
    /// PDF, layout workflow only.
    Pdf,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, FormError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(DocumentFormat::Json),
            "txt" | "text" => Ok(DocumentFormat::Text),
            "pdf" => Ok(DocumentFormat::Pdf),
            "" => Err(FormError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(FormError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    /// Extension used for saved output. PDFs are saved as a document model.
    pub fn output_extension(self) -> &'static str {
        match self {
            DocumentFormat::Json | DocumentFormat::Pdf => "json",
            DocumentFormat::Text => "txt",
        }
    }
}

/// The document being worked on and where its filled copy goes.
#[derive(Debug, Clone)]
pub struct Session {
    source: PathBuf,
    format: DocumentFormat,
    output_dir: PathBuf,
}

impl Session {
    /// `output_dir` defaults to a `filled` folder beside the source.
    pub fn open(source: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Result<Self, FormError> {
        let source = source.into();
        let format = DocumentFormat::from_path(&source)?;
        let output_dir = output_dir.unwrap_or_else(|| {
            source
                .parent()
                .map(|p| p.join("filled"))
                .unwrap_or_else(|| PathBuf::from("filled"))
        });
        Ok(Session {
            source,
            format,
            output_dir,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<output_dir>/<stem>.<ext>`; never the source file itself.
    pub fn output_path(&self) -> Result<PathBuf, FormError> {
        let stem = self.source.file_stem().ok_or_else(|| {
            FormError::UnsupportedFormat(format!("{} has no file name", self.source.display()))
        })?;
        let mut path = self.output_dir.join(stem);
        path.set_extension(self.format.output_extension());

        if same_file(&path, &self.source) {
            return Err(FormError::OutputCollision(self.source.clone()));
        }
        Ok(path)
    }

    /// Create the output folder if it does not exist yet.
    pub fn prepare_output(&self) -> Result<PathBuf, FormError> {
        let path = self.output_path()?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(path)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/form.JSON")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("form.txt")).unwrap(),
            DocumentFormat::Text
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("scan.pdf")).unwrap(),
            DocumentFormat::Pdf
        );
        assert!(matches!(
            DocumentFormat::from_path(Path::new("form.docx")),
            Err(FormError::UnsupportedFormat(_))
        ));
        assert!(DocumentFormat::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_default_output_folder() {
        let session = Session::open("docs/contrato.txt", None).unwrap();
        assert_eq!(session.output_dir(), Path::new("docs/filled"));
        assert_eq!(
            session.output_path().unwrap(),
            PathBuf::from("docs/filled/contrato.txt")
        );
    }

    #[test]
    fn test_pdf_output_is_json() {
        let session = Session::open("scan.pdf", Some(PathBuf::from("out"))).unwrap();
        assert_eq!(session.output_path().unwrap(), PathBuf::from("out/scan.json"));
    }

    #[test]
    fn test_refuses_to_overwrite_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("form.json");
        std::fs::write(&source, "{}").unwrap();
        let session = Session::open(&source, Some(dir.path().to_path_buf())).unwrap();
        assert!(matches!(
            session.output_path(),
            Err(FormError::OutputCollision(_))
        ));
    }

    #[test]
    fn test_prepare_output_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path().join("form.txt"), None).unwrap();
        let path = session.prepare_output().unwrap();
        assert!(dir.path().join("filled").is_dir());
        assert_eq!(path, dir.path().join("filled").join("form.txt"));
    }
}
