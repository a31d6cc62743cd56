use std::path::Path;

use serde::Serialize;

use blankform_core::error::FormError;
use blankform_core::model::Line;
use blankform_core::registry::FieldDescriptor;

/// What `extract` reports: the tokenized lines and the registry built on them.
#[derive(Serialize)]
pub struct Extraction<'a> {
    pub source: String,
    pub lines: &'a [Line],
    pub fields: &'a [FieldDescriptor],
}

impl<'a> Extraction<'a> {
    pub fn new(source: &Path, lines: &'a [Line], fields: &'a [FieldDescriptor]) -> Self {
        Extraction {
            source: source.display().to_string(),
            lines,
            fields,
        }
    }
}

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), FormError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
