pub mod clear;
pub mod config;
pub mod extract;
pub mod fill;
pub mod locate;

use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;
use blankform_core::extraction::{self, EditableDocument};
use blankform_core::model::Line;
use blankform_core::session::Session;

/// Open a paragraph document and tokenize it with the configured catalog.
fn open_lines(
    session: &Session,
    config: &EngineConfig,
) -> Result<(Box<dyn EditableDocument>, Vec<Line>), FormError> {
    let document = extraction::open_editable(session)?;
    let lines = blankform_core::extract_lines(document.as_ref(), &config.paragraph_catalog())?;
    Ok((document, lines))
}
