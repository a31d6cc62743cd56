use std::path::PathBuf;

use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;
use blankform_core::reconcile::{Strategy, Submission};
use blankform_core::session::Session;

/// Empty every field: blanks become the filler, boxes are unchecked.
pub fn run(
    input_file: PathBuf,
    out_dir: Option<PathBuf>,
    config: &EngineConfig,
) -> Result<(), FormError> {
    let session = Session::open(input_file, out_dir)?;
    let output_path = session.prepare_output()?;
    let (document, lines) = super::open_lines(&session, config)?;

    // Positional is exact here: one cleared value per field, in order.
    let submission = Submission::cleared(&lines, Strategy::Positional);
    blankform_core::fill_document(&lines, &submission, &config.rendering(), document.as_ref())?;

    let fields: usize = lines.iter().map(|l| l.field_count()).sum();
    eprintln!(
        "Cleared {} field(s), written to {}",
        fields,
        output_path.display()
    );
    Ok(())
}
