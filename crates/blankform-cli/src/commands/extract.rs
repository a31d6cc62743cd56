use std::path::PathBuf;

use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;
use blankform_core::session::Session;

use crate::output;
use crate::output::json::Extraction;

pub fn run(
    input_file: PathBuf,
    config: &EngineConfig,
    output_format: &str,
    output_file: Option<PathBuf>,
    annotated: bool,
) -> Result<(), FormError> {
    let session = Session::open(input_file, None)?;
    let (_, lines) = super::open_lines(&session, config)?;
    let registry = blankform_core::paragraph_registry(&lines, config);
    let extraction = Extraction::new(session.source(), &lines, registry.descriptors());

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&extraction)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} field(s) from {} line(s), written to {}",
                registry.len(),
                lines.len(),
                path.display()
            );
        }
        None if annotated => output::table::print_annotated(&lines),
        None => match output_format {
            "json" => output::json::print(&extraction)?,
            _ => output::table::print_lines(&lines),
        },
    }

    Ok(())
}
