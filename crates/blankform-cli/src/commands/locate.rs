use std::path::PathBuf;

use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;
use blankform_core::extraction;
use blankform_core::session::Session;

use crate::output;

pub fn run(
    input_file: PathBuf,
    config: &EngineConfig,
    output_format: &str,
    sequential: bool,
) -> Result<(), FormError> {
    let session = Session::open(input_file, None)?;
    let source = extraction::open_layout(&session)?;

    let mut config = config.clone();
    if sequential {
        config.layout.parallel = false;
    }
    let registry = blankform_core::locate_fields(source.as_ref(), &config)?;

    match output_format {
        "json" => output::json::print(registry.descriptors())?,
        _ => output::table::print_located(registry.descriptors()),
    }
    Ok(())
}
