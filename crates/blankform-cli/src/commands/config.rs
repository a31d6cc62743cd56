use blankform_core::config::EngineConfig;
use blankform_core::error::FormError;

pub fn print(config: &EngineConfig) -> Result<(), FormError> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
