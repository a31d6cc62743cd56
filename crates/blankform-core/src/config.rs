//! Engine configuration.
//!
//! Layers, lowest first: the embedded defaults, an optional user file, then
//! environment overrides. Files are merged key by key, so a user file only
//! needs the keys it changes.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::parsing::catalog::{Catalog, Rule};
use crate::reconcile::{Rendering, Strategy};
use crate::registry::Padding;

const DEFAULT_CONFIG: &str = include_str!("../assets/default-config.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub catalog: CatalogConfig,
    pub reconcile: ReconcileConfig,
    pub render: RenderConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub paragraph_rules: Vec<Rule>,
    pub layout_rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub strategy: Strategy,
    pub blank_filler: String,
    pub checked: String,
    pub unchecked: String,
}

/// Sizing for paragraph-mode text fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub char_width: f32,
    pub min_width: f32,
    pub height: f32,
    pub padding: Padding,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            char_width: 11.0,
            min_width: 50.0,
            height: 30.0,
            padding: Padding {
                left: 5.0,
                top: 3.0,
                right: 5.0,
                bottom: 3.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Run one worker per page.
    pub parallel: bool,
}

/// Environment overrides for the settings worth changing per run.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    strategy: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        EnvOverrides {
            strategy: env::var("BLANKFORM_STRATEGY").ok(),
        }
    }

    pub fn with_strategy(strategy: &str) -> Self {
        EnvOverrides {
            strategy: Some(strategy.to_owned()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        // The embedded file is covered by tests; fall back to the same values
        // spelled out in code rather than panicking.
        Self::from_toml_str(DEFAULT_CONFIG).unwrap_or_else(|_| EngineConfig {
            catalog: CatalogConfig {
                paragraph_rules: Rule::ALL.to_vec(),
                layout_rules: Rule::ALL.to_vec(),
            },
            reconcile: ReconcileConfig::from(&Rendering::default()),
            render: RenderConfig::default(),
            layout: LayoutConfig { parallel: true },
        })
    }
}

impl From<&Rendering> for ReconcileConfig {
    fn from(rendering: &Rendering) -> Self {
        ReconcileConfig {
            strategy: Strategy::default(),
            blank_filler: rendering.blank_filler.clone(),
            checked: rendering.checked.clone(),
            unchecked: rendering.unchecked.clone(),
        }
    }
}

impl EngineConfig {
    /// Defaults, then `user` if given, then the environment.
    pub fn load(user: Option<&Path>) -> Result<Self, FormError> {
        Self::load_with_layers(user, EnvOverrides::from_env())
    }

    pub fn load_with_layers(user: Option<&Path>, env: EnvOverrides) -> Result<Self, FormError> {
        let mut merged = parse_table(DEFAULT_CONFIG, "built-in defaults")?;

        if let Some(path) = user {
            let data = fs::read_to_string(path).map_err(|e| {
                FormError::Config(format!("failed to read {}: {e}", path.display()))
            })?;
            let overlay = parse_table(&data, &path.display().to_string())?;
            merge_tables(&mut merged, overlay);
            tracing::debug!(path = %path.display(), "merged user config");
        }

        let mut config: EngineConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| FormError::Config(e.to_string()))?;
        config.apply_env(env)?;
        Ok(config)
    }

    /// Parse a complete configuration, without layering.
    pub fn from_toml_str(contents: &str) -> Result<Self, FormError> {
        toml::from_str(contents).map_err(|e| FormError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, FormError> {
        toml::to_string_pretty(self).map_err(|e| FormError::Config(e.to_string()))
    }

    fn apply_env(&mut self, env: EnvOverrides) -> Result<(), FormError> {
        if let Some(strategy) = env.strategy {
            self.reconcile.strategy = strategy.parse()?;
        }
        Ok(())
    }

    pub fn paragraph_catalog(&self) -> Catalog {
        Catalog::with_rules(self.catalog.paragraph_rules.iter().copied())
    }

    pub fn layout_catalog(&self) -> Catalog {
        Catalog::with_rules(self.catalog.layout_rules.iter().copied())
    }

    pub fn rendering(&self) -> Rendering {
        Rendering {
            blank_filler: self.reconcile.blank_filler.clone(),
            checked: self.reconcile.checked.clone(),
            unchecked: self.reconcile.unchecked.clone(),
        }
    }
}

fn parse_table(contents: &str, origin: &str) -> Result<toml::Table, FormError> {
    contents
        .parse::<toml::Table>()
        .map_err(|e| FormError::Config(format!("{origin}: {e}")))
}

/// Overlay `overlay` onto `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let incoming = match value {
            toml::Value::Table(incoming) => incoming,
            other => {
                base.insert(key, other);
                continue;
            }
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_builtin_values() {
        let config = EngineConfig::load_with_layers(None, EnvOverrides::default()).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.reconcile.strategy, Strategy::Positional);
        assert_eq!(config.render, RenderConfig::default());
        assert_eq!(config.rendering(), Rendering::default());
        assert_eq!(config.paragraph_catalog(), Catalog::standard());
        assert!(config.layout.parallel);
    }

    #[test]
    fn test_user_file_overrides_only_its_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blankform.toml");
        fs::write(
            &path,
            r#"
[reconcile]
blank_filler = "...."

[render]
padding = { left = 1.0, top = 1.0, right = 1.0, bottom = 1.0 }
"#,
        )
        .unwrap();

        let config = EngineConfig::load_with_layers(Some(&path), EnvOverrides::default()).unwrap();
        assert_eq!(config.reconcile.blank_filler, "....");
        assert_eq!(config.reconcile.checked, "( X )");
        assert_eq!(config.render.padding.left, 1.0);
        assert_eq!(config.render.char_width, 11.0);
    }

    #[test]
    fn test_rule_order_does_not_change_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(
            &path,
            "[catalog]\nparagraph_rules = [\"checkbox\", \"blank_fill\"]\n",
        )
        .unwrap();

        let config = EngineConfig::load_with_layers(Some(&path), EnvOverrides::default()).unwrap();
        assert_eq!(
            config.paragraph_catalog().rules(),
            &[Rule::BlankFill, Rule::Checkbox]
        );
        assert_eq!(config.layout_catalog(), Catalog::standard());
    }

    #[test]
    fn test_unknown_rule_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[catalog]\nparagraph_rules = [\"signature\"]\n").unwrap();
        assert!(matches!(
            EngineConfig::load_with_layers(Some(&path), EnvOverrides::default()),
            Err(FormError::Config(_))
        ));
    }

    #[test]
    fn test_env_strategy_wins() {
        let config =
            EngineConfig::load_with_layers(None, EnvOverrides::with_strategy("marker")).unwrap();
        assert_eq!(config.reconcile.strategy, Strategy::MarkerToken);

        assert!(matches!(
            EngineConfig::load_with_layers(None, EnvOverrides::with_strategy("nope")),
            Err(FormError::Config(_))
        ));
    }

    #[test]
    fn test_printed_config_parses_back() {
        let config = EngineConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
