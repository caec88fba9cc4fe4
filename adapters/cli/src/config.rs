use std::{fs, path::Path};

use anyhow::{Context, Result};
use openbound_core::Tuning;
use openbound_map_format::TileTable;
use serde::Deserialize;

/// Optional settings file passed with `--config`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Overrides for movement and input constants.
    pub(crate) tuning: Tuning,
}

impl CliConfig {
    pub(crate) fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid configuration")
    }

    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
    }
}

pub(crate) fn load_tiles(path: Option<&Path>) -> Result<TileTable> {
    let Some(path) = path else {
        return Ok(TileTable::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read tile table {}", path.display()))?;
    TileTable::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_overrides_keep_other_defaults() {
        let config = CliConfig::from_toml_str(
            r#"
            [tuning]
            move_delay = 2
            move_cycle = [4, 4]
            "#,
        )
        .expect("valid config");
        assert_eq!(config.tuning.move_delay, 2);
        assert_eq!(config.tuning.move_cycle, vec![4, 4]);
        assert_eq!(config.tuning.max_orders, Tuning::default().max_orders);
    }

    #[test]
    fn empty_config_is_the_default() {
        let config = CliConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn unknown_tuning_fields_are_rejected() {
        assert!(CliConfig::from_toml_str("[tuning]\nwarp_speed = 9\n").is_err());
    }
}
