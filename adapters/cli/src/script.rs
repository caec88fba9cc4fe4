use std::{fs, path::Path};

use anyhow::{Context, Result};
use openbound_system_control::ControlInput;
use serde::Deserialize;

/// Scripted pointer input keyed by the tick it is delivered on.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Script {
    input: Vec<ScriptedInput>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct ScriptedInput {
    tick: u64,
    #[serde(flatten)]
    control: ControlInput,
}

impl Script {
    pub(crate) fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid input script")
    }

    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
    }

    /// Inputs for `tick` in file order.
    pub(crate) fn inputs_at(&self, tick: u64) -> Vec<ControlInput> {
        self.input
            .iter()
            .filter(|entry| entry.tick == tick)
            .map(|entry| entry.control)
            .collect()
    }
}
