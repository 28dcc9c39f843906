//! Planner configuration
//!
//! Every field has a default; a TOML file may override any subset of them.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What happens to producer output left over after its connections are served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResidualPolicy {
    /// Attribute the leftover to the last connection walked. Historic behaviour.
    #[default]
    DumpOnLastConsumer,
    /// Keep the leftover on the producer as unclaimed surplus.
    ReportSurplus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlannerConfig {
    pub residual_policy: ResidualPolicy,
    /// Recipe the matcher starts from before scanning the catalog.
    pub fallback_recipe: String,
    /// Offset of a newly added building from the previous one.
    pub add_offset_x: f64,
    pub add_offset_y: f64,
    /// Rendered node width, used to keep auto-extended buildings clear of the cursor.
    pub node_width: f64,
    pub debounce_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            residual_policy: ResidualPolicy::default(),
            fallback_recipe: "RecipeIronPlateC".to_string(),
            add_offset_x: 40.0,
            add_offset_y: 40.0,
            node_width: 240.0,
            debounce_ms: 500,
        }
    }
}

impl PlannerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
