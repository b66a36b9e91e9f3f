//! Render and load options, optionally read from a JSON file.

use crate::theme::ThemePreset;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    /// Overrides the per-chart figure width.
    #[serde(default)]
    pub width: Option<u32>,
    /// Overrides the per-chart figure height.
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub theme: ThemePreset,
    #[serde(default = "default_bins")]
    pub bins: usize,
    /// Pixels of background kept around the cropped figure.
    #[serde(default = "default_padding")]
    pub padding: u32,
}

fn default_bins() -> usize { 20 }
fn default_padding() -> u32 { 10 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            theme: ThemePreset::default(),
            bins: 20,
            padding: 10,
        }
    }
}

impl RenderOptions {
    /// Figure size for a chart whose natural size is `default`.
    pub fn size_or(&self, default: (u32, u32)) -> (u32, u32) {
        (
            self.width.unwrap_or(default.0),
            self.height.unwrap_or(default.1),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadOptions {
    /// Detect date/time text columns in delimited files.
    #[serde(default = "default_infer_datetimes")]
    pub infer_datetimes: bool,
}

fn default_infer_datetimes() -> bool { true }

impl Default for LoadOptions {
    fn default() -> Self {
        Self { infer_datetimes: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub load: LoadOptions,
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid config JSON")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}
