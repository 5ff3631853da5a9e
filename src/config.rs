use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Chunk previews are cut to this many characters.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_unknown_document_name")]
    pub unknown_document_name: String,
    /// Decimal places when printing scores as percentages.
    #[serde(default = "default_score_decimals")]
    pub score_decimals: usize,
    #[serde(default = "default_show_previews")]
    pub show_previews: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
            unknown_document_name: default_unknown_document_name(),
            score_decimals: default_score_decimals(),
            show_previews: default_show_previews(),
        }
    }
}

fn default_preview_chars() -> usize {
    120
}
fn default_unknown_document_name() -> String {
    "Unknown Document".to_string()
}
fn default_score_decimals() -> usize {
    1
}
fn default_show_previews() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level> {
        tracing::Level::from_str(&self.level).map_err(|_| {
            anyhow::anyhow!(
                "Unknown logging.level: '{}'. Must be trace, debug, info, warn, or error.",
                self.level
            )
        })
    }
}

impl Config {
    /// Defaults used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.display.preview_chars == 0 {
        anyhow::bail!("display.preview_chars must be > 0");
    }

    if config.display.score_decimals > 6 {
        anyhow::bail!("display.score_decimals must be <= 6");
    }

    if config.display.unknown_document_name.trim().is_empty() {
        anyhow::bail!("display.unknown_document_name must not be empty");
    }

    config.logging.max_level()?;

    Ok(())
}
