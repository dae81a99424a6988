//! # Configuration Module
//!
//! Dashboard configuration: timezone, currency presentation, defaults and taxonomy
//!
//! ## Key Components
//! - [`Config`] - Settings loaded from `config.json`
//! - [`default_config_path`] - `$OPTISTATS_CONFIG_DIR` or the platform config dir
//! - [`Config::load`] - Read, fall back to defaults, validate

use anyhow::{Context, Result};
use chrono_tz::Tz;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::ViewModelAssembler;
use crate::bucketer::{Granularity, PeriodBucketer};
use crate::formatting::FormatRules;
use crate::ranking::DisplayCount;
use crate::taxonomy::Taxonomy;

pub const CONFIG_DIR_ENV: &str = "OPTISTATS_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA timezone used to turn timestamps into calendar dates
    pub timezone: String,
    pub currency_suffix: String,
    pub currency_decimals: usize,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub default_granularity: Granularity,
    pub default_display_count: DisplayCount,
    /// Ordered product-type keys shown as category cards
    pub taxonomy: Taxonomy,
}

impl Default for Config {
    fn default() -> Self {
        let rules = FormatRules::default();
        Self {
            timezone: "UTC".to_string(),
            currency_suffix: rules.currency_suffix,
            currency_decimals: rules.currency_decimals,
            thousands_separator: rules.thousands_separator,
            decimal_separator: rules.decimal_separator,
            default_granularity: Granularity::Day,
            default_display_count: DisplayCount::Top10,
            taxonomy: Taxonomy::default(),
        }
    }
}

/// `$OPTISTATS_CONFIG_DIR/config.json`, else `<config dir>/optistats/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }
    }
    dirs::config_dir().map(|dir| dir.join("optistats").join(CONFIG_FILE_NAME))
}

impl Config {
    /// Load from an explicit path (which must exist) or from the default
    /// location (defaults when absent). The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse configuration JSON")
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.taxonomy.is_empty() {
            anyhow::bail!("Taxonomy must list at least one category key");
        }
        if self.currency_decimals > 6 {
            anyhow::bail!("currency_decimals must be between 0 and 6, got {}", self.currency_decimals);
        }
        if self.thousands_separator == self.decimal_separator {
            anyhow::bail!("Thousands and decimal separators must differ");
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{}': {}", self.timezone, e))
    }

    pub fn format_rules(&self) -> FormatRules {
        FormatRules {
            currency_suffix: self.currency_suffix.clone(),
            currency_decimals: self.currency_decimals,
            count_decimals: 0,
            thousands_separator: self.thousands_separator,
            decimal_separator: self.decimal_separator,
        }
    }

    pub fn assembler(&self) -> Result<ViewModelAssembler> {
        Ok(ViewModelAssembler::new(
            self.format_rules(),
            PeriodBucketer::new(self.tz()?),
            self.taxonomy.clone(),
        ))
    }
}
