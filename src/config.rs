//! Configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. A config file
//! is optional: stock defaults cover everything, and a user file only needs
//! the keys it wants to change. It is passed explicitly with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "jpeg"           # "jpeg" or "avif"
//! quality = 90              # Lossy quality (1-100)
//!
//! [detection]
//! multiplier = 1.03         # Threshold = mean brightness x multiplier ...
//! ceiling = 250.0           # ... capped at this value
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! fail_fast = false         # true: any failure aborts the whole batch
//!
//! [profiles.default]
//! content = [1200, 1200]
//! canvas = [1620, 1620]
//! placement = "center"
//!
//! [profiles.alternate]
//! content = [1620, 1300]
//! canvas = [1620, 1620]
//! placement = { fixed = { left = 0, top = 100 } }
//! ```
//!
//! ## Partial Configuration
//!
//! User values are merged key by key on top of the stock defaults, so this
//! adds a third profile and keeps the other two:
//!
//! ```toml
//! [profiles.square]
//! content = [800, 800]
//! canvas = [1000, 1000]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::operations::EncodeSettings;
use crate::imaging::{OutputFormat, Quality, ThresholdParams};
use crate::profile::{ProfileError, ProfileTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config validation error: {0}")]
    Profile(#[from] ProfileError),
}

/// Application configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Final encode settings.
    pub output: OutputConfig,
    /// Background threshold tunables.
    pub detection: ThresholdParams,
    /// Parallelism and batch failure policy.
    pub processing: ProcessingConfig,
    /// Named output profiles.
    pub profiles: ProfileTable,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if !(self.detection.multiplier.is_finite() && self.detection.multiplier > 0.0) {
            return Err(ConfigError::Validation(
                "detection.multiplier must be a positive number".into(),
            ));
        }
        if !(self.detection.ceiling > 0.0 && self.detection.ceiling <= 255.0) {
            return Err(ConfigError::Validation(
                "detection.ceiling must be in (0, 255]".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.profiles.is_empty() {
            return Err(ConfigError::Validation(
                "at least one profile must be defined".into(),
            ));
        }
        self.profiles.validate()?;
        Ok(())
    }

    /// Output format and quality as the pipeline consumes them.
    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            format: self.output.format,
            quality: Quality::new(self.output.quality),
        }
    }
}

/// Final encode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Output format for every written image.
    pub format: OutputFormat,
    /// Lossy encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 90,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// When true, a single failed image aborts the batch and nothing is written.
    pub fail_fast: bool,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto. It is parsed from
/// [`stock_config_toml`], which is kept equal to `AppConfig::default()`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(stock_config_toml())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// With no path, the stock defaults are used. With a path, the file must
/// exist; its values are merged on top of the defaults and validated.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# whitecrop configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass this file with `whitecrop process --config config.toml ...`.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# Format of every written image: "jpeg" or "avif".
format = "jpeg"

# Lossy encoding quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Background detection
# ---------------------------------------------------------------------------
[detection]
# The background threshold is the mean brightness of all pixel samples
# multiplied by this factor...
multiplier = 1.03

# ...and capped at this value (0-255 scale).
ceiling = 250.0

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# false: write every image that succeeds and report the ones that fail.
# true:  any failure aborts the batch and nothing is written.
fail_fast = false

# ---------------------------------------------------------------------------
# Output profiles
# ---------------------------------------------------------------------------
# Each profile fits the cropped content into `content` ([width, height]),
# then pastes it onto a white `canvas`. `placement` is either "center" or a
# fixed top-left offset: { fixed = { left = 0, top = 100 } }.
# Add a profile by adding a [profiles.<name>] table.

[profiles.default]
content = [1200, 1200]
canvas = [1620, 1620]
placement = "center"

[profiles.alternate]
content = [1620, 1300]
canvas = [1620, 1620]
placement = { fixed = { left = 0, top = 100 } }
"##
}
