//! Filter configuration module.
//!
//! Handles loading, validating, and merging `denoise.toml`. The file is
//! optional and sparse: stock defaults are the base layer and any keys present
//! in the file override them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [median]
//! kernel_size = 5           # odd, 3..=255
//!
//! [adaptive]
//! window_size = 5           # odd, 3..=255
//!
//! [bilateral]
//! d = 9                     # odd, 1..=255
//! sigma_color = 75.0        # > 0
//! sigma_space = 75.0        # > 0
//!
//! [morphological]
//! kernel_size = 5           # odd, 3..=255 (disc diameter)
//!
//! [wiener]
//! window_size = 5           # odd, 3..=255
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    BilateralParams, DEFAULT_BILATERAL_DIAMETER, DEFAULT_BILATERAL_SIGMA, DEFAULT_WINDOW_SIZE,
    FilterKind, FilterSpec,
};
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
}

/// Filter defaults and processing settings loaded from `denoise.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DenoiseConfig {
    pub median: KernelConfig,
    pub adaptive: WindowConfig,
    pub bilateral: BilateralConfig,
    pub morphological: KernelConfig,
    pub wiener: WindowConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl DenoiseConfig {
    /// Configured parameters for one filter.
    pub fn spec_for(&self, kind: FilterKind) -> FilterSpec {
        match kind {
            FilterKind::Median => FilterSpec::Median {
                kernel_size: self.median.kernel_size,
            },
            FilterKind::Adaptive => FilterSpec::Adaptive {
                window_size: self.adaptive.window_size,
            },
            FilterKind::Bilateral => FilterSpec::Bilateral(BilateralParams {
                diameter: self.bilateral.d,
                sigma_color: self.bilateral.sigma_color,
                sigma_space: self.bilateral.sigma_space,
            }),
            FilterKind::Morphological => FilterSpec::Morphological {
                kernel_size: self.morphological.kernel_size,
            },
            FilterKind::Wiener => FilterSpec::Wiener {
                window_size: self.wiener.window_size,
            },
        }
    }

    /// Validate every filter section against the parameter invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in FilterKind::ALL {
            self.spec_for(kind)
                .validate()
                .map_err(|e| ConfigError::Validation(format!("[{kind}] {e}")))?;
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Settings for filters sized by `kernel_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    pub kernel_size: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Settings for filters sized by `window_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub window_size: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Bilateral filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BilateralConfig {
    /// Neighbourhood diameter.
    pub d: u32,
    pub sigma_color: f64,
    pub sigma_space: f64,
}

impl Default for BilateralConfig {
    fn default() -> Self {
        Self {
            d: DEFAULT_BILATERAL_DIAMETER,
            sigma_color: DEFAULT_BILATERAL_SIGMA,
            sigma_space: DEFAULT_BILATERAL_SIGMA,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel filter workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
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
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(DenoiseConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but is
/// not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DenoiseConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DenoiseConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
pub fn load_config(path: &Path) -> Result<DenoiseConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `denoise.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# retina-denoise configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Sizes are in pixels and must be odd so every window has a centre sample.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Median filter: k x k rank filter
# ---------------------------------------------------------------------------
[median]
kernel_size = 5

# ---------------------------------------------------------------------------
# Adaptive filter: fixed w x w windowed median
# ---------------------------------------------------------------------------
[adaptive]
window_size = 5

# ---------------------------------------------------------------------------
# Bilateral filter: edge-preserving weighted mean
# ---------------------------------------------------------------------------
[bilateral]
# Neighbourhood diameter (odd, 1..=255).
d = 9
# Intensity falloff: larger values average across stronger edges.
sigma_color = 75.0
# Spatial falloff: larger values give distant neighbours more weight.
sigma_space = 75.0

# ---------------------------------------------------------------------------
# Morphological filter: opening then closing with a disc
# ---------------------------------------------------------------------------
[morphological]
# Disc diameter (odd, 3..=255).
kernel_size = 5

# ---------------------------------------------------------------------------
# Wiener filter: local-variance adaptive smoothing
# ---------------------------------------------------------------------------
[wiener]
window_size = 5

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_stock_filter_parameters() {
        let config = DenoiseConfig::default();
        for kind in FilterKind::ALL {
            assert_eq!(config.spec_for(kind), FilterSpec::default_for(kind));
        }
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[bilateral]
sigma_color = 25.0
"#;
        let config: DenoiseConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.bilateral.sigma_color, 25.0);
        // Default values preserved
        assert_eq!(config.bilateral.d, 9);
        assert_eq!(config.bilateral.sigma_space, 75.0);
        assert_eq!(config.median.kernel_size, 5);
    }

    #[test]
    fn spec_for_uses_configured_values() {
        let toml = r#"
[median]
kernel_size = 3

[wiener]
window_size = 7
"#;
        let config: DenoiseConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.spec_for(FilterKind::Median),
            FilterSpec::Median { kernel_size: 3 }
        );
        assert_eq!(
            config.spec_for(FilterKind::Wiener),
            FilterSpec::Wiener { window_size: 7 }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r#"
[median]
window_size = 5
"#;
        assert!(toml::from_str::<DenoiseConfig>(toml).is_err());
        assert!(toml::from_str::<DenoiseConfig>("[gaussian]\nsigma = 1.0\n").is_err());
    }

    #[test]
    fn validate_rejects_even_sizes() {
        let mut config = DenoiseConfig::default();
        config.morphological.kernel_size = 4;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.starts_with("[morphological]")));
    }

    #[test]
    fn validate_rejects_oversized_windows() {
        let mut config = DenoiseConfig::default();
        config.median.kernel_size = 65_537;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.starts_with("[median]") && msg.contains("at most 255")));

        let mut config = DenoiseConfig::default();
        config.bilateral.d = 257;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_bilateral_sigma() {
        let mut config = DenoiseConfig::default();
        config.bilateral.sigma_space = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = DenoiseConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = effective_threads(&ProcessingConfig::default());
        assert!(cores >= 1);
        let capped = effective_threads(&ProcessingConfig {
            max_processes: Some(1),
        });
        assert_eq!(capped, 1);
        let over = effective_threads(&ProcessingConfig {
            max_processes: Some(100_000),
        });
        assert_eq!(over, cores);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_overrides_leaves_and_keeps_siblings() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n[b]\nz = 3\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 20\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(20));
        assert_eq!(merged["b"]["z"].as_integer(), Some(3));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("denoise.toml")).unwrap();
        assert_eq!(config, DenoiseConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("denoise.toml");
        fs::write(
            &path,
            r#"
[adaptive]
window_size = 9

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.adaptive.window_size, 9);
        assert_eq!(config.processing.max_processes, Some(2));
        // Unspecified values should be defaults
        assert_eq!(config.wiener.window_size, 5);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("denoise.toml");
        fs::write(&path, "this is not [valid toml").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("denoise.toml");
        fs::write(&path, "[median]\nkernel_size = 2\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_raw_config(&tmp.path().join("missing.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: DenoiseConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, DenoiseConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let toml = stock_config_toml();
        for section in [
            "[median]",
            "[adaptive]",
            "[bilateral]",
            "[morphological]",
            "[wiener]",
            "[processing]",
        ] {
            assert!(toml.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_is_table() {
        let value = stock_defaults_value().unwrap();
        assert!(value.is_table());
        assert!(value.get("bilateral").is_some());
    }
}
