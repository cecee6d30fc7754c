//! Configuration loading, validation, and management for ContextGate.
//!
//! Loads configuration from `~/.contextgate/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum fractional shrinkage a compressed pack must achieve when the
/// caller does not ask for a specific ratio (35% reduction).
pub const DEFAULT_REQUIRED_SAVING_RATIO: f64 = 0.35;

/// Environment variable overriding `fidelity.required_saving_ratio`.
pub const REQUIRED_SAVING_RATIO_ENV: &str = "CONTEXTGATE_REQUIRED_SAVING_RATIO";

/// The root configuration structure.
///
/// Maps directly to `~/.contextgate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fidelity gate settings
    #[serde(default)]
    pub fidelity: FidelityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FidelityConfig {
    /// Required saving ratio. Non-positive means "use the default".
    #[serde(default = "default_required_saving_ratio")]
    pub required_saving_ratio: f64,

    /// How many compression attempts a caller makes per cycle.
    #[serde(default = "default_max_compression_attempts")]
    pub max_compression_attempts: u32,
}

fn default_required_saving_ratio() -> f64 {
    DEFAULT_REQUIRED_SAVING_RATIO
}
fn default_max_compression_attempts() -> u32 {
    2
}

impl Default for FidelityConfig {
    fn default() -> Self {
        Self {
            required_saving_ratio: default_required_saving_ratio(),
            max_compression_attempts: default_max_compression_attempts(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path, with env var overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(raw) = std::env::var(REQUIRED_SAVING_RATIO_ENV) {
            config.apply_ratio_override(&raw)?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".contextgate")
    }

    fn apply_ratio_override(&mut self, raw: &str) -> Result<(), ConfigError> {
        let ratio: f64 = raw.trim().parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "{REQUIRED_SAVING_RATIO_ENV} must be a number, got '{raw}'"
            ))
        })?;
        tracing::debug!(ratio, "Required saving ratio overridden from environment");
        self.fidelity.required_saving_ratio = ratio;
        self.validate()
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.fidelity.required_saving_ratio;
        if !ratio.is_finite() || ratio > 1.0 {
            return Err(ConfigError::ValidationError(
                "fidelity.required_saving_ratio must be a finite number no greater than 1.0".into(),
            ));
        }

        if self.fidelity.max_compression_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "fidelity.max_compression_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
