//! Configuration module for the admission engine.
//!
//! Loads `config.yaml`, interpolates environment variables, and validates
//! the result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use admission_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("mode: {}", config.environment.mode);
//! ```

mod admission;
mod broker;
mod environment;
mod observability;
mod validation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use admission::AdmissionConfig;
pub use broker::{AlpacaSettings, BrokerConfig, RetrySettings, SimulatedSettings};
pub use environment::{EnvironmentConfig, TradingMode};
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use validation::{
    StartupValidation, StartupValidationError, require_credentials, validate_startup_environment,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Environment configuration.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Admission cycle configuration.
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// The validated trading mode.
    pub fn trading_mode(&self) -> Result<TradingMode, ConfigError> {
        self.environment.trading_mode().ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "environment.mode must be one of: {:?}",
                TradingMode::VALID
            ))
        })
    }
}

pub(crate) const fn default_true() -> bool {
    true
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config.trading_mode()?;

    if config.admission.capacity_reserve < Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "admission.capacity_reserve must not be negative".to_string(),
        ));
    }

    if config.admission.deadline_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "admission.deadline_secs must be positive".to_string(),
        ));
    }

    if config.broker.simulated.starting_capacity < Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "broker.simulated.starting_capacity must not be negative".to_string(),
        ));
    }

    let alpaca = &config.broker.alpaca;
    if alpaca.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "broker.alpaca.timeout_ms must be positive".to_string(),
        ));
    }

    let retry = &alpaca.retry;
    if retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "broker.alpaca.retry.max_attempts must be positive".to_string(),
        ));
    }
    if retry.multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "broker.alpaca.retry.multiplier must be at least 1.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&retry.jitter) {
        return Err(ConfigError::ValidationError(
            "broker.alpaca.retry.jitter must be between 0.0 and 1.0".to_string(),
        ));
    }

    let logging = &config.observability.logging;
    if !LoggingConfig::FORMATS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(&logging.format))
    {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {:?}",
            LoggingConfig::FORMATS
        )));
    }

    if config.observability.metrics.enabled {
        config.observability.metrics.to_metrics_config()?;
    }

    Ok(())
}
