//! Broker configuration for capacity queries and order routing.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::infrastructure::broker::alpaca::{AlpacaConfig, AlpacaEnvironment, RetryConfig};

/// Broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrokerConfig {
    /// Alpaca broker configuration.
    #[serde(default)]
    pub alpaca: AlpacaSettings,
    /// Simulated broker configuration.
    #[serde(default)]
    pub simulated: SimulatedSettings,
}

/// Alpaca broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlpacaSettings {
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret.
    #[serde(default)]
    pub api_secret: String,
    /// Trading API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retry policy for account queries.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: None,
            timeout_ms: default_timeout_ms(),
            retry: RetrySettings::default(),
        }
    }
}

impl AlpacaSettings {
    /// Build the adapter configuration for `environment`.
    #[must_use]
    pub fn to_adapter_config(&self, environment: AlpacaEnvironment) -> AlpacaConfig {
        let config = AlpacaConfig::new(self.api_key.clone(), self.api_secret.clone(), environment)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_retry(self.retry.to_retry_config());

        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => config.with_base_url(url),
            _ => config,
        }
    }
}

/// Retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter fraction (0.0 to 1.0).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl RetrySettings {
    /// Convert to the HTTP client's retry policy.
    #[must_use]
    pub const fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
            jitter: self.jitter,
        }
    }
}

/// Simulated broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedSettings {
    /// Buying power the ledger starts with.
    #[serde(default = "default_starting_capacity")]
    pub starting_capacity: Decimal,
}

impl Default for SimulatedSettings {
    fn default() -> Self {
        Self {
            starting_capacity: default_starting_capacity(),
        }
    }
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    100
}

const fn default_max_backoff_ms() -> u64 {
    2_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_jitter() -> f64 {
    0.1
}

fn default_starting_capacity() -> Decimal {
    Decimal::from(100_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_config_carries_settings() {
        let settings = AlpacaSettings {
            api_key: "key".into(),
            api_secret: "secret".into(),
            base_url: Some("http://localhost:9999/".into()),
            timeout_ms: 2_500,
            retry: RetrySettings {
                max_attempts: 5,
                ..RetrySettings::default()
            },
        };

        let config = settings.to_adapter_config(AlpacaEnvironment::Live);
        assert_eq!(config.environment, AlpacaEnvironment::Live);
        assert_eq!(config.timeout, Duration::from_millis(2_500));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.trading_base_url(), "http://localhost:9999");
    }

    #[test]
    fn blank_base_url_uses_environment_default() {
        let settings = AlpacaSettings {
            base_url: Some("  ".into()),
            ..AlpacaSettings::default()
        };
        let config = settings.to_adapter_config(AlpacaEnvironment::Paper);
        assert_eq!(config.trading_base_url(), "https://paper-api.alpaca.markets");
    }
}
