//! Alpaca adapter configuration.

use std::time::Duration;

/// Environment for Alpaca API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlpacaEnvironment {
    /// Paper trading (simulated).
    Paper,
    /// Live trading (real money).
    Live,
}

impl AlpacaEnvironment {
    /// Get the base URL for the trading API.
    #[must_use]
    pub const fn trading_base_url(&self) -> &'static str {
        match self {
            Self::Paper => "https://paper-api.alpaca.markets",
            Self::Live => "https://api.alpaca.markets",
        }
    }

    /// Check if this is live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl std::fmt::Display for AlpacaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "PAPER"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}

/// Configuration for the Alpaca broker adapter.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    /// API key.
    pub api_key: String,
    /// API secret.
    pub api_secret: String,
    /// Trading environment.
    pub environment: AlpacaEnvironment,
    /// Trading API base URL override (proxies, test servers).
    pub base_url: Option<String>,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy for idempotent requests.
    pub retry: RetryConfig,
}

impl AlpacaConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(api_key: String, api_secret: String, environment: AlpacaEnvironment) -> Self {
        Self {
            api_key,
            api_secret,
            environment,
            base_url: None,
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Point the adapter at a different trading API host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Get the trading API base URL, without a trailing slash.
    #[must_use]
    pub fn trading_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map_or(self.environment.trading_base_url(), |url| {
                url.trim_end_matches('/')
            })
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Jitter as a fraction of the backoff (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}
