//! Environment configuration for trading mode.

use serde::{Deserialize, Serialize};

/// Where orders go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingMode {
    /// Alpaca paper trading.
    Paper,
    /// Alpaca live trading (real money).
    Live,
    /// In-process simulated broker.
    Simulated,
}

impl TradingMode {
    /// Accepted `environment.mode` values.
    pub const VALID: [&'static str; 3] = ["PAPER", "LIVE", "SIMULATED"];

    /// Parse a mode name.
    #[must_use]
    pub fn parse(mode: &str) -> Option<Self> {
        match mode.trim().to_ascii_uppercase().as_str() {
            "PAPER" => Some(Self::Paper),
            "LIVE" => Some(Self::Live),
            "SIMULATED" => Some(Self::Simulated),
            _ => None,
        }
    }

    /// Returns true if this mode talks to a real broker.
    #[must_use]
    pub const fn needs_credentials(&self) -> bool {
        matches!(self, Self::Paper | Self::Live)
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "PAPER"),
            Self::Live => write!(f, "LIVE"),
            Self::Simulated => write!(f, "SIMULATED"),
        }
    }
}

/// Environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Trading mode.
    #[serde(default = "default_environment_mode")]
    pub mode: String,
}

impl EnvironmentConfig {
    /// The parsed trading mode, if the mode string is known.
    #[must_use]
    pub fn trading_mode(&self) -> Option<TradingMode> {
        TradingMode::parse(&self.mode)
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            mode: default_environment_mode(),
        }
    }
}

fn default_environment_mode() -> String {
    "PAPER".to_string()
}
