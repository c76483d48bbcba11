//! Environment validation at startup.

use super::{Config, TradingMode};

/// Errors from environment validation at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupValidationError {
    /// Missing required credentials for the environment.
    #[error("Missing required credentials for {environment} mode: {details}")]
    MissingCredentials {
        /// The trading environment.
        environment: String,
        /// Details about which credentials are missing.
        details: String,
    },

    /// Invalid environment configuration.
    #[error("Invalid environment configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result of startup environment validation.
#[derive(Debug)]
pub struct StartupValidation {
    /// The mode that was validated.
    pub mode: TradingMode,
    /// Warning messages (non-fatal).
    pub warnings: Vec<String>,
}

/// Validate environment configuration at startup.
///
/// - PAPER and LIVE need Alpaca credentials
/// - SIMULATED runs without credentials
/// - LIVE pointed at a paper URL is suspicious but allowed
pub fn validate_startup_environment(
    config: &Config,
) -> Result<StartupValidation, StartupValidationError> {
    let mode = config.environment.trading_mode().ok_or_else(|| {
        StartupValidationError::InvalidConfiguration(format!(
            "unknown environment.mode {:?}",
            config.environment.mode
        ))
    })?;

    let alpaca = &config.broker.alpaca;
    let mut warnings = Vec::new();

    match mode {
        TradingMode::Simulated => {
            if !alpaca.api_key.is_empty() {
                warnings.push(
                    "Alpaca credentials configured but not used in SIMULATED mode".to_string(),
                );
            }
        }
        TradingMode::Paper | TradingMode::Live => {
            require_credentials(&alpaca.api_key, &alpaca.api_secret, mode).map_err(
                |details| StartupValidationError::MissingCredentials {
                    environment: mode.to_string(),
                    details,
                },
            )?;

            if mode == TradingMode::Live
                && alpaca
                    .base_url
                    .as_deref()
                    .is_some_and(|url| url.contains("paper"))
            {
                warnings.push(
                    "LIVE mode configured but using paper API URL. \
                     This may indicate misconfiguration."
                        .to_string(),
                );
            }
        }
    }

    Ok(StartupValidation { mode, warnings })
}

/// Validate that required credentials are present, returning a detailed error message.
pub fn require_credentials(
    api_key: &str,
    api_secret: &str,
    mode: TradingMode,
) -> Result<(), String> {
    if !mode.needs_credentials() {
        return Ok(());
    }

    if api_key.is_empty() || api_secret.is_empty() {
        return Err(format!(
            "Alpaca credentials required for {mode} mode.\n\n\
             Missing:\n\
             {}{}\n\
             To fix:\n\
             1. Set ALPACA_KEY and ALPACA_SECRET environment variables, or\n\
             2. Configure credentials in config.yaml under broker.alpaca",
            if api_key.is_empty() {
                "  - ALPACA_KEY\n"
            } else {
                ""
            },
            if api_secret.is_empty() {
                "  - ALPACA_SECRET\n"
            } else {
                ""
            }
        ));
    }

    Ok(())
}
