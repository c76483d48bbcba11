//! HTTP client wrapper.
//!
//! GET requests are idempotent and retried with jittered exponential backoff.
//! POST requests are sent exactly once: a retried order submission could
//! consume buying power twice.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::api_types::AlpacaErrorResponse;
use super::config::{AlpacaConfig, RetryConfig};
use super::error::AlpacaError;

/// HTTP client for Alpaca API.
#[derive(Debug, Clone)]
pub struct AlpacaHttpClient {
    client: Client,
    api_key: String,
    api_secret: String,
    trading_base_url: String,
    retry_config: RetryConfig,
}

impl AlpacaHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &AlpacaConfig) -> Result<Self, AlpacaError> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(AlpacaError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AlpacaError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            trading_base_url: config.trading_base_url().to_string(),
            retry_config: config.retry.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.api_secret)
    }

    /// Make a GET request to the trading API, retrying transient failures.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AlpacaError> {
        let url = format!("{}{path}", self.trading_base_url);
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let request = self.authorized(self.client.get(&url));

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    return parse_body(response).await;
                }
                Ok(response) => {
                    let status = response.status();
                    let retry_after = retry_after(&response);
                    let error = error_from_response(status, response).await;
                    match categorize_status(status) {
                        ErrorCategory::NonRetryable => return Err(error),
                        ErrorCategory::RateLimited => {
                            if let Some(secs) = retry_after {
                                if backoff.has_remaining() {
                                    backoff.skip();
                                    tracing::warn!(
                                        path,
                                        retry_after_secs = secs,
                                        "Rate limited, retrying"
                                    );
                                    tokio::time::sleep(Duration::from_secs(secs)).await;
                                    continue;
                                }
                                return Err(AlpacaError::RateLimited {
                                    retry_after_secs: secs,
                                });
                            }
                            error
                        }
                        ErrorCategory::Retryable => error,
                    }
                }
                Err(e) => AlpacaError::Network(e.to_string()),
            };

            match backoff.next_backoff() {
                Some(delay) => {
                    tracing::warn!(
                        path,
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        attempt = backoff.attempt,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(AlpacaError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                        last_error: error.to_string(),
                    });
                }
            }
        }
    }

    /// Make a POST request to the trading API. Never retried.
    #[allow(clippy::future_not_send)]
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AlpacaError> {
        let url = format!("{}{path}", self.trading_base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| AlpacaError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return parse_body(response).await;
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AlpacaError::RateLimited {
                retry_after_secs: retry_after(&response).unwrap_or(60),
            });
        }
        Err(error_from_response(status, response).await)
    }
}

async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T, AlpacaError> {
    let text = response
        .text()
        .await
        .map_err(|e| AlpacaError::Network(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| AlpacaError::JsonParse(e.to_string()))
}

fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

async fn error_from_response(status: StatusCode, response: Response) -> AlpacaError {
    if status == StatusCode::UNAUTHORIZED {
        return AlpacaError::AuthenticationFailed;
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<AlpacaErrorResponse>(&body) {
        Ok(err) => (
            err.code_string()
                .unwrap_or_else(|| status.as_u16().to_string()),
            err.message,
        ),
        Err(_) => (status.as_u16().to_string(), body),
    };

    AlpacaError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Error category for determining retry behavior.
enum ErrorCategory {
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Exponential backoff calculator with jitter.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 1,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
            jitter: config.jitter,
        }
    }

    const fn has_remaining(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Count an attempt whose delay was dictated by the server.
    const fn skip(&mut self) {
        self.attempt += 1;
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted.
    fn next_backoff(&mut self) -> Option<Duration> {
        if !self.has_remaining() {
            return None;
        }
        self.attempt += 1;

        let base = self.current_backoff.as_secs_f64();
        self.current_backoff = Duration::from_secs_f64(
            (base * self.multiplier).min(self.max_backoff.as_secs_f64()),
        );

        let spread = base * self.jitter.clamp(0.0, 1.0);
        let jittered = if spread > 0.0 {
            rand::rng().random_range((base - spread)..=(base + spread))
        } else {
            base
        };
        Some(Duration::from_secs_f64(
            jittered.min(self.max_backoff.as_secs_f64()),
        ))
    }
}
