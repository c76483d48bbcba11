//! Alpaca broker adapter implementing the capacity oracle and order gateway.

use async_trait::async_trait;

use crate::application::ports::{
    CapacityOraclePort, GatewayError, OracleError, OrderGatewayPort, SubmissionResponse,
    SubmitOrderRequest,
};
use crate::domain::admission::CapacitySnapshot;
use crate::domain::shared::{Money, Timestamp};

use super::api_types::{AlpacaAccountResponse, AlpacaOrderRequest, AlpacaOrderResponse};
use super::config::{AlpacaConfig, AlpacaEnvironment};
use super::error::AlpacaError;
use super::http_client::AlpacaHttpClient;

/// Alpaca Markets broker adapter.
///
/// Buying power comes from `GET /v2/account`; orders go to `POST /v2/orders`.
#[derive(Debug, Clone)]
pub struct AlpacaBrokerAdapter {
    client: AlpacaHttpClient,
    environment: AlpacaEnvironment,
}

impl AlpacaBrokerAdapter {
    /// Create a new Alpaca broker adapter.
    pub fn new(config: AlpacaConfig) -> Result<Self, AlpacaError> {
        let client = AlpacaHttpClient::new(&config)?;
        Ok(Self {
            client,
            environment: config.environment,
        })
    }

    /// Check if we're in live trading mode.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.environment.is_live()
    }
}

/// Turn a failed order POST into either a definitive rejection or a gateway
/// error (outcome unknown).
fn classify_order_error(err: AlpacaError) -> Result<SubmissionResponse, GatewayError> {
    if err.is_insufficient_buying_power() {
        let reason = match &err {
            AlpacaError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        return Ok(SubmissionResponse::RejectedForCapacity { reason });
    }

    match err {
        AlpacaError::Api {
            status,
            code,
            message,
        } if status < 500 => Ok(SubmissionResponse::Rejected {
            reason: format!("{code}: {message}"),
        }),
        other @ (AlpacaError::AuthenticationFailed | AlpacaError::RateLimited { .. }) => {
            Ok(SubmissionResponse::Rejected {
                reason: other.to_string(),
            })
        }
        other => Err(GatewayError::from(other)),
    }
}

#[async_trait]
impl CapacityOraclePort for AlpacaBrokerAdapter {
    async fn fetch_capacity(&self) -> Result<CapacitySnapshot, OracleError> {
        let account: AlpacaAccountResponse = self.client.get("/v2/account").await?;
        let observed_at = Timestamp::now();

        let buying_power = account
            .buying_power()
            .map_err(|message| OracleError::MalformedResponse { message })?;

        if account.trading_blocked {
            tracing::warn!(
                account_id = %account.id,
                status = ?account.status,
                "Alpaca account is trading blocked, reporting zero capacity"
            );
            return Ok(CapacitySnapshot::new(Money::ZERO, observed_at));
        }

        tracing::debug!(buying_power = %buying_power, "Fetched Alpaca buying power");
        Ok(CapacitySnapshot::new(Money::new(buying_power), observed_at))
    }
}

#[async_trait]
impl OrderGatewayPort for AlpacaBrokerAdapter {
    async fn submit_order(
        &self,
        request: SubmitOrderRequest,
    ) -> Result<SubmissionResponse, GatewayError> {
        if self.is_live() {
            tracing::warn!(
                client_order_id = %request.client_order_id,
                symbol = %request.symbol,
                "Submitting LIVE order - this will execute real trades"
            );
        }

        let alpaca_request = AlpacaOrderRequest::from(&request);

        tracing::info!(
            client_order_id = %request.client_order_id,
            symbol = %request.symbol,
            side = %alpaca_request.side,
            order_type = %alpaca_request.order_type,
            qty = %alpaca_request.qty,
            limit_price = ?alpaca_request.limit_price,
            "Submitting order to Alpaca"
        );

        let response: AlpacaOrderResponse =
            match self.client.post("/v2/orders", &alpaca_request).await {
                Ok(response) => response,
                Err(e) => return classify_order_error(e),
            };

        if response.is_rejected() {
            return Ok(SubmissionResponse::Rejected {
                reason: format!("order {} rejected by Alpaca", response.id),
            });
        }

        tracing::info!(
            client_order_id = %request.client_order_id,
            broker_order_id = %response.id,
            status = %response.status,
            "Order submitted successfully"
        );

        Ok(SubmissionResponse::Accepted(response.to_receipt()))
    }
}
