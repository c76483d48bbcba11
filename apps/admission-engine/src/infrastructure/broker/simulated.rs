//! Simulated broker.
//!
//! An in-process buying power ledger implementing both the capacity oracle
//! and the order gateway. Accepted orders decrement the ledger the way a real
//! broker would; the ledger can also be drained just before a submission to
//! mimic another consumer of the same account.
//!
//! The broker records every call it receives and whether two submissions
//! were ever in flight at the same time.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{
    CapacityOraclePort, ClockPort, GatewayError, OracleError, OrderGatewayPort, OrderReceipt,
    SubmissionResponse, SubmitOrderRequest, SystemClock,
};
use crate::domain::admission::CapacitySnapshot;
use crate::domain::shared::{BrokerId, Money, OrderId, Symbol};

/// A call the simulated broker received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    /// Capacity fetch.
    FetchCapacity,
    /// Order submission.
    Submit(OrderId),
}

/// An order the simulated broker accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedFill {
    /// Broker order ID.
    pub broker_order_id: BrokerId,
    /// Client order ID.
    pub client_order_id: OrderId,
    /// Symbol.
    pub symbol: Symbol,
    /// Buying power charged.
    pub cost: Money,
}

#[derive(Debug, Default)]
struct Ledger {
    available: Money,
    prices: HashMap<Symbol, Decimal>,
    fills: Vec<SimulatedFill>,
    client_order_ids: HashSet<OrderId>,
    calls: Vec<BrokerCall>,
    oracle_calls: usize,
    fail_oracle_from: Option<usize>,
    pending_drain: Option<Money>,
    rejected_symbols: HashMap<Symbol, String>,
    unreachable_symbols: HashSet<Symbol>,
}

/// In-process broker with a shared capacity ledger.
pub struct SimulatedBroker {
    ledger: Mutex<Ledger>,
    clock: Arc<dyn ClockPort>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    overlapped: AtomicBool,
}

impl SimulatedBroker {
    /// Create a broker holding `starting_capacity` of buying power.
    #[must_use]
    pub fn new(starting_capacity: Money) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                available: starting_capacity,
                ..Ledger::default()
            }),
            clock: Arc::new(SystemClock),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
        }
    }

    /// Hold every submission open for `latency` before answering.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Stamp capacity snapshots with `clock` instead of the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn ClockPort>) -> Self {
        self.clock = clock;
        self
    }

    /// Reference price for pricing orders that carry no limit or stop price.
    #[must_use]
    pub fn with_price(self, symbol: impl Into<Symbol>, price: Decimal) -> Self {
        self.ledger.lock().prices.insert(symbol.into(), price);
        self
    }

    /// Drain `amount` just before the next submission is evaluated, after
    /// the caller's capacity check has already passed.
    pub fn drain_before_next_submission(&self, amount: Money) {
        self.ledger.lock().pending_drain = Some(amount);
    }

    /// Make the `call`-th capacity fetch (1-based) and every later one fail.
    pub fn fail_oracle_from_call(&self, call: usize) {
        self.ledger.lock().fail_oracle_from = Some(call);
    }

    /// Reject every order for `symbol` with `reason`.
    pub fn reject_symbol(&self, symbol: impl Into<Symbol>, reason: impl Into<String>) {
        self.ledger
            .lock()
            .rejected_symbols
            .insert(symbol.into(), reason.into());
    }

    /// Fail every submission for `symbol` with a transport error.
    pub fn drop_submissions_for(&self, symbol: impl Into<Symbol>) {
        self.ledger.lock().unreachable_symbols.insert(symbol.into());
    }

    /// Capacity currently available.
    pub fn available(&self) -> Money {
        self.ledger.lock().available
    }

    /// Accepted orders, in acceptance order.
    pub fn fills(&self) -> Vec<SimulatedFill> {
        self.ledger.lock().fills.clone()
    }

    /// Every call received, in arrival order.
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.ledger.lock().calls.clone()
    }

    /// Number of capacity fetches received.
    pub fn oracle_calls(&self) -> usize {
        self.ledger.lock().oracle_calls
    }

    /// Most submissions ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Returns true if two submissions were ever in flight together.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    /// Buying power the order consumes, or the rejection reason.
    fn price_order(ledger: &Ledger, request: &SubmitOrderRequest) -> Result<Money, String> {
        let order = &request.order;
        let price = order
            .limit_price
            .or(order.stop_price)
            .or_else(|| ledger.prices.get(&request.symbol).copied())
            .ok_or_else(|| format!("no reference price for {}", request.symbol))?;
        Money::checked_cost(order.quantity, price)
            .ok_or_else(|| "order cost overflows".to_string())
    }

    fn decide(&self, request: &SubmitOrderRequest) -> Result<SubmissionResponse, GatewayError> {
        let mut ledger = self.ledger.lock();

        if let Some(amount) = ledger.pending_drain.take() {
            ledger.available = ledger.available.saturating_sub(amount);
        }

        if ledger.unreachable_symbols.contains(&request.symbol) {
            return Err(GatewayError::Transport {
                message: format!("connection reset submitting {}", request.symbol),
            });
        }
        if let Some(reason) = ledger.rejected_symbols.get(&request.symbol) {
            return Ok(SubmissionResponse::Rejected {
                reason: reason.clone(),
            });
        }
        if ledger.client_order_ids.contains(&request.client_order_id) {
            return Ok(SubmissionResponse::Rejected {
                reason: "client_order_id must be unique".to_string(),
            });
        }

        let cost = match Self::price_order(&ledger, request) {
            Ok(cost) => cost,
            Err(reason) => return Ok(SubmissionResponse::Rejected { reason }),
        };
        if cost > ledger.available {
            return Ok(SubmissionResponse::RejectedForCapacity {
                reason: format!(
                    "insufficient buying power: order costs {cost}, {} available",
                    ledger.available
                ),
            });
        }

        ledger.available = ledger.available.saturating_sub(cost);
        ledger.client_order_ids.insert(request.client_order_id.clone());
        let broker_order_id = BrokerId::new(format!("sim-{}", ledger.fills.len() + 1));
        ledger.fills.push(SimulatedFill {
            broker_order_id: broker_order_id.clone(),
            client_order_id: request.client_order_id.clone(),
            symbol: request.symbol.clone(),
            cost,
        });

        Ok(SubmissionResponse::Accepted(OrderReceipt {
            broker_order_id,
            client_order_id: request.client_order_id.clone(),
            status: "accepted".to_string(),
        }))
    }
}

impl fmt::Debug for SimulatedBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedBroker")
            .field("ledger", &self.ledger)
            .field("latency", &self.latency)
            .field("max_in_flight", &self.max_in_flight)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CapacityOraclePort for SimulatedBroker {
    async fn fetch_capacity(&self) -> Result<CapacitySnapshot, OracleError> {
        let mut ledger = self.ledger.lock();
        ledger.calls.push(BrokerCall::FetchCapacity);
        ledger.oracle_calls += 1;

        let call = ledger.oracle_calls;
        if ledger.fail_oracle_from.is_some_and(|from| call >= from) {
            return Err(OracleError::Transport {
                message: format!("simulated oracle outage on call {call}"),
            });
        }

        Ok(CapacitySnapshot::new(ledger.available, self.clock.now()))
    }
}

#[async_trait]
impl OrderGatewayPort for SimulatedBroker {
    async fn submit_order(
        &self,
        request: SubmitOrderRequest,
    ) -> Result<SubmissionResponse, GatewayError> {
        self.ledger
            .lock()
            .calls
            .push(BrokerCall::Submit(request.client_order_id.clone()));

        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);
        if concurrent > 1 {
            self.overlapped.store(true, Ordering::SeqCst);
            tracing::error!(concurrent, "Overlapping order submissions detected");
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let response = self.decide(&request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
