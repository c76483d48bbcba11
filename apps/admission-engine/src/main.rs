//! Admission Engine Binary
//!
//! Runs one admission cycle over a candidate batch and prints the cycle
//! record as JSON on stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin admission-engine -- batch.json
//! ```
//!
//! # Environment Variables
//!
//! - `ADMISSION_CONFIG`: Config file path (default: config.yaml)
//! - `ADMISSION_BATCH`: Batch file path (overrides the first argument; `-` reads stdin)
//! - `ALPACA_KEY` / `ALPACA_SECRET`: Broker credentials, usually interpolated by config.yaml
//! - `RUST_LOG`: Log filter (default: `observability.logging.level`)
//!
//! Exit status is 0 for a completed or cancelled cycle and non-zero when the
//! cycle was degraded or could not run (see `admission_engine::error`).

use std::future::Future;
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use admission_engine::application::dto::{BatchRequestDto, CycleRecord};
use admission_engine::application::ports::{CapacityOraclePort, OrderGatewayPort};
use admission_engine::application::use_cases::{AdmissionController, ReportCycleUseCase};
use admission_engine::config::{Config, TradingMode, load_config, validate_startup_environment};
use admission_engine::domain::admission::CandidateBatch;
use admission_engine::domain::shared::{CycleId, Money};
use admission_engine::error::{EngineError, ErrorCode};
use admission_engine::infrastructure::broker::{
    AlpacaBrokerAdapter, AlpacaEnvironment, SimulatedBroker,
};
use admission_engine::infrastructure::reporting::TracingReportSink;
use admission_engine::observability::init_metrics;
use admission_engine::telemetry::init_telemetry;
use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Default config path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();

    let config_path =
        std::env::var("ADMISSION_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = match load_config(Some(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            let _telemetry = init_telemetry(&Config::default().observability.logging);
            let err = EngineError::from(e).with_context("path", &config_path);
            tracing::error!(code = %err.code(), error = %err, "Failed to load configuration");
            return ExitCode::from(err.exit_code());
        }
    };

    let _telemetry = init_telemetry(&config.observability.logging);

    match run(&config).await {
        Ok(record) => {
            tracing::info!(
                cycle_id = %record.cycle_id,
                status = %record.status,
                committed = record.committed,
                "Admission engine finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let (code, exit) = e
                .downcast_ref::<EngineError>()
                .map_or((ErrorCode::InternalError, ErrorCode::InternalError.exit_code()), |err| {
                    (err.code(), err.exit_code())
                });
            tracing::error!(code = %code, error = format!("{e:#}"), "Admission engine failed");
            ExitCode::from(exit)
        }
    }
}

/// Validate the environment, build the broker and run one cycle.
async fn run(config: &Config) -> anyhow::Result<CycleRecord> {
    let validation = validate_startup_environment(config).map_err(EngineError::from)?;
    for warning in &validation.warnings {
        tracing::warn!(warning = %warning, "Startup validation warning");
    }

    if config.observability.metrics.enabled {
        let metrics = config
            .observability
            .metrics
            .to_metrics_config()
            .map_err(EngineError::from)?;
        init_metrics(&metrics).map_err(EngineError::from)?;
    }

    let batch = read_batch()?;
    let cycle_id = batch.cycle_id();
    let candidates = batch.to_batch();

    tracing::info!(
        mode = %validation.mode,
        cycle_id = %cycle_id,
        candidates = candidates.len(),
        total_required = %candidates.total_required(),
        "Configuration loaded"
    );

    match validation.mode {
        TradingMode::Simulated => {
            let broker = Arc::new(SimulatedBroker::new(Money::new(
                config.broker.simulated.starting_capacity,
            )));
            tracing::info!(
                starting_capacity = %broker.available(),
                "SimulatedBroker initialized"
            );
            run_cycle(config, broker, cycle_id, &candidates).await
        }
        TradingMode::Paper | TradingMode::Live => {
            let environment = if validation.mode == TradingMode::Live {
                AlpacaEnvironment::Live
            } else {
                AlpacaEnvironment::Paper
            };
            let adapter = AlpacaBrokerAdapter::new(
                config.broker.alpaca.to_adapter_config(environment),
            )
            .map_err(EngineError::from)?;

            if adapter.is_live() {
                tracing::warn!("LIVE trading enabled - orders will execute with real money");
            }
            tracing::info!(
                environment = %environment,
                "AlpacaBrokerAdapter initialized for {} trading",
                environment
            );
            run_cycle(config, Arc::new(adapter), cycle_id, &candidates).await
        }
    }
}

/// Run the cycle against `broker`, report it and print the cycle record.
async fn run_cycle<B>(
    config: &Config,
    broker: Arc<B>,
    cycle_id: CycleId,
    batch: &CandidateBatch,
) -> anyhow::Result<CycleRecord>
where
    B: CapacityOraclePort + OrderGatewayPort,
{
    let controller =
        AdmissionController::new(Arc::clone(&broker), broker, config.admission.policy());

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on(
        cancel.clone(),
        shutdown_signal(),
        config.admission.deadline(),
    ));

    let summary = controller.run_cycle(cycle_id, batch, &cancel).await;
    watcher.abort();

    let reporter = ReportCycleUseCase::new(Arc::new(TracingReportSink::new()));
    let record = reporter
        .execute(&summary)
        .await
        .map_err(EngineError::from)?;

    let json = serde_json::to_string_pretty(&record).context("serializing cycle record")?;
    println!("{json}");

    if record.degraded {
        return Err(EngineError::cycle_degraded(
            &record.cycle_id,
            record
                .status_message
                .clone()
                .unwrap_or_else(|| "capacity oracle unavailable".to_string()),
        )
        .into());
    }

    Ok(record)
}

/// Read the batch from `ADMISSION_BATCH`, the first argument, or stdin.
fn read_batch() -> anyhow::Result<BatchRequestDto> {
    let source = std::env::var("ADMISSION_BATCH")
        .ok()
        .or_else(|| std::env::args().nth(1))
        .unwrap_or_else(|| "-".to_string());

    let json = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| EngineError::invalid_batch("stdin", e.to_string()))?;
        buf
    } else {
        std::fs::read_to_string(&source)
            .map_err(|e| EngineError::invalid_batch(&source, e.to_string()))?
    };

    let batch = BatchRequestDto::from_json(&json)
        .map_err(|e| EngineError::invalid_batch(&source, e.to_string()))?;
    Ok(batch)
}

/// Cancel `token` when `shutdown` resolves or `deadline` elapses.
async fn cancel_on(
    token: CancellationToken,
    shutdown: impl Future<Output = ()>,
    deadline: Option<Duration>,
) {
    let deadline = async {
        match deadline {
            Some(after) => tokio::time::sleep(after).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = shutdown => {
            tracing::warn!("Shutdown requested, finishing the in-flight candidate");
        }
        () = deadline => {
            tracing::warn!("Cycle deadline reached, finishing the in-flight candidate");
        }
    }

    token.cancel();
}

/// Wait for Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
