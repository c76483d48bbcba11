//! Tracing and OpenTelemetry setup.
//!
//! Installs the global subscriber: an `EnvFilter`, a fmt layer (JSON or
//! pretty), and optionally an OTLP span exporter.
//!
//! # Configuration
//!
//! - `RUST_LOG`: Filter directives (default: `observability.logging.level`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP gRPC endpoint; spans are exported only when set
//! - `OTEL_ENABLED`: Set to `false` to skip the exporter even with an endpoint
//! - `OTEL_SERVICE_NAME`: Service name for traces (default: `admission-engine`)
//!
//! Logs go to stderr so stdout stays free for the cycle record.
//!
//! # Usage
//!
//! ```rust,ignore
//! use admission_engine::telemetry::init_telemetry;
//!
//! let _guard = init_telemetry(&config.observability.logging);
//! ```

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Guard that shuts down the tracer provider on drop.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Error shutting down tracer provider: {e:?}");
        }
    }
}

fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fmt_layer<S>(logging: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if logging.is_json() {
        layer.json().with_current_span(true).boxed()
    } else {
        layer.pretty().boxed()
    }
}

fn otlp_endpoint() -> Option<String> {
    let disabled = std::env::var("OTEL_ENABLED").is_ok_and(|v| v.eq_ignore_ascii_case("false"));
    if disabled {
        return None;
    }
    std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| !endpoint.trim().is_empty())
}

/// Initialize tracing, with an OTLP exporter when an endpoint is configured.
///
/// Returns a guard that will shut down the tracer provider when dropped.
/// A second call leaves the first subscriber in place.
#[must_use]
pub fn init_telemetry(logging: &LoggingConfig) -> TelemetryGuard {
    let registry = Registry::default()
        .with(env_filter(logging))
        .with(fmt_layer(logging));

    let Some(endpoint) = otlp_endpoint() else {
        if registry.try_init().is_ok() {
            tracing::debug!("OpenTelemetry disabled, using console logging only");
        }
        return TelemetryGuard { provider: None };
    };

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "admission-engine".to_string());

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
    {
        Ok(exp) => exp,
        Err(e) => {
            eprintln!("Failed to create OTLP exporter: {e:?}, falling back to console logging");
            let _ = registry.try_init();
            return TelemetryGuard { provider: None };
        }
    };

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    let tracer = provider.tracer(service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    if registry.with(otel_layer).try_init().is_err() {
        return TelemetryGuard {
            provider: Some(provider),
        };
    }

    tracing::info!(
        service_name = %service_name,
        endpoint = %endpoint,
        "OpenTelemetry initialized"
    );

    TelemetryGuard {
        provider: Some(provider),
    }
}
