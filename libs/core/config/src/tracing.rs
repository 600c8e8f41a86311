use crate::{env_optional, Environment};
use tracing::{debug, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Collector base URL. Spans are exported only when this is set.
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Default filter in production when `RUST_LOG` is unset
const PRODUCTION_FILTER: &str = "info,tower_http=info,sea_orm=warn,sqlx=warn";

/// Default filter in development when `RUST_LOG` is unset
const DEVELOPMENT_FILTER: &str = "debug,hyper=info,h2=info,sqlx=info";

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production** (`APP_ENV=production`): flattened JSON lines without
///   module targets, for log aggregation.
/// - **Development** (default): pretty, human-readable output.
///
/// Both include `tracing_error::ErrorLayer` so eyre reports carry span traces.
/// `RUST_LOG` overrides the default filter. Calling this more than once is a
/// no-op after the first successful call.
///
/// With the `opentelemetry` feature and `OTEL_EXPORTER_OTLP_ENDPOINT` set,
/// spans are also exported over OTLP/HTTP under `service_name`. Call
/// [`shutdown_tracing`] before exit to flush them.
pub fn init_tracing(environment: &Environment, service_name: &str) {
    let is_production = environment.is_production();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if is_production {
            PRODUCTION_FILTER
        } else {
            DEVELOPMENT_FILTER
        })
    });

    let (otlp, otlp_error) = match otlp_layer(service_name) {
        Ok(layer) => (layer, None),
        Err(e) => (None, Some(e)),
    };
    let exporting = otlp.is_some();

    let result = if is_production {
        tracing_subscriber::registry()
            .with(otlp)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(otlp)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(
            environment = ?environment,
            service = service_name,
            otlp = exporting,
            "Tracing initialized"
        ),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
    if let Some(error) = otlp_error {
        warn!(error = %error, "OTLP span export disabled");
    }
}

/// OTLP endpoint from the environment, blank treated as unset.
pub fn otlp_endpoint() -> Option<String> {
    env_optional(OTLP_ENDPOINT_VAR)
}

#[cfg(feature = "opentelemetry")]
mod otlp {
    use super::otlp_endpoint;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::SpanExporter;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::trace::{SdkTracerProvider, Tracer};
    use opentelemetry_sdk::Resource;
    use std::sync::OnceLock;
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::Registry;

    pub type OtlpLayer = OpenTelemetryLayer<Registry, Tracer>;

    static PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

    pub fn layer(service_name: &str) -> Result<Option<OtlpLayer>, String> {
        let Some(endpoint) = otlp_endpoint() else {
            return Ok(None);
        };

        // The exporter reads the endpoint itself and appends `/v1/traces`.
        let exporter = SpanExporter::builder()
            .with_http()
            .build()
            .map_err(|e| format!("{}: {}", endpoint, e))?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(
                Resource::builder()
                    .with_service_name(service_name.to_string())
                    .build(),
            )
            .build();
        let tracer = provider.tracer(service_name.to_string());

        opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
        opentelemetry::global::set_tracer_provider(provider.clone());
        // A second init keeps the first provider; its layer is never installed.
        let _ = PROVIDER.set(provider);

        Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer)))
    }

    pub fn shutdown() {
        if let Some(provider) = PROVIDER.get() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to flush OTLP spans");
            }
        }
    }
}

#[cfg(feature = "opentelemetry")]
use otlp::OtlpLayer;

#[cfg(not(feature = "opentelemetry"))]
type OtlpLayer = tracing_subscriber::layer::Identity;

#[cfg(feature = "opentelemetry")]
fn otlp_layer(service_name: &str) -> Result<Option<OtlpLayer>, String> {
    otlp::layer(service_name)
}

#[cfg(not(feature = "opentelemetry"))]
fn otlp_layer(_service_name: &str) -> Result<Option<OtlpLayer>, String> {
    match otlp_endpoint() {
        Some(endpoint) => Err(format!(
            "{} is set to {} but the opentelemetry feature is off",
            OTLP_ENDPOINT_VAR, endpoint
        )),
        None => Ok(None),
    }
}

/// Flush and stop span export. A no-op when nothing is exported.
pub fn shutdown_tracing() {
    #[cfg(feature = "opentelemetry")]
    otlp::shutdown();
}
