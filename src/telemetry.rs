//! Tracing subscriber setup
//!
//! Logs go to stdout in `pretty` or `json` form. When an OTLP endpoint is
//! configured every `tracing` span is also exported over OTLP/HTTP; the
//! returned [`SdkTracerProvider`] must be shut down on exit to flush
//! pending spans.

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Filter directive used when `RUST_LOG` is not set
#[must_use]
pub fn default_directive(level: &str, verbose: bool) -> String {
    let level = if verbose { "debug" } else { level };
    format!("{level},hyper=warn,h2=warn,reqwest=warn")
}

fn build_tracer_provider(
    endpoint: &str,
    service_name: &str,
) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attribute(KeyValue::new(SERVICE_VERSION, crate::VERSION))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Install the global subscriber
pub fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Option<SdkTracerProvider> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&logging.level, verbose)));

    let json = logging.format == "json";
    let json_layer = json.then(|| fmt::layer().json());
    let pretty_layer = (!json).then(|| fmt::layer().pretty());

    let tracer_provider = logging.otlp_endpoint.as_deref().and_then(|endpoint| {
        match build_tracer_provider(endpoint, &logging.service_name) {
            Ok(provider) => Some(provider),
            Err(e) => {
                eprintln!(
                    "WARNING: failed to create OTLP exporter for {endpoint}: {e}, \
                     starting without OpenTelemetry"
                );
                None
            }
        }
    });
    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(logging.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(otel_layer)
        .init();

    tracer_provider
}

/// Flush and stop span export
pub fn shutdown(tracer_provider: Option<SdkTracerProvider>) {
    if let Some(provider) = tracer_provider
        && let Err(e) = provider.shutdown()
    {
        eprintln!("WARNING: failed to flush spans: {e}");
    }
}
