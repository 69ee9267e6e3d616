//! Logging and optional `OpenTelemetry` trace export.
//!
//! [`Telemetry`] installs a `tracing` subscriber writing to stderr. With the
//! `telemetry` feature and `OTEL_EXPORTER_OTLP_*` variables set, spans are
//! also exported over OTLP.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "telemetry")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "telemetry")]
use opentelemetry::{KeyValue, Value};
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
#[cfg(feature = "telemetry")]
use opentelemetry_semantic_conventions::{SCHEMA_URL, attribute::SERVICE_VERSION};
#[cfg(feature = "telemetry")]
use tracing_opentelemetry::OpenTelemetryLayer;

/// Supported OTLP transport protocols.
#[cfg(feature = "telemetry")]
#[derive(Debug, Clone, Copy)]
enum OtlpProtocol {
    Http,
    Grpc,
}

/// Detects OTLP protocol from environment. Returns `None` if OTEL is not configured.
#[cfg(feature = "telemetry")]
fn detect_protocol() -> Option<OtlpProtocol> {
    use std::env;

    let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
        || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
        || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
    is_enabled.then(|| match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
        Ok("grpc") => OtlpProtocol::Grpc,
        _ => OtlpProtocol::Http,
    })
}

/// Service identity and log level for the subscriber.
#[derive(Debug, Default)]
#[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
pub struct Telemetry {
    name: Option<String>,
    version: Option<String>,
    log_level: Option<String>,
}

impl Telemetry {
    /// Creates a new, empty [`Telemetry`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name reported to OTLP.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the service version reported to OTLP.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the log level filter used when `RUST_LOG` is not set.
    ///
    /// Accepts any valid [`EnvFilter`] directive string (e.g. `"debug"`,
    /// `"wallet_reader=trace"`).
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Builds an `OpenTelemetry` [`Resource`] from the service identity.
    #[cfg(feature = "telemetry")]
    fn resource(&self) -> Resource {
        let name = std::env::var("OTEL_SERVICE_NAME").ok().or_else(|| self.name.clone());
        let mut builder = Resource::builder();
        if let Some(name) = name {
            builder = builder.with_service_name(name);
        }
        if let Some(version) = &self.version {
            builder = builder.with_schema_url(
                [KeyValue::new(SERVICE_VERSION, Value::from(version.clone()))],
                SCHEMA_URL,
            );
        }
        builder.build()
    }

    /// Initializes the tracer provider.
    #[cfg(feature = "telemetry")]
    fn init_tracer(&self, protocol: OtlpProtocol) -> Option<SdkTracerProvider> {
        let exporter = match protocol {
            OtlpProtocol::Http => opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .build(),
            OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .build(),
        };
        let exporter = exporter.ok()?;

        Some(
            SdkTracerProvider::builder()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(self.resource())
                .with_batch_exporter(exporter)
                .build(),
        )
    }

    /// Installs the global subscriber.
    ///
    /// Returns [`TelemetryGuard`] that flushes exporters on drop.
    pub fn register(self) -> TelemetryGuard {
        let fallback = self.log_level.as_deref().unwrap_or("info");
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        #[cfg(feature = "telemetry")]
        {
            let protocol = detect_protocol();
            let tracer_provider = protocol.and_then(|p| self.init_tracer(p));
            let otel_layer = tracer_provider
                .as_ref()
                .map(|tp| OpenTelemetryLayer::new(tp.tracer("wallet-reader")));

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(otel_layer)
                .init();

            if tracer_provider.is_some() {
                tracing::debug!("OpenTelemetry span export enabled");
            }
            TelemetryGuard { tracer_provider }
        }

        #[cfg(not(feature = "telemetry"))]
        {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
            TelemetryGuard {}
        }
    }
}

/// Owns the tracer provider; performs graceful shutdown on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(ref tp) = self.tracer_provider
            && let Err(err) = tp.shutdown()
        {
            tracing::error!(?err, "tracer provider shutdown error");
        }
    }
}
