//! `OpenTelemetry` export of the gate's query counters.
//!
//! This module is only compiled when the `metrics` Cargo feature is enabled.
//! Instruments are created once per process, on first use; every
//! [`OtelObserver`] records into them with its own `server` label.

use dissident_engine::QueryObserver;
use opentelemetry::metrics::Counter;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use std::sync::OnceLock;

static INSTRUMENTS: OnceLock<Instruments> = OnceLock::new();

struct Instruments {
    requests: Counter<u64>,
    allowed: Counter<u64>,
    blocked: Counter<u64>,
}

fn instruments() -> &'static Instruments {
    INSTRUMENTS.get_or_init(|| {
        let meter = global::meter("dissident");
        Instruments {
            requests: meter
                .u64_counter("dissident_request_count_total")
                .with_description("Counter of requests seen by the grant gate.")
                .build(),
            allowed: meter
                .u64_counter("dissident_allowed_queries_total")
                .with_description("Counter of allowed queries.")
                .build(),
            blocked: meter
                .u64_counter("dissident_blocked_queries_total")
                .with_description("Counter of blocked queries.")
                .build(),
        }
    })
}

/// Records query outcomes as `OpenTelemetry` counters.
pub struct OtelObserver {
    labels: [KeyValue; 1],
}

impl OtelObserver {
    /// Observer labelled with `server`.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            labels: [KeyValue::new("server", server.into())],
        }
    }
}

impl QueryObserver for OtelObserver {
    fn request_seen(&self) {
        instruments().requests.add(1, &self.labels);
    }

    fn allowed(&self) {
        instruments().allowed.add(1, &self.labels);
    }

    fn blocked(&self) {
        instruments().blocked.add(1, &self.labels);
    }
}

/// Errors that can occur during metrics pipeline initialisation.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to build an OTLP exporter.
    #[error("failed to build OTLP exporter: {0}")]
    ExporterBuild(#[from] opentelemetry_otlp::ExporterBuildError),

    /// Failed during `OTel` SDK shutdown or flush.
    #[error("OpenTelemetry SDK error: {0}")]
    Sdk(#[from] opentelemetry_sdk::error::OTelSdkError),
}

/// Keeps the meter provider alive; call [`MetricsGuard::shutdown`] to flush.
pub struct MetricsGuard {
    meter_provider: SdkMeterProvider,
}

impl MetricsGuard {
    /// Flush buffered metrics and stop the exporter.
    pub fn shutdown(self) -> Result<(), MetricsError> {
        self.meter_provider.shutdown()?;
        Ok(())
    }
}

/// Install a global OTLP meter provider sending to `endpoint` (gRPC).
pub fn init_metrics(endpoint: &str) -> Result<MetricsGuard, MetricsError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .build();

    global::set_meter_provider(meter_provider.clone());

    Ok(MetricsGuard { meter_provider })
}
