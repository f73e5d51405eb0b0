use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;
use std::time::Instant;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static RECORD_WRITES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PAYMENTS_RECORDED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static STORE_OPERATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    let registry = Registry::new();

    // Writes by record type and resulting status
    let writes_counter = IntCounterVec::new(
        Opts::new(
            "backoffice_record_writes_total",
            "Total record writes by record type, operation and resulting status",
        ),
        &["record", "operation", "status"],
    )
    .expect("Failed to create backoffice_record_writes_total metric");

    let payments_counter = IntCounterVec::new(
        Opts::new(
            "backoffice_payments_recorded_total",
            "Total payments recorded by record type and method",
        ),
        &["record", "method"],
    )
    .expect("Failed to create backoffice_payments_recorded_total metric");

    let store_histogram = HistogramVec::new(
        HistogramOpts::new(
            "backoffice_store_operation_seconds",
            "Record store operation latency in seconds",
        ),
        &["operation"],
    )
    .expect("Failed to create backoffice_store_operation_seconds metric");

    registry
        .register(Box::new(writes_counter.clone()))
        .expect("Failed to register backoffice_record_writes_total");
    registry
        .register(Box::new(payments_counter.clone()))
        .expect("Failed to register backoffice_payments_recorded_total");
    registry
        .register(Box::new(store_histogram.clone()))
        .expect("Failed to register backoffice_store_operation_seconds");

    PROMETHEUS_REGISTRY
        .set(registry)
        .expect("Failed to set prometheus registry");
    RECORD_WRITES_TOTAL
        .set(writes_counter)
        .expect("Failed to set backoffice_record_writes_total");
    PAYMENTS_RECORDED_TOTAL
        .set(payments_counter)
        .expect("Failed to set backoffice_payments_recorded_total");
    STORE_OPERATION_SECONDS
        .set(store_histogram)
        .expect("Failed to set backoffice_store_operation_seconds");
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record a create/update/cancel write and the status the record ended in.
pub fn record_write(record: &str, operation: &str, status: &str) {
    if let Some(counter) = RECORD_WRITES_TOTAL.get() {
        counter
            .with_label_values(&[record, operation, status])
            .inc();
    }
}

pub fn record_payment(record: &str, method: &str) {
    if let Some(counter) = PAYMENTS_RECORDED_TOTAL.get() {
        counter.with_label_values(&[record, method]).inc();
    }
}

pub fn observe_store_operation(operation: &str, start: Instant) {
    if let Some(histogram) = STORE_OPERATION_SECONDS.get() {
        histogram
            .with_label_values(&[operation])
            .observe(start.elapsed().as_secs_f64());
    }
}
