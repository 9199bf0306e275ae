//! Store call instrumentation.
//!
//! With the `metrics` feature, call counts, durations and errors are recorded
//! through the global OpenTelemetry meter. With the `tracing` feature, every
//! store call runs inside a span (see [`tracing_helpers`]).

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
    KeyValue,
};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<StoreMetrics> = Lazy::new(StoreMetrics::init);

#[cfg(feature = "metrics")]
pub struct StoreMetrics {
    pub calls_total: Counter<u64>,
    pub call_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl StoreMetrics {
    pub fn init() -> Self {
        let meter = global::meter("iblock_models");

        let calls_total = meter
            .u64_counter("iblock_store_calls_total")
            .with_description("Total store calls issued")
            .build();

        let call_duration = meter
            .f64_histogram("iblock_store_call_duration_seconds")
            .with_description("Duration of store calls")
            .build();

        let errors_total = meter
            .u64_counter("iblock_store_errors_total")
            .with_description("Store calls that returned an error")
            .build();

        Self {
            calls_total,
            call_duration,
            errors_total,
        }
    }

    pub fn record_call(&self, operation: &'static str, elapsed: std::time::Duration) {
        let attributes = [KeyValue::new("operation", operation)];
        self.calls_total.add(1, &attributes);
        self.call_duration.record(elapsed.as_secs_f64(), &attributes);
    }

    pub fn record_error(&self, operation: &'static str) {
        self.errors_total.add(1, &[KeyValue::new("operation", operation)]);
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    /// Span covering one store call
    pub fn store_call_span(operation: &'static str) -> tracing::Span {
        tracing::debug_span!("iblock_store.call", operation)
    }
}
