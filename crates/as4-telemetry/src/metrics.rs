//! Prometheus metrics for the AS4 exchange.
//!
//! All metrics follow the naming convention: `as4_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every AS4 metric
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OUTBOUND EXCHANGES
    // =========================================================================

    /// Exchanges started by `send`
    pub static ref EXCHANGES_STARTED: Counter = Counter::new(
        "as4_exchanges_started_total",
        "Total outbound exchanges started"
    ).expect("metric creation failed");

    /// Exchange results
    pub static ref EXCHANGE_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("as4_exchange_outcomes_total", "Outbound exchange results"),
        &["outcome"] // see as4_exchange::outcomes
    ).expect("metric creation failed");

    /// End-to-end exchange duration
    pub static ref EXCHANGE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "as4_exchange_duration_seconds",
            "Time from encode to final acknowledgement or failure"
        ).buckets(exponential_buckets(0.005, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // INBOUND TRAFFIC
    // =========================================================================

    /// Acknowledgements handed to the correlation table
    pub static ref NOTIFICATIONS_FULFILLED: CounterVec = CounterVec::new(
        Opts::new("as4_notifications_fulfilled_total", "Acknowledgements delivered to waiters"),
        &["kind"]  // submission, relay
    ).expect("metric creation failed");

    /// Business messages handed to handlers
    pub static ref INBOUND_MESSAGES_DELIVERED: Counter = Counter::new(
        "as4_inbound_messages_delivered_total",
        "Inbound business messages delivered to handlers"
    ).expect("metric creation failed");

    /// Inbound traffic that could not be decoded
    pub static ref DECODE_FAILURES: Counter = Counter::new(
        "as4_decode_failures_total",
        "Inbound transmissions dropped because they could not be decoded"
    ).expect("metric creation failed");

    /// Handler invocations that failed
    pub static ref HANDLER_FAILURES: CounterVec = CounterVec::new(
        Opts::new("as4_handler_failures_total", "Business message handler failures"),
        &["reason"]  // error, panic
    ).expect("metric creation failed");

    // =========================================================================
    // CORRELATION TABLE
    // =========================================================================

    /// Cells removed by the periodic sweep
    pub static ref SWEEP_REMOVALS: CounterVec = CounterVec::new(
        Opts::new("as4_correlation_sweep_removals_total", "Correlation cells removed by the sweep"),
        &["cell"]  // fulfilled, abandoned
    ).expect("metric creation failed");

    /// Live correlation cells after the last sweep
    pub static ref PENDING_CORRELATIONS: Gauge = Gauge::new(
        "as4_correlation_cells",
        "Live correlation cells observed by the last sweep"
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`]. Calling it again is a no-op.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Outbound
        Box::new(EXCHANGES_STARTED.clone()),
        Box::new(EXCHANGE_OUTCOMES.clone()),
        Box::new(EXCHANGE_DURATION.clone()),
        // Inbound
        Box::new(NOTIFICATIONS_FULFILLED.clone()),
        Box::new(INBOUND_MESSAGES_DELIVERED.clone()),
        Box::new(DECODE_FAILURES.clone()),
        Box::new(HANDLER_FAILURES.clone()),
        // Correlation
        Box::new(SWEEP_REMOVALS.clone()),
        Box::new(PENDING_CORRELATIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
