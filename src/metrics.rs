//! Prometheus metrics for relayd.
//!
//! All metrics live in a process-wide registry and are exposed in text
//! format on the HTTP listener's `/metrics` route. Recording before
//! [`init`] is a silent no-op, which keeps unit tests free of setup.
//!
//! - `relay_connected_sessions` - live sessions in the registry (gauge)
//! - `relay_frames_received_total{kind}` - inbound frames by decoded kind
//! - `relay_messages_sent_total` - frames written to a transport
//! - `relay_messages_dropped_total{reason}` - outbound frames that could not be queued
//! - `relay_dispatch_errors_total{error}` - dispatch failures by error code
//! - `relay_auth_failures_total` - rejected connection attempts
//! - `relay_send_queue_capacity` - configured per-session queue bound (gauge)
//! - `relay_dispatch_duration_seconds{kind}` - dispatch latency

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters
// ========================================================================

/// Frames written to client transports.
pub static MESSAGES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Outbound frames dropped before reaching a queue.
pub static MESSAGES_DROPPED: OnceLock<IntCounterVec> = OnceLock::new();

/// Inbound frames by kind (`invalid` for undecodable frames).
pub static FRAMES_RECEIVED: OnceLock<IntCounterVec> = OnceLock::new();

/// Dispatch failures by error code.
pub static DISPATCH_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Rejected logins.
pub static AUTH_FAILURES: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges
// ========================================================================

pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

pub static SEND_QUEUE_CAPACITY: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

pub static DISPATCH_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Repeated calls are harmless.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(MESSAGES_SENT, IntCounter::new("relay_messages_sent_total", "Frames written to client transports"));
    register!(MESSAGES_DROPPED, IntCounterVec::new(Opts::new("relay_messages_dropped_total", "Outbound frames dropped before queueing"), &["reason"]));
    register!(FRAMES_RECEIVED, IntCounterVec::new(Opts::new("relay_frames_received_total", "Inbound frames by kind"), &["kind"]));
    register!(DISPATCH_ERRORS, IntCounterVec::new(Opts::new("relay_dispatch_errors_total", "Dispatch failures by error code"), &["error"]));
    register!(AUTH_FAILURES, IntCounter::new("relay_auth_failures_total", "Rejected connection attempts"));
    register!(CONNECTED_SESSIONS, IntGauge::new("relay_connected_sessions", "Live sessions"));
    register!(SEND_QUEUE_CAPACITY, IntGauge::new("relay_send_queue_capacity", "Per-session outbound queue capacity"));
    register!(DISPATCH_LATENCY, HistogramVec::new(
        HistogramOpts::new("relay_dispatch_duration_seconds", "Dispatch latency by message kind")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

#[inline]
pub fn record_sent() {
    if let Some(c) = MESSAGES_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn record_dropped(reason: &str) {
    if let Some(c) = MESSAGES_DROPPED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_frame(kind: &str) {
    if let Some(c) = FRAMES_RECEIVED.get() {
        c.with_label_values(&[kind]).inc();
    }
}

/// Record a completed dispatch with its latency.
#[inline]
pub fn record_dispatch(kind: &str, duration_secs: f64) {
    if let Some(h) = DISPATCH_LATENCY.get() {
        h.with_label_values(&[kind]).observe(duration_secs);
    }
}

#[inline]
pub fn record_dispatch_error(error: &str) {
    if let Some(c) = DISPATCH_ERRORS.get() {
        c.with_label_values(&[error]).inc();
    }
}

#[inline]
pub fn record_auth_failure() {
    if let Some(c) = AUTH_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn set_connected_sessions(count: usize) {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn set_send_queue_capacity(capacity: usize) {
    if let Some(g) = SEND_QUEUE_CAPACITY.get() {
        g.set(capacity as i64);
    }
}
