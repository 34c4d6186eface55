//! Prometheus metrics collection for amityd.
//!
//! Tracks the social-graph and presence hot paths: connected users, active
//! typing indicators, friend-request transitions, fan-out width, and
//! delivery failures.

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
    Encoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Currently connected users.
pub static CONNECTED_USERS: OnceLock<IntGauge> = OnceLock::new();

/// Currently active typing indicators.
pub static TYPING_ACTIVE: OnceLock<IntGauge> = OnceLock::new();

/// Friend-request transitions by action (sent, accepted, rejected, cancelled).
pub static FRIEND_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Presence events fanned out, by status.
pub static PRESENCE_EVENTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Recipients per presence fan-out.
pub static FANOUT_RECIPIENTS: OnceLock<Histogram> = OnceLock::new();

/// Deliveries dropped (no mailbox or mailbox closed).
pub static DELIVERY_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        CONNECTED_USERS,
        IntGauge::new("amity_connected_users", "Currently connected users")
    );
    register!(
        TYPING_ACTIVE,
        IntGauge::new("amity_typing_active", "Currently active typing indicators")
    );
    register!(
        FRIEND_REQUESTS,
        IntCounterVec::new(
            Opts::new("amity_friend_requests_total", "Friend-request transitions"),
            &["action"]
        )
    );
    register!(
        PRESENCE_EVENTS,
        IntCounterVec::new(
            Opts::new("amity_presence_events_total", "Presence events fanned out"),
            &["status"]
        )
    );
    register!(
        FANOUT_RECIPIENTS,
        Histogram::with_opts(
            HistogramOpts::new("amity_fanout_recipients", "Recipients per presence fan-out")
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0])
        )
    );
    register!(
        DELIVERY_FAILURES,
        IntCounter::new("amity_delivery_failures_total", "Deliveries dropped")
    );
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
// Helper functions for metric updates (no-ops before init)
// ============================================================================

pub fn set_connected_users(count: i64) {
    if let Some(gauge) = CONNECTED_USERS.get() {
        gauge.set(count);
    }
}

pub fn set_typing_active(count: i64) {
    if let Some(gauge) = TYPING_ACTIVE.get() {
        gauge.set(count);
    }
}

pub fn inc_friend_request(action: &str) {
    if let Some(counter) = FRIEND_REQUESTS.get() {
        counter.with_label_values(&[action]).inc();
    }
}

pub fn inc_presence_event(status: &str) {
    if let Some(counter) = PRESENCE_EVENTS.get() {
        counter.with_label_values(&[status]).inc();
    }
}

pub fn observe_fanout(recipients: usize) {
    if let Some(histogram) = FANOUT_RECIPIENTS.get() {
        histogram.observe(recipients as f64);
    }
}

pub fn inc_delivery_failures() {
    if let Some(counter) = DELIVERY_FAILURES.get() {
        counter.inc();
    }
}
