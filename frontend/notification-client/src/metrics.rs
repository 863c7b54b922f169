use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};

static NOTIFICATIONS_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_client_notifications_received_total",
            "Notifications handed to the dispatcher, by delivery channel",
        ),
        &["channel"],
    )
    .expect("failed to create notification_client_notifications_received_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_client_notifications_received_total");
    counter
});

static RECONNECT_ATTEMPTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "notification_client_reconnect_attempts_total",
        "Reconnect attempts scheduled by the transport client",
    )
    .expect("failed to create notification_client_reconnect_attempts_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_client_reconnect_attempts_total");
    counter
});

static TRANSPORT_GIVE_UPS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "notification_client_transport_give_ups_total",
        "Times the transport client exhausted its reconnect attempts",
    )
    .expect("failed to create notification_client_transport_give_ups_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_client_transport_give_ups_total");
    counter
});

static LISTENER_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_client_listener_failures_total",
            "Listener callbacks that returned an error or panicked",
        ),
        &["event"],
    )
    .expect("failed to create notification_client_listener_failures_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_client_listener_failures_total");
    counter
});

static PLATFORM_NOTIFICATIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "notification_client_platform_notifications_total",
        "Platform notifications rendered by the dispatcher",
    )
    .expect("failed to create notification_client_platform_notifications_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_client_platform_notifications_total");
    counter
});

pub fn record_notification(channel: &str) {
    NOTIFICATIONS_RECEIVED_TOTAL
        .with_label_values(&[channel])
        .inc();
}

pub fn record_reconnect_attempt() {
    RECONNECT_ATTEMPTS_TOTAL.inc();
}

pub fn record_give_up() {
    TRANSPORT_GIVE_UPS_TOTAL.inc();
}

pub fn record_listener_failure(event: &str) {
    LISTENER_FAILURES_TOTAL.with_label_values(&[event]).inc();
}

pub fn record_platform_notification() {
    PLATFORM_NOTIFICATIONS_TOTAL.inc();
}

/// Render the default registry in the text exposition format
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", err);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_exported() {
        record_notification("socket");
        record_reconnect_attempt();

        let text = gather_text();
        assert!(text.contains("notification_client_notifications_received_total"));
        assert!(text.contains("notification_client_reconnect_attempts_total"));
    }
}
