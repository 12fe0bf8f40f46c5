use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref ALERTS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "alert_relay_alerts_received_total",
        "Alerts received from Alertmanager, by status.",
        &["status"]
    )
    .unwrap();
    pub static ref DELIVERY_ATTEMPTS_TOTAL: IntCounter = register_int_counter!(
        "alert_relay_delivery_attempts_total",
        "Webhook delivery attempts, including retries."
    )
    .unwrap();
    pub static ref CARDS_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        "alert_relay_cards_delivered_total",
        "Cards accepted by the chat webhook."
    )
    .unwrap();
    pub static ref DELIVERY_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "alert_relay_delivery_failures_total",
        "Status groups that could not be delivered, by failing stage.",
        &["stage"]
    )
    .unwrap();
}

// Touch every metric so it shows up in the exposition before its first event.
pub fn register_metrics() {
    lazy_static::initialize(&ALERTS_RECEIVED_TOTAL);
    lazy_static::initialize(&DELIVERY_ATTEMPTS_TOTAL);
    lazy_static::initialize(&CARDS_DELIVERED_TOTAL);
    lazy_static::initialize(&DELIVERY_FAILURES_TOTAL);
}

// Gather metrics from the default registry for exposition
pub fn gather_metrics() -> crate::Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| crate::Error::Validation(format!("metrics are not valid UTF-8: {}", e)))
}
