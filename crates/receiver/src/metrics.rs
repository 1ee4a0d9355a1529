use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref RECEIVED_WEBHOOKS: IntCounterVec = register_int_counter_vec!(
        "github_receiver_received_webhooks_total",
        "Webhook messages decoded, by aggregate status.",
        &["status"]
    )
    .unwrap();
    pub static ref CREATED_ISSUES: IntCounter = register_int_counter!(
        "github_receiver_created_issues_total",
        "Issues created for firing alerts."
    )
    .unwrap();
    pub static ref CLOSED_ISSUES: IntCounter = register_int_counter!(
        "github_receiver_closed_issues_total",
        "Issues closed for resolved alerts."
    )
    .unwrap();
}

// Encode the default registry for the /metrics endpoint.
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}
