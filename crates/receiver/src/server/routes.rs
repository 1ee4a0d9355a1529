pub async fn health() -> &'static str {
    "OK"
}

pub async fn metrics() -> String {
    crate::metrics::gather_metrics()
}
