use axum::response::IntoResponse;

pub async fn metrics_handler() -> impl IntoResponse {
    // The Prometheus recorder renders on the dedicated metrics port.
    "Metrics available on metrics port"
}
