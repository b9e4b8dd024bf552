use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static POSTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "yatube_posts_created_total",
        "Total posts published"
    )
    .expect("register posts_created_total")
});

pub static POSTS_EDITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "yatube_posts_edited_total",
        "Total posts edited by their author"
    )
    .expect("register posts_edited_total")
});

/// Listing pages served, labelled by listing kind (index, group, profile).
pub static PAGE_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "yatube_page_requests_total",
        "Total paginated listing requests",
        &["listing"]
    )
    .expect("register page_requests_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
