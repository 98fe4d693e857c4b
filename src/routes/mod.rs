use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

mod detect;
mod health;
mod metrics;
mod pages;
mod records;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/upload", get(pages::upload))
        .route("/search", get(pages::search))
        .route("/health_check", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api/detect", post(detect::detect_image))
        .route(
            "/api/records",
            post(records::save_record).get(records::search_records),
        )
}
