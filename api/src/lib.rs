pub mod upload;

use axum::{
    routing::{get, post},
    Router,
};
use rag_engine::ExtractionEngine;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub fn app(engine: Arc<ExtractionEngine>) -> Router {
    Router::new()
        .route("/upload-pdf", post(upload::upload_pdf))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

async fn health() -> &'static str {
    "OK"
}
