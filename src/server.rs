//! Function-style HTTP invocation endpoint.
//!
//! The event dispatcher POSTs one event per request. The response is the
//! invocation result: `200 success` or `500 Processing failed due to …`.
//! Concurrent requests run concurrently; they share only the `Arc<Pipeline>`.

use crate::handler::Pipeline;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Routes: `POST /` and `POST /call` invoke the pipeline, `GET /health`
/// answers `ok`.
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", post(invoke))
        .route("/call", post(invoke))
        .route("/health", get(health))
        .with_state(pipeline)
}

async fn invoke(State(pipeline): State<Arc<Pipeline>>, body: Bytes) -> (StatusCode, String) {
    let response = pipeline.handle(&body).await;
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, response.body)
}

async fn health() -> &'static str {
    "ok"
}
