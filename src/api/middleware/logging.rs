//! Logging middleware for request/response tracing.
//!
//! Logs one line when a request arrives and one when its response leaves,
//! correlated through the request ID set by the request ID middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{Level, span};

use super::RequestId;

/// Middleware that logs request and response information.
///
/// Logged per request: HTTP method, path, request ID; per response:
/// status code and latency in milliseconds.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let span = span!(
        Level::INFO,
        "http_request",
        method = %method,
        uri = %uri,
        request_id = %request_id
    );
    let _enter = span.enter();

    tracing::info!(
        method = %method,
        path = %uri.path(),
        request_id = %request_id,
        "Request received"
    );

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis();

    tracing::info!(
        status = response.status().as_u16(),
        latency_ms = latency_ms as u64,
        request_id = %request_id,
        "Response sent"
    );

    response
}
