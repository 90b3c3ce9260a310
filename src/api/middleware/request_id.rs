//! Request ID middleware for request tracing.
//!
//! Ensures every request has a unique identifier for log correlation.
//! An incoming X-Request-Id header is honored when it is a sane header
//! value; otherwise a fresh UUID v4 is generated.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID stored in request extensions for downstream access.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Middleware that assigns a request ID and echoes it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = incoming_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

/// Reads a usable request ID from the incoming headers, if any.
///
/// Overlong or non-ASCII values are discarded so a client cannot inject
/// arbitrary bytes into logs and response headers.
fn incoming_request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(value: &str) -> Request {
        Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_incoming_request_id_is_used() {
        let request = request_with_header("client-id-1");
        assert_eq!(
            incoming_request_id(&request),
            Some("client-id-1".to_string())
        );
    }

    #[test]
    fn test_empty_request_id_is_discarded() {
        let request = request_with_header("");
        assert_eq!(incoming_request_id(&request), None);
    }

    #[test]
    fn test_overlong_request_id_is_discarded() {
        let long_value = "x".repeat(200);
        let request = request_with_header(&long_value);
        assert_eq!(incoming_request_id(&request), None);
    }

    #[test]
    fn test_missing_header_yields_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert_eq!(incoming_request_id(&request), None);
    }
}
