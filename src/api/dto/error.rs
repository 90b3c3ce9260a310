//! Error response DTOs.

use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// Standard error response format returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `NOT_FOUND`
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    /// Human-readable error message
    #[schema(example = "Resource not found: automations with id=42")]
    pub message: String,
    /// Optional structured details, e.g. per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<JsonValue>,
    /// Request ID for correlating with server logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    /// Attaches structured details to the error response.
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    /// Attaches a request ID to the error response.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}
