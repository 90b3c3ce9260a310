//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Internal details (SQL errors, source chains) stay in the logs; the
//! response body carries a sanitized code and message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - NotFound → 404 NOT_FOUND
    /// - Duplicate → 409 DUPLICATE_ENTRY
    /// - Validation / ValidationErrors / BadRequest → 400
    /// - Conflict → 409 CONFLICT
    /// - UnprocessableContent → 422 UNPROCESSABLE_CONTENT
    /// - Unauthorized → 401, Forbidden → 403
    /// - Delivery → 502 DELIVERY_ERROR
    /// - Database / Configuration / Internal → 500
    /// - ConnectionPool → 503 SERVICE_UNAVAILABLE
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let code = error_to_code(&self);

        let error_response = match &self {
            AppError::NotFound {
                entity,
                field,
                value,
            } => ErrorResponse::new(
                code,
                &format!("Resource not found: {} with {}={}", entity, field, value),
            ),
            AppError::Duplicate {
                entity,
                field,
                value,
            } => ErrorResponse::new(
                code,
                &format!("{}.{} = '{}' already exists", entity, field, value),
            ),
            AppError::Validation { field, reason } => {
                ErrorResponse::new(code, &format!("Validation failed for {}: {}", field, reason))
                    .with_details(json!({"field": field, "reason": reason}))
            }
            AppError::ValidationErrors { errors } => ErrorResponse::new(
                code,
                &format!("Validation failed for {} field(s)", errors.len()),
            )
            .with_details(json!({ "errors": errors })),
            AppError::BadRequest { message } => ErrorResponse::new(code, message),
            AppError::Conflict { message } => ErrorResponse::new(code, message),
            AppError::UnprocessableContent { message } => ErrorResponse::new(code, message),
            AppError::Unauthorized { message } => ErrorResponse::new(code, message),
            AppError::Forbidden { message } => ErrorResponse::new(code, message),
            AppError::Delivery { provider, reason } => {
                ErrorResponse::new(code, "Email delivery failed")
                    .with_details(json!({"provider": provider, "reason": reason}))
            }
            AppError::Database { operation, .. } => {
                ErrorResponse::new(code, &format!("Database operation failed: {}", operation))
                    .with_details(json!({ "operation": operation }))
            }
            AppError::Configuration { key, .. } => {
                ErrorResponse::new(code, &format!("Configuration error: {}", key))
                    .with_details(json!({ "key": key }))
            }
            AppError::ConnectionPool { .. } => {
                ErrorResponse::new(code, "Database connection unavailable")
            }
            AppError::Internal { .. } => ErrorResponse::new(code, "An internal error occurred"),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        (status, Json(error_response)).into_response()
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::UnprocessableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::Delivery { .. } => StatusCode::BAD_GATEWAY,
        AppError::Database { .. }
        | AppError::Configuration { .. }
        | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Maps an AppError variant to its machine-readable error code.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Duplicate { .. } => "DUPLICATE_ENTRY",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Conflict { .. } => "CONFLICT",
        AppError::UnprocessableContent { .. } => "UNPROCESSABLE_CONTENT",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Forbidden { .. } => "FORBIDDEN",
        AppError::Delivery { .. } => "DELIVERY_ERROR",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Global error handling middleware that converts plain-text error responses
/// (unmatched routes, method mismatches) into the standard JSON envelope.
///
/// Responses that already carry a JSON body pass through untouched.
pub async fn global_error_handler(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let already_json = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    if already_json {
        return response;
    }

    let (_parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let original_message = String::from_utf8_lossy(&body_bytes).trim().to_string();

    let message = if original_message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("An unknown error occurred")
            .to_string()
    } else {
        original_message
    };

    let code = match status {
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::SERVICE_UNAVAILABLE => "SERVICE_UNAVAILABLE",
        _ if status.is_server_error() => "INTERNAL_ERROR",
        _ => "REQUEST_ERROR",
    };

    (status, Json(ErrorResponse::new(code, &message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationFieldError;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn response_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let error = AppError::NotFound {
            entity: "automations".to_string(),
            field: "id".to_string(),
            value: "42".to_string(),
        };

        let (status, json) = response_json(error).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(
            json["message"],
            "Resource not found: automations with id=42"
        );
    }

    #[tokio::test]
    async fn test_validation_errors_carry_field_details() {
        let error = AppError::ValidationErrors {
            errors: vec![
                ValidationFieldError {
                    field: "name".to_string(),
                    reason: "must not be empty".to_string(),
                },
                ValidationFieldError {
                    field: "delay_hours".to_string(),
                    reason: "must be zero or positive".to_string(),
                },
            ],
        };

        let (status, json) = response_json(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["errors"][0]["field"], "name");
        assert_eq!(json["details"]["errors"][1]["field"], "delay_hours");
    }

    #[tokio::test]
    async fn test_conflict_response() {
        let error = AppError::Conflict {
            message: "event 9 is sent, only failed or sending events can be requeued".to_string(),
        };

        let (status, json) = response_json(error).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_delivery_error_is_bad_gateway() {
        let error = AppError::Delivery {
            provider: "mail.example.com".to_string(),
            reason: "provider returned 500".to_string(),
        };

        let (status, json) = response_json(error).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], "DELIVERY_ERROR");
        assert_eq!(json["details"]["provider"], "mail.example.com");
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let error = AppError::Internal {
            source: anyhow::anyhow!("secret connection string leaked"),
        };

        let (status, json) = response_json(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "An internal error occurred");
        assert!(!json.to_string().contains("secret"));
    }

    #[test]
    fn test_status_code_mapping() {
        let unauthorized = AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        };
        let forbidden = AppError::Forbidden {
            message: "Admin role required".to_string(),
        };
        let duplicate = AppError::Duplicate {
            entity: "automation_events".to_string(),
            field: "enrollment".to_string(),
            value: "7/3/1".to_string(),
        };
        let pool = AppError::ConnectionPool {
            source: anyhow::anyhow!("timed out"),
        };

        assert_eq!(
            error_to_status_code(&unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(error_to_status_code(&forbidden), StatusCode::FORBIDDEN);
        assert_eq!(error_to_status_code(&duplicate), StatusCode::CONFLICT);
        assert_eq!(error_to_status_code(&pool), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_code_mapping() {
        let validation = AppError::Validation {
            field: "email_sequence".to_string(),
            reason: "unknown email id(s): 99".to_string(),
        };
        let database = AppError::Database {
            operation: "insert automation".to_string(),
            source: anyhow::anyhow!("boom"),
        };

        assert_eq!(error_to_code(&validation), "VALIDATION_ERROR");
        assert_eq!(error_to_code(&database), "DATABASE_ERROR");
    }
}
