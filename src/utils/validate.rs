//! Validated request extractors.
//!
//! `ValidatedJson` and `ValidatedQuery` deserialize a request body or query
//! string and run `validator` rules before the handler sees the value.
//! Deserialization failures become `BadRequest`; rule failures become a
//! `ValidationErrors` bundle with one entry per offending field.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult, ValidationFieldError};

/// JSON body extractor that validates the payload after deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection_to_error)?;
        value.validate().map_err(collect_field_errors)?;
        Ok(ValidatedJson(value))
    }
}

/// Query string extractor that validates the parameters after deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection_to_error)?;
        value.validate().map_err(collect_field_errors)?;
        Ok(ValidatedQuery(value))
    }
}

fn json_rejection_to_error(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::JsonDataError(_) => {
            format!("Invalid request body: {}", rejection.body_text())
        }
        JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON".to_string(),
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with Content-Type: application/json".to_string()
        }
        _ => format!("Failed to read request body: {}", rejection.body_text()),
    };
    AppError::BadRequest { message }
}

fn query_rejection_to_error(rejection: QueryRejection) -> AppError {
    AppError::BadRequest {
        message: format!("Invalid query parameters: {}", rejection.body_text()),
    }
}

/// Flattens `validator` output into one entry per failed field.
///
/// Uses the rule's custom message when one is declared, otherwise falls back
/// to the rule code (e.g. `range`, `length`).
fn collect_field_errors(errors: validator::ValidationErrors) -> AppError {
    let mut collected: Vec<ValidationFieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(|error| ValidationFieldError {
                field: field.to_string(),
                reason: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string()),
            })
        })
        .collect();
    // HashMap iteration order is arbitrary; sort so responses are stable.
    collected.sort_by(|a, b| a.field.cmp(&b.field).then(a.reason.cmp(&b.reason)));
    AppError::ValidationErrors { errors: collected }
}
