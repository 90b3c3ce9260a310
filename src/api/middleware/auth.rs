//! JWT authentication middleware.
//!
//! Every API route is operator-only: requests must carry a bearer token
//! signed with the shared secret and holding the admin role. The embedding
//! application issues these tokens; this service only verifies them.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{Claims, validate_token};

/// Extension type for the authenticated operator.
///
/// Added to request extensions after successful authentication and
/// extractable in handlers via `Extension<AuthOperator>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthOperator {
    /// Token subject, typically an operator name or service account
    pub subject: String,
    /// Role carried by the token
    pub role: String,
}

impl From<Claims> for AuthOperator {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
        }
    }
}

/// Admin authentication middleware.
///
/// Validates the bearer token from the Authorization header, requires the
/// admin role, and adds the operator identity to request extensions.
///
/// # Errors
/// - 401 Unauthorized when the header is missing, malformed, or the token
///   is invalid or expired
/// - 403 Forbidden when the token is valid but not an admin token
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let claims = validate_token(token, &state.jwt_config.secret)?;

    if !claims.is_admin() {
        return Err(AppError::Forbidden {
            message: "Admin role required".to_string(),
        });
    }

    request.extensions_mut().insert(AuthOperator::from(claims));
    Ok(next.run(request).await)
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing authorization header".to_string(),
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid authorization header format. Expected: Bearer <token>".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::ADMIN_ROLE;
    use axum::http::HeaderValue;

    #[test]
    fn test_auth_operator_from_claims() {
        let claims = Claims::new("ops@example.com".to_string(), ADMIN_ROLE.to_string(), 24);

        let operator = AuthOperator::from(claims);
        assert_eq!(operator.subject, "ops@example.com");
        assert_eq!(operator.role, "admin");
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );

        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let headers = HeaderMap::new();

        match bearer_token(&headers) {
            Err(AppError::Unauthorized { message }) => {
                assert!(message.contains("Missing authorization header"));
            }
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_scheme_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        match bearer_token(&headers) {
            Err(AppError::Unauthorized { message }) => {
                assert!(message.contains("Bearer"));
            }
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }
}
