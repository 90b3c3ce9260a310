//! JWT handling for the admin API.
//!
//! The embedding application issues tokens to its operators; this service
//! only verifies them, plus the `token` CLI command which mints operator
//! tokens signed with the same shared secret. Every API endpoint requires
//! the `admin` role claim.

use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Role claim value required by every endpoint.
pub const ADMIN_ROLE: &str = "admin";

/// JWT Claims structure containing the caller identity and token metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (operator identifier)
    pub sub: String,
    /// Role claim checked by the admin guard
    pub role: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a caller
    ///
    /// # Arguments
    /// * `subject` - The caller's identifier
    /// * `role` - The caller's role
    /// * `expiration_hours` - Token validity duration in hours
    pub fn new(subject: String, role: String, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            sub: subject,
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        }
    }

    /// Whether these claims carry the administrator role.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Generates a signed JWT for a caller
///
/// # Arguments
/// * `subject` - The caller's identifier
/// * `role` - The caller's role
/// * `secret` - The secret key for signing the token
/// * `expiration_hours` - Token validity duration in hours
///
/// # Returns
/// The encoded JWT token string
pub fn generate_token(
    subject: String,
    role: String,
    secret: &str,
    expiration_hours: i64,
) -> AppResult<String> {
    let claims = Claims::new(subject, role, expiration_hours);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Validates and decodes a JWT token
///
/// # Arguments
/// * `token` - The JWT token string to validate
/// * `secret` - The secret key for verifying the token
///
/// # Returns
/// The decoded claims if the token is valid
pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::Unauthorized {
            message: "Token has expired".to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidToken => AppError::Unauthorized {
            message: "Invalid token".to_string(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AppError::Unauthorized {
            message: "Invalid token signature".to_string(),
        },
        _ => AppError::Unauthorized {
            message: format!("Token validation failed: {}", e),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test_secret_key_for_jwt_testing";

    #[test]
    fn test_generate_token() {
        let token = generate_token("ops".to_string(), ADMIN_ROLE.to_string(), TEST_SECRET, 24);

        assert!(token.is_ok());
        let token_str = token.unwrap();
        assert!(!token_str.is_empty());
        assert!(token_str.contains('.'));
    }

    #[test]
    fn test_validate_token_success() {
        let token =
            generate_token("ops".to_string(), ADMIN_ROLE.to_string(), TEST_SECRET, 24).unwrap();

        let claims = validate_token(&token, TEST_SECRET);
        assert!(claims.is_ok());

        let claims = claims.unwrap();
        assert_eq!(claims.sub, "ops");
        assert_eq!(claims.role, "admin");
        assert!(claims.is_admin());
    }

    #[test]
    fn test_non_admin_role_is_detected() {
        let token =
            generate_token("viewer".to_string(), "viewer".to_string(), TEST_SECRET, 24).unwrap();

        let claims = validate_token(&token, TEST_SECRET).unwrap();
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_validate_token_invalid_secret() {
        let token =
            generate_token("ops".to_string(), ADMIN_ROLE.to_string(), TEST_SECRET, 24).unwrap();

        let result = validate_token(&token, "wrong_secret");
        assert!(result.is_err());

        if let Err(AppError::Unauthorized { message }) = result {
            assert!(message.contains("signature"));
        } else {
            panic!("Expected Unauthorized error");
        }
    }

    #[test]
    fn test_validate_token_invalid_format() {
        let result = validate_token("invalid.token.format", TEST_SECRET);
        assert!(result.is_err());

        if let Err(AppError::Unauthorized { message }) = result {
            assert!(message.contains("Invalid token") || message.contains("validation"));
        } else {
            panic!("Expected Unauthorized error");
        }
    }

    #[test]
    fn test_expired_token() {
        let token = generate_token(
            "ops".to_string(),
            ADMIN_ROLE.to_string(),
            TEST_SECRET,
            -1, // Negative hours to create an already expired token
        )
        .unwrap();

        let result = validate_token(&token, TEST_SECRET);
        assert!(result.is_err());

        if let Err(AppError::Unauthorized { message }) = result {
            assert!(message.contains("expired"));
        } else {
            panic!("Expected Unauthorized error for expired token");
        }
    }

    #[test]
    fn test_claims_structure() {
        let claims = Claims::new("42".to_string(), ADMIN_ROLE.to_string(), 24);

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }
}
