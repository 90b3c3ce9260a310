//! Token command handler
//!
//! Mints admin API tokens for operators from the command line. The server
//! never issues tokens itself, so this is the supported way to produce a
//! bearer token for the admin endpoints.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::utils::jwt::{ADMIN_ROLE, generate_token};

/// Handler for the token command
pub struct TokenCommandHandler {
    config: Settings,
}

impl TokenCommandHandler {
    /// Create a new token command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Mint and print an admin token for the given subject
    ///
    /// # Arguments
    /// * `subject` - Identifier embedded in the token (typically an operator email)
    /// * `expiration_hours` - Optional lifetime override; defaults to jwt.token_expiration
    ///
    /// # Returns
    /// Returns Ok(()) after printing the token to stdout
    ///
    /// # Errors
    /// - JWT configuration validation errors
    /// - Token signing errors
    pub fn execute(&self, subject: &str, expiration_hours: Option<i64>) -> AppResult<()> {
        self.config.jwt.validate()?;

        let hours = expiration_hours.unwrap_or(self.config.jwt.token_expiration);
        let token = generate_token(
            subject.to_string(),
            ADMIN_ROLE.to_string(),
            &self.config.jwt.secret,
            hours,
        )?;

        // Token on stdout so it can be piped; context on stderr
        println!("{}", token);
        eprintln!(
            "Minted admin token for '{}' valid for {} hour(s)",
            subject, hours
        );

        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::validate_token;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.jwt.secret = "test_secret_key_for_jwt_testing_32ch".to_string();
        config
    }

    #[test]
    fn test_token_handler_mints_valid_admin_token() {
        let config = create_valid_config();
        let secret = config.jwt.secret.clone();
        let handler = TokenCommandHandler::new(config);

        let result = handler.execute("ops@example.com", None);
        assert!(result.is_ok());

        // Round-trip through generate to check the claims shape
        let token = generate_token(
            "ops@example.com".to_string(),
            ADMIN_ROLE.to_string(),
            &secret,
            12,
        )
        .unwrap();
        let claims = validate_token(&token, &secret).unwrap();
        assert!(claims.is_admin());
        assert_eq!(claims.sub, "ops@example.com");
    }

    #[test]
    fn test_token_handler_rejects_unconfigured_secret() {
        let config = Settings::default();
        let handler = TokenCommandHandler::new(config);

        let result = handler.execute("ops@example.com", None);
        assert!(result.is_err());
    }

    #[test]
    fn test_token_handler_honors_expiration_override() {
        let config = create_valid_config();
        let handler = TokenCommandHandler::new(config);

        let result = handler.execute("ops@example.com", Some(72));
        assert!(result.is_ok());
    }
}
