//! Process command handler
//!
//! Runs a single delivery pass over due automation events from the command
//! line, without starting the HTTP server.

use crate::config::settings::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::AppResult;
use crate::state::AppState;

/// Handler for the process command
pub struct ProcessCommandHandler {
    config: Settings,
}

impl ProcessCommandHandler {
    /// Create a new process command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute one processing pass
    ///
    /// # Arguments
    /// * `requeue_stale` - Reset events stuck in the sending state before the pass
    ///
    /// # Returns
    /// Returns Ok(()) after the pass completes, even when individual
    /// deliveries failed; per-event failures are reported in the summary.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Database connection errors
    pub async fn execute(&self, requeue_stale: bool) -> AppResult<()> {
        // The pass needs both a database and a provider
        self.config.database.validate()?;
        self.config.delivery.validate()?;

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let state = AppState::new(
            pool,
            self.config.jwt.clone(),
            self.config.delivery.clone(),
            self.config.processing.clone(),
        );

        if requeue_stale {
            let requeued = state.services.processing.requeue_stale().await?;
            if requeued == 0 {
                println!("✓ No stale events found");
            } else {
                println!("✓ Requeued {} stale event(s)", requeued);
            }
        }

        println!("Processing due events...");
        let outcome = state.services.processing.process_due().await?;

        if outcome.processed == 0 {
            println!("✓ No due events - nothing to deliver");
        } else {
            println!(
                "✓ Processed {} event(s): {} sent, {} failed",
                outcome.processed, outcome.sent, outcome.failed
            );
            for error in &outcome.errors {
                println!("  - {}", error);
            }
        }

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
    use crate::config::settings::DeliveryConfig;

    fn create_valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/test".to_string();
        config.delivery = DeliveryConfig {
            api_url: "https://mail.example.com/v1/send".to_string(),
            api_key: "key".to_string(),
            sender: "noreply@example.com".to_string(),
            timeout_seconds: 10,
        };
        config
    }

    #[test]
    fn test_process_handler_new() {
        let config = create_valid_config();
        let handler = ProcessCommandHandler::new(config.clone());
        assert_eq!(handler.config(), &config);
    }

    #[tokio::test]
    async fn test_process_handler_rejects_missing_delivery_config() {
        let mut config = create_valid_config();
        config.delivery.api_url = String::new();
        let handler = ProcessCommandHandler::new(config);

        let result = handler.execute(false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_process_handler_rejects_missing_database_url() {
        let mut config = create_valid_config();
        config.database.url = String::new();
        let handler = ProcessCommandHandler::new(config);

        let result = handler.execute(false).await;
        assert!(result.is_err());
    }
}
