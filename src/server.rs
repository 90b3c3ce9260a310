//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::db::{apply_pending_migrations, establish_async_connection_pool};
use crate::jobs::ProcessingScheduler;
use crate::state::AppState;
use tokio::net::TcpListener;
use tokio::signal;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Logs startup information
    /// 2. Validates JWT and delivery configuration
    /// 3. Initializes database connection pool (running migrations if configured)
    /// 4. Creates application state
    /// 5. Starts the background processing scheduler when enabled
    /// 6. Binds to configured address
    /// 7. Starts the HTTP server with graceful shutdown
    ///
    /// # Returns
    /// Returns Ok(()) on successful shutdown, or error on startup failure
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Database connection pool initialization errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        // Log application startup information
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        // Log server configuration
        tracing::info!(
            host = %self.settings.server.host,
            port = %self.settings.server.port,
            request_timeout = %self.settings.server.request_timeout,
            keep_alive_timeout = %self.settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );

        // Log database configuration (without sensitive URL details)
        tracing::info!(
            max_connections = %self.settings.database.max_connections,
            min_connections = %self.settings.database.min_connections,
            connection_timeout = %self.settings.database.connection_timeout,
            auto_migrate = %self.settings.database.auto_migrate,
            "Database configuration loaded"
        );

        // Log logger configuration
        tracing::info!(
            level = %self.settings.logger.level,
            console_enabled = %self.settings.logger.console.enabled,
            file_enabled = %self.settings.logger.file.enabled,
            "Logger configuration loaded"
        );

        // Log JWT configuration (without sensitive secret)
        tracing::info!(
            token_expiration = %self.settings.jwt.token_expiration,
            secret_configured = %(!self.settings.jwt.secret.is_empty()),
            "JWT configuration loaded"
        );

        // Log delivery configuration (without sensitive API key)
        tracing::info!(
            api_url = %self.settings.delivery.api_url,
            sender = %self.settings.delivery.sender,
            timeout_seconds = %self.settings.delivery.timeout_seconds,
            api_key_configured = %(!self.settings.delivery.api_key.is_empty()),
            "Delivery configuration loaded"
        );

        // Log processing and jobs configuration
        tracing::info!(
            batch_limit = %self.settings.processing.batch_limit,
            stale_after_minutes = %self.settings.processing.stale_after_minutes,
            jobs_enabled = %self.settings.jobs.enabled,
            process_cron = %self.settings.jobs.process_cron,
            "Processing configuration loaded"
        );

        // Validate JWT configuration
        self.settings.jwt.validate().map_err(|e| {
            tracing::error!(error = %e, "JWT configuration validation failed");
            anyhow::anyhow!("JWT configuration validation failed: {}", e)
        })?;
        tracing::info!("JWT configuration validated");

        // Validate delivery configuration
        self.settings.delivery.validate().map_err(|e| {
            tracing::error!(error = %e, "Delivery configuration validation failed");
            anyhow::anyhow!("Delivery configuration validation failed: {}", e)
        })?;
        tracing::info!("Delivery configuration validated");

        tracing::info!("Configuration loaded successfully");

        // Run pending migrations before opening the pool if configured
        if self.settings.database.auto_migrate {
            tracing::info!("Running pending database migrations...");
            let applied = apply_pending_migrations(self.settings.database.url.clone()).await?;
            if applied.is_empty() {
                tracing::info!("Database is up to date");
            } else {
                tracing::info!(count = applied.len(), migrations = ?applied, "Applied database migrations");
            }
        }

        // Initialize database connection pool
        tracing::info!("Initializing database connection pool...");
        let pool = establish_async_connection_pool(&self.settings.database).await?;
        tracing::info!("Database connection pool initialized");

        // Create application state with services
        let state = AppState::new(
            pool,
            self.settings.jwt.clone(),
            self.settings.delivery.clone(),
            self.settings.processing.clone(),
        );
        tracing::info!("Application state created");

        // Start the background processing scheduler when enabled
        let scheduler = if self.settings.jobs.enabled {
            let scheduler = ProcessingScheduler::new(
                state.services.processing.clone(),
                self.settings.jobs.clone(),
            )
            .await?;
            scheduler.start().await?;
            tracing::info!(
                cron = %self.settings.jobs.process_cron,
                "Background processing scheduler started"
            );
            Some(scheduler)
        } else {
            tracing::info!("Background processing scheduler disabled");
            None
        };

        // Create router with all routes and middleware
        let router = create_router(state);
        tracing::info!("Router configured");

        // Bind to the configured address
        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        // Start the server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Stop the scheduler before reporting shutdown complete
        if let Some(scheduler) = scheduler {
            if let Err(e) = scheduler.stop().await {
                tracing::warn!(error = %e, "Scheduler shutdown failed");
            }
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
///
/// This function returns when either signal is received, allowing
/// the server to perform graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
