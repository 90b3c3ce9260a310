//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::{DeliveryConfig, JwtConfig, ProcessingConfig};
use crate::db::AsyncDbPool;
use crate::delivery::{EmailProvider, HttpEmailProvider};
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since both Services and AsyncDbPool use Arc internally.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the database connection pool
    pub db_pool: AsyncDbPool,
    /// JWT configuration for token generation and validation
    pub jwt_config: JwtConfig,
}

impl AppState {
    /// Creates a new AppState from a database connection pool and configuration.
    ///
    /// Initializes all repositories and services from the provided pool,
    /// wiring the HTTP email provider from the delivery settings.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    /// * `jwt_config` - JWT configuration for authentication
    /// * `delivery` - Delivery provider configuration
    /// * `processing` - Batch processing configuration
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool().await?;
    /// let state = AppState::new(pool, jwt, delivery, processing);
    /// ```
    pub fn new(
        pool: AsyncDbPool,
        jwt_config: JwtConfig,
        delivery: DeliveryConfig,
        processing: ProcessingConfig,
    ) -> Self {
        let provider: Arc<dyn EmailProvider> = Arc::new(HttpEmailProvider::new(delivery));
        Self::with_provider(pool, jwt_config, provider, processing)
    }

    /// Creates an AppState with an explicit email provider.
    ///
    /// Used by tests to substitute the outbound provider.
    pub fn with_provider(
        pool: AsyncDbPool,
        jwt_config: JwtConfig,
        provider: Arc<dyn EmailProvider>,
        processing: ProcessingConfig,
    ) -> Self {
        let repos = Repositories::new(pool.clone());
        let services = Services::new(repos, provider, processing);
        Self {
            services,
            db_pool: pool,
            jwt_config,
        }
    }
}
