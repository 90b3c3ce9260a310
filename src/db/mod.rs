//! Database connection pool module.
//!
//! Provides async PostgreSQL connection pooling using diesel_async with bb8,
//! plus the embedded migrations applied by the `migrate` CLI command.

mod pool;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

use crate::error::{AppError, AppResult};

pub use pool::{AsyncDbPool, establish_async_connection_pool};

/// All migrations bundled into the binary at compile time.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Applies all pending migrations over a blocking connection.
///
/// Shared by the `migrate` CLI command and server startup when
/// `database.auto_migrate` is enabled. Returns the names of the
/// migrations that were applied.
pub async fn apply_pending_migrations(database_url: String) -> AppResult<Vec<String>> {
    tokio::task::spawn_blocking(move || {
        use diesel::Connection;
        use diesel::pg::PgConnection;
        use diesel_migrations::MigrationHarness;

        let mut conn = PgConnection::establish(&database_url).map_err(|e| AppError::Database {
            operation: "establish connection for migrations".to_string(),
            source: anyhow::anyhow!("Connection error: {}", e),
        })?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::Database {
                operation: "run pending migrations".to_string(),
                source: anyhow::anyhow!("Migration error: {}", e),
            })?;

        let migration_names: Vec<String> = applied.iter().map(|m| m.to_string()).collect();
        Ok::<_, AppError>(migration_names)
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?
}
