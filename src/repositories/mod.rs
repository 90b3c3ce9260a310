//! Repository layer for data access operations.
//!
//! Provides async CRUD operations for all domain entities.

mod automation_repo;
mod email_repo;
mod event_repo;
mod user_repo;

pub use automation_repo::AutomationRepository;
pub use email_repo::EmailRepository;
pub use event_repo::{DueEvent, EventRepository};
pub use user_repo::UserRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub automations: AutomationRepository,
    pub emails: EmailRepository,
    pub events: EventRepository,
    pub users: UserRepository,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            automations: AutomationRepository::new(pool.clone()),
            emails: EmailRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }
}
