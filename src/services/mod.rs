//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories, the delivery provider, and handlers.

mod automation_service;
mod email_service;
mod event_service;
mod processing_service;
mod trigger_service;

pub use automation_service::{AutomationService, AutomationWithSequence, SequenceEntry};
pub use email_service::EmailService;
pub use event_service::EventService;
pub use processing_service::{ProcessOutcome, ProcessingService};
pub use trigger_service::{TriggerOutcome, TriggerService};

use std::sync::Arc;

use crate::config::ProcessingConfig;
use crate::delivery::EmailProvider;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since underlying pools use `Arc` internally.
#[derive(Clone)]
pub struct Services {
    pub automations: AutomationService,
    pub emails: EmailService,
    pub events: EventService,
    pub trigger: TriggerService,
    pub processing: ProcessingService,
}

impl Services {
    /// Creates a new Services instance from Repositories, the delivery
    /// provider, and the processing configuration.
    pub fn new(
        repos: Repositories,
        provider: Arc<dyn EmailProvider>,
        processing: ProcessingConfig,
    ) -> Self {
        Self {
            automations: AutomationService::new(repos.automations.clone(), repos.emails.clone()),
            emails: EmailService::new(repos.emails),
            events: EventService::new(repos.events.clone(), repos.automations.clone()),
            trigger: TriggerService::new(repos.automations, repos.events.clone(), repos.users),
            processing: ProcessingService::new(repos.events, provider, processing),
        }
    }
}
