//! Automation event queries and administrator actions.

use crate::error::{AppError, AppResult};
use crate::models::{AutomationEvent, EventStatus};
use crate::repositories::{AutomationRepository, EventRepository};

/// Event query service.
///
/// Read-side companion to the processing engine: administrators inspect the
/// queue through it and requeue individual failed events.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    automation_repo: AutomationRepository,
}

impl EventService {
    /// Creates a new EventService.
    pub fn new(event_repo: EventRepository, automation_repo: AutomationRepository) -> Self {
        Self {
            event_repo,
            automation_repo,
        }
    }

    /// Gets an event by ID.
    ///
    /// # Returns
    /// The event if found, or `NotFound` error
    pub async fn get_event(&self, id: i64) -> AppResult<AutomationEvent> {
        self.event_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "automation_events".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            })
    }

    /// Lists events with pagination, optionally filtered by status.
    ///
    /// # Returns
    /// A tuple of (events, total_count)
    pub async fn list_events(
        &self,
        status: Option<EventStatus>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<AutomationEvent>, i64)> {
        self.event_repo.list_by_status(status, offset, limit).await
    }

    /// Lists the events of one automation with pagination.
    ///
    /// # Errors
    /// `NotFound` if the automation does not exist
    pub async fn list_for_automation(
        &self,
        automation_id: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<AutomationEvent>, i64)> {
        self.automation_repo
            .find_by_id(automation_id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "automations".to_string(),
                field: "id".to_string(),
                value: automation_id.to_string(),
            })?;

        self.event_repo
            .list_for_automation(automation_id, offset, limit)
            .await
    }

    /// Returns a failed or stuck-sending event to `pending` so the next
    /// processing pass retries it. There is no automatic retry; this is the
    /// administrator's explicit reset.
    ///
    /// # Errors
    /// `NotFound` if the event does not exist; `Conflict` if it is neither
    /// `failed` nor `sending`
    pub async fn requeue_event(&self, id: i64) -> AppResult<AutomationEvent> {
        if self.event_repo.requeue(id).await? {
            tracing::info!(event_id = id, "Event requeued");
            return self.get_event(id).await;
        }

        // Distinguish a missing event from one in the wrong state.
        let event = self.get_event(id).await?;
        Err(AppError::Conflict {
            message: format!(
                "event {} is {}, only failed or sending events can be requeued",
                id, event.status
            ),
        })
    }
}
