//! Automation event repository for async database operations.
//!
//! Events are the per-user send queue. Enrollment inserts lean on the unique
//! (user_id, automation_id, email_id) index with ON CONFLICT DO NOTHING, so
//! concurrent triggers for the same user collapse into one enrollment without
//! a check-then-insert race. State transitions are guarded updates: each one
//! names the state it expects, and a row count of zero means someone else got
//! there first.

use chrono::NaiveDateTime;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Automation, AutomationEvent, Email, EventStatus, NewAutomationEvent, User};

/// A due event joined with everything a processing pass needs to act on it.
///
/// The joined sides are optional because events reference automations, emails
/// and users without foreign keys; a missing referent is handled by marking
/// the event failed rather than by blocking deletes.
pub type DueEvent = (
    AutomationEvent,
    Option<Email>,
    Option<Automation>,
    Option<User>,
);

/// Automation event repository
#[derive(Clone)]
pub struct EventRepository {
    pool: AsyncDbPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Inserts enrollment rows, silently skipping any that already exist.
    ///
    /// All rows go in with a single statement, so an enrollment is all or
    /// nothing even when several events are scheduled at once.
    ///
    /// # Returns
    /// Only the events that were actually inserted
    pub async fn insert_ignoring_conflicts(
        &self,
        rows: Vec<NewAutomationEvent>,
    ) -> AppResult<Vec<AutomationEvent>> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::insert_into(automation_events)
            .values(&rows)
            .on_conflict((user_id, automation_id, email_id))
            .do_nothing()
            .returning(AutomationEvent::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Checks whether a user already has events for an automation.
    pub async fn exists_for_enrollment(&self, uid: i32, aid: i32) -> AppResult<bool> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::select(exists(
            automation_events
                .filter(user_id.eq(uid))
                .filter(automation_id.eq(aid)),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(AppError::from)
    }

    /// Finds an event by its ID.
    pub async fn find_by_id(&self, event_id: i64) -> AppResult<Option<AutomationEvent>> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automation_events
            .filter(id.eq(event_id))
            .select(AutomationEvent::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Loads pending events due at or before `due_before`, oldest first,
    /// joined with their email, automation and recipient.
    ///
    /// The batch is capped so one pass cannot grow without bound.
    pub async fn find_due_with_context(
        &self,
        due_before: NaiveDateTime,
        batch: i64,
    ) -> AppResult<Vec<DueEvent>> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automation_events
            .left_join(crate::schema::emails::table)
            .left_join(crate::schema::automations::table)
            .left_join(crate::schema::users::table)
            .filter(status.eq(EventStatus::Pending))
            .filter(scheduled_at.le(due_before))
            .order(scheduled_at.asc())
            .limit(batch)
            .select((
                AutomationEvent::as_select(),
                Option::<Email>::as_select(),
                Option::<Automation>::as_select(),
                Option::<User>::as_select(),
            ))
            .load::<DueEvent>(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Claims a pending event for delivery by moving it to `sending`.
    ///
    /// # Returns
    /// `true` if this call won the claim, `false` if the event was no longer
    /// pending (already claimed, or finished by another pass)
    pub async fn claim_for_sending(&self, event_id: i64) -> AppResult<bool> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let updated = diesel::update(
            automation_events
                .filter(id.eq(event_id))
                .filter(status.eq(EventStatus::Pending)),
        )
        .set(status.eq(EventStatus::Sending))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Marks a claimed event as sent and stamps the delivery time.
    ///
    /// # Returns
    /// `false` if the event was not in the `sending` state
    pub async fn mark_sent(&self, event_id: i64) -> AppResult<bool> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let updated = diesel::update(
            automation_events
                .filter(id.eq(event_id))
                .filter(status.eq(EventStatus::Sending)),
        )
        .set((
            status.eq(EventStatus::Sent),
            sent_at.eq(diesel::dsl::now),
            error_message.eq(None::<String>),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Marks a claimed event as failed with a reason.
    ///
    /// # Returns
    /// `false` if the event was not in the `sending` state
    pub async fn mark_failed(&self, event_id: i64, reason: &str) -> AppResult<bool> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let updated = diesel::update(
            automation_events
                .filter(id.eq(event_id))
                .filter(status.eq(EventStatus::Sending)),
        )
        .set((
            status.eq(EventStatus::Failed),
            error_message.eq(reason),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Resets a failed or stuck-sending event back to `pending` so the next
    /// pass retries it.
    ///
    /// The original schedule is kept; a past `scheduled_at` simply makes the
    /// event due immediately.
    ///
    /// # Returns
    /// `false` if the event was neither `failed` nor `sending`
    pub async fn requeue(&self, event_id: i64) -> AppResult<bool> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let updated = diesel::update(
            automation_events
                .filter(id.eq(event_id))
                .filter(status.eq_any([EventStatus::Failed, EventStatus::Sending])),
        )
        .set((
            status.eq(EventStatus::Pending),
            error_message.eq(None::<String>),
        ))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)?;

        Ok(updated == 1)
    }

    /// Resets events stuck in `sending` longer than `cutoff` back to
    /// `pending`, returning how many were reset.
    ///
    /// Used by operators after a crashed pass; the regular processing path
    /// never does this on its own since the claim may still be in flight.
    pub async fn requeue_stale_sending(&self, cutoff: NaiveDateTime) -> AppResult<usize> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::update(
            automation_events
                .filter(status.eq(EventStatus::Sending))
                .filter(updated_at.lt(cutoff)),
        )
        .set(status.eq(EventStatus::Pending))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
    }

    /// Lists events, optionally filtered by status, newest schedule first.
    ///
    /// # Returns
    /// Tuple of (events vector, total count)
    pub async fn list_by_status(
        &self,
        status_filter: Option<EventStatus>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<AutomationEvent>, i64)> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let mut rows_query = automation_events.into_boxed();
        let mut count_query = automation_events.into_boxed();
        if let Some(filter_value) = status_filter {
            rows_query = rows_query.filter(status.eq(filter_value));
            count_query = count_query.filter(status.eq(filter_value));
        }

        let rows = rows_query
            .order(scheduled_at.desc())
            .offset(offset)
            .limit(limit)
            .select(AutomationEvent::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = count_query
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((rows, total))
    }

    /// Lists the events of one automation, newest schedule first.
    ///
    /// # Returns
    /// Tuple of (events vector, total count)
    pub async fn list_for_automation(
        &self,
        aid: i32,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<AutomationEvent>, i64)> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let rows = automation_events
            .filter(automation_id.eq(aid))
            .order(scheduled_at.desc())
            .offset(offset)
            .limit(limit)
            .select(AutomationEvent::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = automation_events
            .filter(automation_id.eq(aid))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((rows, total))
    }

    /// Counts events stuck in `sending` since before `cutoff`.
    ///
    /// A nonzero count usually means a processing pass died mid-delivery.
    pub async fn count_stale_sending(&self, cutoff: NaiveDateTime) -> AppResult<i64> {
        use crate::schema::automation_events::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automation_events
            .filter(status.eq(EventStatus::Sending))
            .filter(updated_at.lt(cutoff))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
