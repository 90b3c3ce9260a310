//! Automation event models.
//!
//! One event is one scheduled send for a (user, automation, email) tuple.
//! `sent` and `failed` are terminal; `sending` marks an event claimed by a
//! processing pass so overlapping passes and crashes stay observable.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle of an automation event
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, DbEnum,
)]
#[db_enum(existing_type_path = "crate::schema::sql_types::EventStatus")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Sending,
    Sent,
    Failed,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Pending => write!(f, "pending"),
            EventStatus::Sending => write!(f, "sending"),
            EventStatus::Sent => write!(f, "sent"),
            EventStatus::Failed => write!(f, "failed"),
        }
    }
}

impl EventStatus {
    /// Terminal states are never picked up by the due scan again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Sent | EventStatus::Failed)
    }
}

/// AutomationEvent model for reading from database
#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::automation_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AutomationEvent {
    pub id: i64,
    pub user_id: i32,
    pub automation_id: i32,
    pub email_id: i32,
    pub status: EventStatus,
    pub scheduled_at: NaiveDateTime,
    pub sent_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// NewAutomationEvent model for enrollment inserts
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::automation_events)]
pub struct NewAutomationEvent {
    pub user_id: i32,
    pub automation_id: i32,
    pub email_id: i32,
    pub status: EventStatus,
    pub scheduled_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_status_terminality() {
        assert!(EventStatus::Sent.is_terminal());
        assert!(EventStatus::Failed.is_terminal());
        assert!(!EventStatus::Pending.is_terminal());
        assert!(!EventStatus::Sending.is_terminal());
    }

    #[test]
    fn test_event_status_serde() {
        assert_eq!(
            serde_json::to_string(&EventStatus::Sending).unwrap(),
            "\"sending\""
        );
        let parsed: EventStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, EventStatus::Failed);
    }
}
