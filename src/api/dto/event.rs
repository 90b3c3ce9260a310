//! Event-related DTOs: trigger requests, processing reports, and event views.

use crate::models::{AutomationEvent, EventStatus, TriggerType};
use crate::services::{ProcessOutcome, TriggerOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body reporting an external user event to the trigger engine.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "user_id": 7,
    "trigger_type": "signup",
    "user_data": {"plan": "pro"}
}))]
pub struct TriggerRequest {
    /// The user the event happened to
    #[validate(range(min = 1, message = "User ID must be at least 1"))]
    #[schema(minimum = 1, example = 7)]
    pub user_id: i32,

    pub trigger_type: TriggerType,

    /// Event payload matched against each automation's trigger conditions
    #[schema(value_type = Option<Object>, example = json!({"plan": "pro"}))]
    pub user_data: Option<JsonValue>,
}

/// Query filter for the event listing endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct EventFilterParams {
    /// Only return events in this status
    pub status: Option<EventStatus>,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response body for a single scheduled send.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub user_id: i32,
    pub automation_id: i32,
    pub email_id: i32,
    pub status: EventStatus,
    pub scheduled_at: String,
    pub sent_at: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AutomationEvent> for EventResponse {
    fn from(event: AutomationEvent) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            automation_id: event.automation_id,
            email_id: event.email_id,
            status: event.status,
            scheduled_at: event
                .scheduled_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            sent_at: event
                .sent_at
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
            error_message: event.error_message,
            created_at: event
                .created_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            updated_at: event
                .updated_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        }
    }
}

/// Response body for a trigger call: how many automations enrolled the user
/// and the events that were scheduled.
#[derive(Debug, Serialize, ToSchema)]
pub struct TriggerResponse {
    #[schema(example = 1)]
    pub triggered_count: usize,
    pub events: Vec<EventResponse>,
}

impl From<TriggerOutcome> for TriggerResponse {
    fn from(outcome: TriggerOutcome) -> Self {
        Self {
            triggered_count: outcome.triggered_count,
            events: outcome.events.into_iter().map(EventResponse::from).collect(),
        }
    }
}

/// Response body for a processing pass over due events.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessResponse {
    /// Events this pass claimed
    #[schema(example = 10)]
    pub processed: usize,
    /// Events delivered successfully
    #[schema(example = 9)]
    pub sent: usize,
    /// Events marked failed
    #[schema(example = 1)]
    pub failed: usize,
    /// One entry per failure, `"event <id>: <reason>"`
    pub errors: Vec<String>,
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        Self {
            processed: outcome.processed,
            sent: outcome.sent,
            failed: outcome.failed,
            errors: outcome.errors,
        }
    }
}

/// Response body for the stale-event reconciliation endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequeueStaleResponse {
    /// Events moved from `sending` back to `pending`
    #[schema(example = 2)]
    pub requeued: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn sample_event() -> AutomationEvent {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        AutomationEvent {
            id: 42,
            user_id: 7,
            automation_id: 3,
            email_id: 1,
            status: EventStatus::Pending,
            scheduled_at: ts,
            sent_at: None,
            error_message: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_trigger_request_deserialization() {
        let request: TriggerRequest = serde_json::from_value(json!({
            "user_id": 7,
            "trigger_type": "purchase",
            "user_data": {"total": 99}
        }))
        .unwrap();

        assert_eq!(request.user_id, 7);
        assert_eq!(request.trigger_type, TriggerType::Purchase);
        assert_eq!(request.user_data, Some(json!({"total": 99})));
    }

    #[test]
    fn test_trigger_request_rejects_nonpositive_user() {
        let request: TriggerRequest = serde_json::from_value(json!({
            "user_id": 0,
            "trigger_type": "signup"
        }))
        .unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_event_response_timestamp_format() {
        let response = EventResponse::from(sample_event());

        assert_eq!(response.scheduled_at, "2024-01-01T09:30:00.000Z");
        assert!(response.sent_at.is_none());
    }

    #[test]
    fn test_trigger_response_from_outcome() {
        let outcome = TriggerOutcome {
            triggered_count: 1,
            events: vec![sample_event()],
        };

        let response = TriggerResponse::from(outcome);
        assert_eq!(response.triggered_count, 1);
        assert_eq!(response.events.len(), 1);
        assert_eq!(response.events[0].id, 42);
    }

    #[test]
    fn test_process_response_serialization() {
        let response = ProcessResponse {
            processed: 3,
            sent: 2,
            failed: 1,
            errors: vec!["event 42: email 1 no longer exists".to_string()],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["processed"], 3);
        assert_eq!(json["errors"][0], "event 42: email 1 no longer exists");
    }
}
