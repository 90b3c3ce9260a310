//! Automation-related DTOs for API requests and responses.

use crate::api::dto::EmailResponse;
use crate::models::{NewAutomation, SequenceStep, TriggerType, UpdateAutomation};
use crate::services::{AutomationWithSequence, SequenceEntry};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use validator::Validate;

// ============================================================================
// Request DTOs
// ============================================================================

/// One step of an automation's email sequence.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SequenceStepRequest {
    /// ID of the email template to send at this step
    #[schema(example = 1)]
    pub email_id: i32,

    /// Position in the sequence (1-based, contiguous)
    #[validate(range(min = 1, message = "Sequence order must be at least 1"))]
    #[schema(minimum = 1, example = 1)]
    pub sequence_order: i32,

    /// Hours to wait after the trigger before sending
    #[validate(range(min = 0, message = "Delay hours must be zero or positive"))]
    #[schema(minimum = 0, example = 48)]
    pub delay_hours: i32,
}

impl SequenceStepRequest {
    fn into_step(self) -> SequenceStep {
        SequenceStep {
            email_id: self.email_id,
            sequence_order: self.sequence_order,
            delay_hours: self.delay_hours,
        }
    }
}

/// Request body for creating a new automation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "name": "Welcome Series",
    "trigger_type": "signup",
    "trigger_conditions": {"plan": "pro"},
    "is_active": true,
    "email_sequence": [
        {"email_id": 1, "sequence_order": 1, "delay_hours": 0},
        {"email_id": 2, "sequence_order": 2, "delay_hours": 48}
    ]
}))]
pub struct CreateAutomationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    #[schema(example = "Welcome Series")]
    pub name: String,

    pub trigger_type: TriggerType,

    /// Optional key/value conditions the trigger payload must match
    #[schema(value_type = Option<Object>, example = json!({"plan": "pro"}))]
    pub trigger_conditions: Option<JsonValue>,

    #[serde(default = "default_true")]
    #[schema(example = true)]
    pub is_active: bool,

    /// Ordered email sequence; may be empty and filled in later
    #[serde(default)]
    #[validate(nested)]
    pub email_sequence: Vec<SequenceStepRequest>,
}

fn default_true() -> bool {
    true
}

impl CreateAutomationRequest {
    /// Splits the request into the automation definition and its sequence.
    pub fn into_parts(self) -> (NewAutomation, Vec<SequenceStep>) {
        let new_automation = NewAutomation {
            name: self.name,
            trigger_type: self.trigger_type,
            trigger_conditions: self.trigger_conditions,
            is_active: self.is_active,
        };
        let steps = self
            .email_sequence
            .into_iter()
            .map(SequenceStepRequest::into_step)
            .collect();
        (new_automation, steps)
    }
}

/// Request body for updating an automation.
///
/// Every field is optional; omitted fields keep their current value.
/// `trigger_conditions` distinguishes omitted (keep) from `null` (clear).
/// An `email_sequence` value replaces the whole sequence; an empty array
/// clears it.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateAutomationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub trigger_type: Option<TriggerType>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<Option<JsonValue>>,

    pub is_active: Option<bool>,

    #[validate(nested)]
    pub email_sequence: Option<Vec<SequenceStepRequest>>,
}

/// Keeps "field absent" and "field set to null" apart: absent stays `None`
/// via the serde default, while a present `null` becomes `Some(None)`.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<JsonValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<JsonValue>::deserialize(deserializer).map(Some)
}

impl UpdateAutomationRequest {
    /// Splits the request into the field changes and the optional
    /// replacement sequence.
    pub fn into_parts(self) -> (UpdateAutomation, Option<Vec<SequenceStep>>) {
        let changes = UpdateAutomation {
            name: self.name,
            trigger_type: self.trigger_type,
            trigger_conditions: self.trigger_conditions,
            is_active: self.is_active,
        };
        let steps = self.email_sequence.map(|steps| {
            steps
                .into_iter()
                .map(SequenceStepRequest::into_step)
                .collect()
        });
        (changes, steps)
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// One resolved step of an automation's sequence, with the referenced
/// template nested in full.
#[derive(Debug, Serialize, ToSchema)]
pub struct SequenceStepResponse {
    pub email_id: i32,
    pub sequence_order: i32,
    pub delay_hours: i32,
    /// The referenced template, or `null` if it has been deleted since
    pub email: Option<EmailResponse>,
}

impl From<SequenceEntry> for SequenceStepResponse {
    fn from(entry: SequenceEntry) -> Self {
        Self {
            email_id: entry.link.email_id,
            sequence_order: entry.link.sequence_order,
            delay_hours: entry.link.delay_hours,
            email: entry.email.map(EmailResponse::from),
        }
    }
}

/// Response body for automation data, including the resolved sequence.
#[derive(Debug, Serialize, ToSchema)]
pub struct AutomationResponse {
    pub id: i32,
    pub name: String,
    pub trigger_type: TriggerType,
    #[schema(value_type = Option<Object>)]
    pub trigger_conditions: Option<JsonValue>,
    pub is_active: bool,
    pub email_sequence: Vec<SequenceStepResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AutomationWithSequence> for AutomationResponse {
    fn from(value: AutomationWithSequence) -> Self {
        let automation = value.automation;
        Self {
            id: automation.id,
            name: automation.name,
            trigger_type: automation.trigger_type,
            trigger_conditions: automation.trigger_conditions,
            is_active: automation.is_active,
            email_sequence: value
                .sequence
                .into_iter()
                .map(SequenceStepResponse::from)
                .collect(),
            created_at: automation
                .created_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            updated_at: automation
                .updated_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_defaults() {
        let request: CreateAutomationRequest = serde_json::from_value(json!({
            "name": "Welcome Series",
            "trigger_type": "signup"
        }))
        .unwrap();

        assert!(request.is_active);
        assert!(request.email_sequence.is_empty());
        assert!(request.trigger_conditions.is_none());
    }

    #[test]
    fn test_create_request_into_parts() {
        let request: CreateAutomationRequest = serde_json::from_value(json!({
            "name": "Welcome Series",
            "trigger_type": "signup",
            "email_sequence": [
                {"email_id": 1, "sequence_order": 1, "delay_hours": 0},
                {"email_id": 2, "sequence_order": 2, "delay_hours": 48}
            ]
        }))
        .unwrap();

        let (new_automation, steps) = request.into_parts();
        assert_eq!(new_automation.name, "Welcome Series");
        assert_eq!(new_automation.trigger_type, TriggerType::Signup);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].delay_hours, 48);
    }

    #[test]
    fn test_create_request_rejects_negative_delay() {
        let request: CreateAutomationRequest = serde_json::from_value(json!({
            "name": "Welcome Series",
            "trigger_type": "signup",
            "email_sequence": [
                {"email_id": 1, "sequence_order": 1, "delay_hours": -1}
            ]
        }))
        .unwrap();

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_update_request_absent_conditions_keeps_value() {
        let request: UpdateAutomationRequest =
            serde_json::from_value(json!({"name": "Renamed"})).unwrap();

        assert_eq!(request.trigger_conditions, None);
        assert!(request.email_sequence.is_none());
    }

    #[test]
    fn test_update_request_null_conditions_clears_value() {
        let request: UpdateAutomationRequest =
            serde_json::from_value(json!({"trigger_conditions": null})).unwrap();

        assert_eq!(request.trigger_conditions, Some(None));
    }

    #[test]
    fn test_update_request_object_conditions_sets_value() {
        let request: UpdateAutomationRequest =
            serde_json::from_value(json!({"trigger_conditions": {"plan": "pro"}})).unwrap();

        assert_eq!(
            request.trigger_conditions,
            Some(Some(json!({"plan": "pro"})))
        );
    }

    #[test]
    fn test_update_request_empty_sequence_replaces_with_nothing() {
        let request: UpdateAutomationRequest =
            serde_json::from_value(json!({"email_sequence": []})).unwrap();

        let (_, steps) = request.into_parts();
        assert_eq!(steps, Some(vec![]));
    }
}
