//! Trigger engine: enrolls users into matching automations.
//!
//! A trigger call never sends anything. It finds the active automations for
//! the trigger type, filters them through their condition sets, and enqueues
//! one pending event per sequence step. The unique enrollment index on
//! (user_id, automation_id, email_id) makes the whole thing idempotent:
//! concurrent or repeated triggers insert with ON CONFLICT DO NOTHING and
//! simply get zero rows back for automations the user is already in.

use chrono::{Duration, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::models::{
    Automation, AutomationEmailLink, AutomationEvent, EventStatus, NewAutomationEvent, TriggerType,
};
use crate::repositories::{AutomationRepository, EventRepository, UserRepository};

/// Result of one trigger call.
#[derive(Debug, Clone, Default)]
pub struct TriggerOutcome {
    /// Automations the user was newly enrolled in by this call
    pub triggered_count: usize,
    /// Every event created by this call, across all enrolled automations
    pub events: Vec<AutomationEvent>,
}

/// Trigger engine service.
#[derive(Clone)]
pub struct TriggerService {
    automation_repo: AutomationRepository,
    event_repo: EventRepository,
    user_repo: UserRepository,
}

impl TriggerService {
    /// Creates a new TriggerService.
    pub fn new(
        automation_repo: AutomationRepository,
        event_repo: EventRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            automation_repo,
            event_repo,
            user_repo,
        }
    }

    /// Enrolls a user into every active automation matching the trigger.
    ///
    /// A failure loading the automation list aborts the call; a failure
    /// enrolling into one automation is logged and the remaining automations
    /// are still attempted.
    ///
    /// # Arguments
    /// * `user_id` - The user the external event happened to
    /// * `trigger` - The class of event (signup, purchase, ...)
    /// * `user_data` - Event payload matched against trigger conditions
    ///
    /// # Returns
    /// How many automations newly enrolled the user, and the created events
    pub async fn trigger(
        &self,
        user_id: i32,
        trigger: TriggerType,
        user_data: Option<&JsonValue>,
    ) -> AppResult<TriggerOutcome> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "users".to_string(),
                field: "id".to_string(),
                value: user_id.to_string(),
            })?;

        let automations = self.automation_repo.list_active_by_trigger(trigger).await?;
        tracing::debug!(
            %trigger,
            user_id,
            candidates = automations.len(),
            "Evaluating automations for trigger"
        );

        let mut outcome = TriggerOutcome::default();
        for automation in automations {
            if !conditions_match(automation.trigger_conditions.as_ref(), user_data) {
                tracing::debug!(
                    automation_id = automation.id,
                    user_id,
                    "Trigger conditions not met, skipping"
                );
                continue;
            }

            match self.enroll(user_id, &automation).await {
                Ok(created) if created.is_empty() => {
                    tracing::debug!(
                        automation_id = automation.id,
                        user_id,
                        "User already enrolled, skipping"
                    );
                }
                Ok(mut created) => {
                    tracing::info!(
                        automation_id = automation.id,
                        user_id,
                        events = created.len(),
                        "User enrolled in automation"
                    );
                    outcome.triggered_count += 1;
                    outcome.events.append(&mut created);
                }
                Err(e) => {
                    // One automation's enrollment failure must not abort the
                    // rest; they are independent by construction.
                    tracing::error!(
                        automation_id = automation.id,
                        user_id,
                        error = %e,
                        "Enrollment failed"
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// Enrolls one user into one automation.
    ///
    /// Returns the created events, or an empty vector when the user was
    /// already enrolled (either caught by the pre-check or by the unique
    /// index during insert).
    async fn enroll(&self, user_id: i32, automation: &Automation) -> AppResult<Vec<AutomationEvent>> {
        // Cheap pre-check; the unique index remains the actual guarantee.
        if self
            .event_repo
            .exists_for_enrollment(user_id, automation.id)
            .await?
        {
            return Ok(Vec::new());
        }

        let links = self.automation_repo.links_for(automation.id).await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now().naive_utc();
        let rows = schedule_events(user_id, automation.id, &links, now);
        self.event_repo.insert_ignoring_conflicts(rows).await
    }
}

/// Decides whether an automation's trigger conditions accept the event
/// payload.
///
/// Absent, null or empty conditions accept everything. An object accepts
/// payloads that carry every condition key with an equal value. A condition
/// set that is not a JSON object never matches; creating one is an
/// administrator mistake that shows up in the logs rather than silently
/// enrolling everyone.
fn conditions_match(conditions: Option<&JsonValue>, user_data: Option<&JsonValue>) -> bool {
    let conditions = match conditions {
        None | Some(JsonValue::Null) => return true,
        Some(value) => value,
    };

    let Some(required) = conditions.as_object() else {
        tracing::warn!(?conditions, "Trigger conditions are not an object, never matching");
        return false;
    };
    if required.is_empty() {
        return true;
    }

    let Some(data) = user_data.and_then(|value| value.as_object()) else {
        return false;
    };

    required
        .iter()
        .all(|(key, expected)| data.get(key) == Some(expected))
}

/// Builds the pending events for one enrollment: one per sequence step,
/// scheduled at trigger time plus the step's delay. The schedule is fixed
/// here and never recomputed.
fn schedule_events(
    user_id: i32,
    automation_id: i32,
    links: &[AutomationEmailLink],
    now: NaiveDateTime,
) -> Vec<NewAutomationEvent> {
    links
        .iter()
        .map(|link| NewAutomationEvent {
            user_id,
            automation_id,
            email_id: link.email_id,
            status: EventStatus::Pending,
            scheduled_at: now + Duration::hours(i64::from(link.delay_hours)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn link(email_id: i32, sequence_order: i32, delay_hours: i32) -> AutomationEmailLink {
        AutomationEmailLink {
            id: sequence_order,
            automation_id: 1,
            email_id,
            sequence_order,
            delay_hours,
        }
    }

    // ------------------------------------------------------------------
    // conditions_match
    // ------------------------------------------------------------------

    #[test]
    fn test_missing_conditions_match_everything() {
        assert!(conditions_match(None, None));
        assert!(conditions_match(None, Some(&json!({"plan": "pro"}))));
    }

    #[test]
    fn test_null_and_empty_conditions_match_everything() {
        assert!(conditions_match(Some(&JsonValue::Null), None));
        assert!(conditions_match(Some(&json!({})), None));
    }

    #[test]
    fn test_subset_match() {
        let conditions = json!({"plan": "pro"});
        let data = json!({"plan": "pro", "country": "de"});
        assert!(conditions_match(Some(&conditions), Some(&data)));
    }

    #[test]
    fn test_value_mismatch_rejects() {
        let conditions = json!({"plan": "pro"});
        let data = json!({"plan": "free"});
        assert!(!conditions_match(Some(&conditions), Some(&data)));
    }

    #[test]
    fn test_missing_key_rejects() {
        let conditions = json!({"plan": "pro"});
        let data = json!({"country": "de"});
        assert!(!conditions_match(Some(&conditions), Some(&data)));
    }

    #[test]
    fn test_conditions_without_payload_reject() {
        let conditions = json!({"plan": "pro"});
        assert!(!conditions_match(Some(&conditions), None));
    }

    #[test]
    fn test_non_object_conditions_never_match() {
        let conditions = json!(["plan", "pro"]);
        assert!(!conditions_match(Some(&conditions), Some(&json!({"plan": "pro"}))));
    }

    #[test]
    fn test_nested_values_compare_structurally() {
        let conditions = json!({"utm": {"source": "ad"}});
        let matching = json!({"utm": {"source": "ad"}, "plan": "pro"});
        let differing = json!({"utm": {"source": "organic"}});
        assert!(conditions_match(Some(&conditions), Some(&matching)));
        assert!(!conditions_match(Some(&conditions), Some(&differing)));
    }

    // ------------------------------------------------------------------
    // schedule_events
    // ------------------------------------------------------------------

    #[test]
    fn test_schedule_one_event_per_step() {
        let now = "2024-01-01T00:00:00"
            .parse::<NaiveDateTime>()
            .unwrap();
        let links = vec![link(10, 1, 0), link(11, 2, 48)];

        let rows = schedule_events(7, 1, &links, now);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.user_id == 7
            && row.automation_id == 1
            && row.status == EventStatus::Pending));
        assert_eq!(rows[0].email_id, 10);
        assert_eq!(rows[0].scheduled_at, now);
        assert_eq!(rows[1].email_id, 11);
        assert_eq!(
            rows[1].scheduled_at,
            "2024-01-03T00:00:00".parse::<NaiveDateTime>().unwrap()
        );
    }

    #[test]
    fn test_schedule_zero_delay_is_due_immediately() {
        let now = Utc::now().naive_utc();
        let rows = schedule_events(1, 2, &[link(5, 1, 0)], now);
        assert_eq!(rows[0].scheduled_at, now);
    }

    #[test]
    fn test_schedule_empty_sequence_yields_no_events() {
        let now = Utc::now().naive_utc();
        assert!(schedule_events(1, 2, &[], now).is_empty());
    }
}
