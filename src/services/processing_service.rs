//! Processing engine: drains due automation events through the delivery
//! provider.
//!
//! Each pass claims events one at a time (pending to sending) before talking
//! to the provider, so a crash mid-send leaves a visible `sending` row
//! instead of silently double-delivering on the next pass. Individual event
//! failures are recorded and the pass keeps going; only a failure loading
//! the due list aborts the whole run.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::config::ProcessingConfig;
use crate::delivery::{EmailProvider, OutboundEmail};
use crate::error::{AppError, AppResult};
use crate::models::{Automation, AutomationEvent, Email, EmailStatus, User};
use crate::repositories::EventRepository;

/// Aggregate result of one processing pass.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// Events this pass claimed and acted on
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    /// One entry per per-event failure, for the administrator's report
    pub errors: Vec<String>,
}

impl ProcessOutcome {
    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }
}

/// Processing engine service.
#[derive(Clone)]
pub struct ProcessingService {
    event_repo: EventRepository,
    provider: Arc<dyn EmailProvider>,
    config: ProcessingConfig,
}

impl ProcessingService {
    /// Creates a new ProcessingService.
    pub fn new(
        event_repo: EventRepository,
        provider: Arc<dyn EmailProvider>,
        config: ProcessingConfig,
    ) -> Self {
        Self {
            event_repo,
            provider,
            config,
        }
    }

    /// Runs one processing pass over the due events.
    ///
    /// # Returns
    /// Counts of processed/sent/failed events plus per-event error strings
    pub async fn process_due(&self) -> AppResult<ProcessOutcome> {
        let now = Utc::now().naive_utc();

        let stale_cutoff = now - Duration::minutes(i64::from(self.config.stale_after_minutes));
        match self.event_repo.count_stale_sending(stale_cutoff).await {
            Ok(0) => {}
            Ok(stale) => tracing::warn!(
                stale,
                stale_after_minutes = self.config.stale_after_minutes,
                "Events stuck in sending state, a previous pass may have crashed"
            ),
            Err(e) => tracing::warn!(error = %e, "Stale sending check failed"),
        }

        let due = self
            .event_repo
            .find_due_with_context(now, i64::from(self.config.batch_limit))
            .await?;
        tracing::info!(due = due.len(), "Processing due automation events");

        let mut outcome = ProcessOutcome::default();
        for (event, email, automation, user) in due {
            self.process_one(&mut outcome, event, email, automation, user)
                .await;
        }

        tracing::info!(
            processed = outcome.processed,
            sent = outcome.sent,
            failed = outcome.failed,
            "Processing pass finished"
        );
        Ok(outcome)
    }

    /// Returns events stuck in `sending` beyond the configured threshold to
    /// `pending`.
    ///
    /// Operator-invoked reconciliation after a crashed pass; see the stale
    /// warning emitted by [`Self::process_due`].
    ///
    /// # Returns
    /// How many events were returned to `pending`
    pub async fn requeue_stale(&self) -> AppResult<usize> {
        let cutoff =
            Utc::now().naive_utc() - Duration::minutes(i64::from(self.config.stale_after_minutes));
        let requeued = self.event_repo.requeue_stale_sending(cutoff).await?;
        if requeued > 0 {
            tracing::info!(requeued, "Stale sending events returned to pending");
        }
        Ok(requeued)
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    /// Handles one due event: claim, resolve referents, deliver, record.
    ///
    /// Never returns an error; every failure mode ends up in the outcome or
    /// the log so the pass continues with the next event.
    async fn process_one(
        &self,
        outcome: &mut ProcessOutcome,
        event: AutomationEvent,
        email: Option<Email>,
        automation: Option<Automation>,
        user: Option<User>,
    ) {
        match self.event_repo.claim_for_sending(event.id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(event_id = event.id, "Event claimed elsewhere, skipping");
                return;
            }
            Err(e) => {
                tracing::warn!(event_id = event.id, error = %e, "Could not claim event");
                outcome
                    .errors
                    .push(format!("event {}: claim failed: {}", event.id, e));
                return;
            }
        }

        outcome.processed += 1;

        let (email, user) = match deliverable(&event, email, automation.as_ref(), user) {
            Ok(pair) => pair,
            Err(reason) => {
                let message = self.fail_event(event.id, &reason).await;
                outcome.record_failure(message);
                return;
            }
        };

        let message = build_outbound(&email, &user);
        match self.provider.send(&message).await {
            Ok(ack) => {
                tracing::info!(
                    event_id = event.id,
                    user_id = event.user_id,
                    email_id = event.email_id,
                    provider = self.provider.name(),
                    message_id = ack.message_id.as_deref().unwrap_or(""),
                    "Email delivered"
                );
                match self.event_repo.mark_sent(event.id).await {
                    Ok(true) => outcome.sent += 1,
                    Ok(false) => {
                        tracing::warn!(
                            event_id = event.id,
                            "Event left sending state before it could be marked sent"
                        );
                        outcome.sent += 1;
                    }
                    Err(e) => {
                        // The mail went out; the store just does not know.
                        tracing::error!(
                            event_id = event.id,
                            error = %e,
                            "Delivered but could not mark event sent"
                        );
                        outcome.sent += 1;
                        outcome.errors.push(format!(
                            "event {}: delivered but status update failed: {}",
                            event.id, e
                        ));
                    }
                }
            }
            Err(e) => {
                let message = self.fail_event(event.id, &delivery_reason(&e)).await;
                outcome.record_failure(message);
            }
        }
    }

    /// Marks an event failed and returns the error row for the outcome.
    async fn fail_event(&self, event_id: i64, reason: &str) -> String {
        match self.event_repo.mark_failed(event_id, reason).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                event_id,
                "Event left sending state before failure could be recorded"
            ),
            Err(e) => {
                tracing::error!(event_id, error = %e, "Could not record event failure")
            }
        }
        format!("event {}: {}", event_id, reason)
    }
}

/// Checks that everything an event references still exists and is usable,
/// handing back the owned email and user on success.
fn deliverable(
    event: &AutomationEvent,
    email: Option<Email>,
    automation: Option<&Automation>,
    user: Option<User>,
) -> Result<(Email, User), String> {
    if automation.is_none() {
        return Err(format!(
            "automation {} no longer exists",
            event.automation_id
        ));
    }
    let Some(email) = email else {
        return Err(format!("email {} no longer exists", event.email_id));
    };
    if email.status != EmailStatus::Active {
        return Err(format!("email {} is {}, not active", email.id, email.status));
    }
    let Some(user) = user else {
        return Err(format!("user {} no longer exists", event.user_id));
    };
    Ok((email, user))
}

/// Renders the stored template and contact record into a provider message.
fn build_outbound(email: &Email, user: &User) -> OutboundEmail {
    OutboundEmail {
        to: user.email.clone(),
        to_name: (!user.name.is_empty()).then(|| user.name.clone()),
        subject: email.subject.clone(),
        body_html: email.body_html.clone(),
        body_text: email.body_text.clone(),
    }
}

/// Error text stored in `error_message` for a delivery failure.
fn delivery_reason(error: &AppError) -> String {
    match error {
        AppError::Delivery { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailType, EventStatus, TriggerType};
    use chrono::NaiveDateTime;

    fn ts() -> NaiveDateTime {
        "2024-01-01T00:00:00".parse().unwrap()
    }

    fn event() -> AutomationEvent {
        AutomationEvent {
            id: 42,
            user_id: 7,
            automation_id: 3,
            email_id: 10,
            status: EventStatus::Pending,
            scheduled_at: ts(),
            sent_at: None,
            error_message: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn email(status: EmailStatus) -> Email {
        Email {
            id: 10,
            title: "Welcome".to_string(),
            subject: "Welcome aboard".to_string(),
            body_html: "<p>Hi</p>".to_string(),
            body_text: "Hi".to_string(),
            email_type: EmailType::Marketing,
            status,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn automation() -> Automation {
        Automation {
            id: 3,
            name: "Welcome Series".to_string(),
            trigger_type: TriggerType::Signup,
            trigger_conditions: None,
            is_active: true,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn user() -> User {
        User {
            id: 7,
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            created_at: ts(),
        }
    }

    #[test]
    fn test_deliverable_with_all_referents() {
        let result = deliverable(
            &event(),
            Some(email(EmailStatus::Active)),
            Some(&automation()),
            Some(user()),
        );
        let (email, user) = result.unwrap();
        assert_eq!(email.id, 10);
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn test_missing_automation_is_undeliverable() {
        let reason = deliverable(
            &event(),
            Some(email(EmailStatus::Active)),
            None,
            Some(user()),
        )
        .unwrap_err();
        assert_eq!(reason, "automation 3 no longer exists");
    }

    #[test]
    fn test_missing_email_is_undeliverable() {
        let reason = deliverable(&event(), None, Some(&automation()), Some(user())).unwrap_err();
        assert_eq!(reason, "email 10 no longer exists");
    }

    #[test]
    fn test_inactive_email_is_undeliverable() {
        let reason = deliverable(
            &event(),
            Some(email(EmailStatus::Draft)),
            Some(&automation()),
            Some(user()),
        )
        .unwrap_err();
        assert_eq!(reason, "email 10 is draft, not active");
    }

    #[test]
    fn test_missing_user_is_undeliverable() {
        let reason = deliverable(
            &event(),
            Some(email(EmailStatus::Active)),
            Some(&automation()),
            None,
        )
        .unwrap_err();
        assert_eq!(reason, "user 7 no longer exists");
    }

    #[test]
    fn test_build_outbound_copies_template_and_contact() {
        let message = build_outbound(&email(EmailStatus::Active), &user());
        assert_eq!(message.to, "alice@example.com");
        assert_eq!(message.to_name.as_deref(), Some("Alice"));
        assert_eq!(message.subject, "Welcome aboard");
        assert_eq!(message.body_html, "<p>Hi</p>");
        assert_eq!(message.body_text, "Hi");
    }

    #[test]
    fn test_build_outbound_drops_empty_name() {
        let mut contact = user();
        contact.name = String::new();
        let message = build_outbound(&email(EmailStatus::Active), &contact);
        assert!(message.to_name.is_none());
    }

    #[test]
    fn test_delivery_reason_unwraps_delivery_errors() {
        let err = AppError::Delivery {
            provider: "mail.example.com".to_string(),
            reason: "provider returned 502 Bad Gateway: upstream".to_string(),
        };
        assert_eq!(
            delivery_reason(&err),
            "provider returned 502 Bad Gateway: upstream"
        );
    }

    #[test]
    fn test_record_failure_keeps_counts_and_errors_aligned() {
        let mut outcome = ProcessOutcome::default();
        outcome.record_failure("event 1: boom".to_string());
        outcome.record_failure("event 2: boom".to_string());
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.errors.len(), 2);
    }
}
