//! Automation service for business logic operations.
//!
//! Owns the rules around automation definitions: a sequence must be
//! well-formed and may only reference email templates that exist. The
//! repository handles the transactional write; this layer decides whether
//! the write is allowed at all.

use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{
    Automation, AutomationEmailLink, Email, NewAutomation, SequenceStep, UpdateAutomation,
};
use crate::repositories::{AutomationRepository, EmailRepository};

/// An automation joined with its ordered sequence and the referenced
/// email templates.
#[derive(Debug, Clone)]
pub struct AutomationWithSequence {
    pub automation: Automation,
    pub sequence: Vec<SequenceEntry>,
}

/// One sequence position. `email` is `None` when the referenced template has
/// disappeared out-of-band; the read path tolerates it instead of failing
/// the whole listing.
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    pub link: AutomationEmailLink,
    pub email: Option<Email>,
}

/// Automation service handling definition management.
#[derive(Clone)]
pub struct AutomationService {
    automation_repo: AutomationRepository,
    email_repo: EmailRepository,
}

impl AutomationService {
    /// Creates a new AutomationService.
    pub fn new(automation_repo: AutomationRepository, email_repo: EmailRepository) -> Self {
        Self {
            automation_repo,
            email_repo,
        }
    }

    /// Creates an automation with its email sequence.
    ///
    /// # Arguments
    /// * `new_automation` - The automation definition
    /// * `steps` - The email sequence, validated before anything is written
    ///
    /// # Returns
    /// The created automation with its resolved sequence
    pub async fn create_automation(
        &self,
        new_automation: NewAutomation,
        steps: Vec<SequenceStep>,
    ) -> AppResult<AutomationWithSequence> {
        self.validate_sequence(&steps).await?;

        let (automation, links) = self.automation_repo.create(new_automation, steps).await?;
        tracing::info!(
            automation_id = automation.id,
            name = %automation.name,
            steps = links.len(),
            "Automation created"
        );

        self.assemble(automation, links).await
    }

    /// Gets an automation by ID with its resolved sequence.
    ///
    /// # Returns
    /// The automation if found, or `NotFound` error
    pub async fn get_automation(&self, id: i32) -> AppResult<AutomationWithSequence> {
        let automation = self
            .automation_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "automations".to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            })?;

        let links = self.automation_repo.links_for(id).await?;
        self.assemble(automation, links).await
    }

    /// Lists automations with pagination, each with its resolved sequence.
    ///
    /// # Returns
    /// A tuple of (automations, total_count)
    pub async fn list_automations(
        &self,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<AutomationWithSequence>, i64)> {
        let (automations, total) = self.automation_repo.list(offset, limit).await?;

        let ids: Vec<i32> = automations.iter().map(|automation| automation.id).collect();
        let links = self.automation_repo.links_for_automations(&ids).await?;
        let email_lookup = self.email_lookup(&links).await?;

        let mut grouped: HashMap<i32, Vec<AutomationEmailLink>> = HashMap::new();
        for link in links {
            grouped.entry(link.automation_id).or_default().push(link);
        }

        let items = automations
            .into_iter()
            .map(|automation| {
                let sequence = grouped
                    .remove(&automation.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|link| SequenceEntry {
                        email: email_lookup.get(&link.email_id).cloned(),
                        link,
                    })
                    .collect();
                AutomationWithSequence {
                    automation,
                    sequence,
                }
            })
            .collect();

        Ok((items, total))
    }

    /// Updates an automation, optionally replacing its email sequence.
    ///
    /// # Arguments
    /// * `id` - The automation ID
    /// * `changes` - The definition fields to update
    /// * `steps` - Replacement sequence; `None` keeps the current one
    ///
    /// # Returns
    /// The updated automation with its resolved sequence
    pub async fn update_automation(
        &self,
        id: i32,
        changes: UpdateAutomation,
        steps: Option<Vec<SequenceStep>>,
    ) -> AppResult<AutomationWithSequence> {
        if let Some(ref steps) = steps {
            self.validate_sequence(steps).await?;
        }

        let (automation, links) = self.automation_repo.update(id, changes, steps).await?;
        tracing::info!(automation_id = automation.id, "Automation updated");

        self.assemble(automation, links).await
    }

    /// Deletes an automation and its sequence links.
    ///
    /// Events already enqueued for this automation are left in place; the
    /// processing pass fails them individually when it finds the automation
    /// gone.
    pub async fn delete_automation(&self, id: i32) -> AppResult<()> {
        self.automation_repo.delete(id).await?;
        tracing::info!(automation_id = id, "Automation deleted");
        Ok(())
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    /// Validates a sequence before it is written: shape first, then that
    /// every referenced email template exists.
    async fn validate_sequence(&self, steps: &[SequenceStep]) -> AppResult<()> {
        check_sequence_shape(steps)?;

        let mut email_ids: Vec<i32> = steps.iter().map(|step| step.email_id).collect();
        email_ids.sort_unstable();
        email_ids.dedup();
        if email_ids.is_empty() {
            return Ok(());
        }

        let found = self.email_repo.find_by_ids(&email_ids).await?;
        if found.len() != email_ids.len() {
            let found_ids: Vec<i32> = found.iter().map(|email| email.id).collect();
            let missing: Vec<String> = email_ids
                .iter()
                .filter(|id| !found_ids.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(AppError::Validation {
                field: "email_sequence".to_string(),
                reason: format!("unknown email id(s): {}", missing.join(", ")),
            });
        }

        Ok(())
    }

    /// Resolves the email templates referenced by a batch of links.
    async fn email_lookup(
        &self,
        links: &[AutomationEmailLink],
    ) -> AppResult<HashMap<i32, Email>> {
        let mut email_ids: Vec<i32> = links.iter().map(|link| link.email_id).collect();
        email_ids.sort_unstable();
        email_ids.dedup();
        if email_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let emails = self.email_repo.find_by_ids(&email_ids).await?;
        Ok(emails.into_iter().map(|email| (email.id, email)).collect())
    }

    /// Joins one automation's links with their email templates.
    async fn assemble(
        &self,
        automation: Automation,
        links: Vec<AutomationEmailLink>,
    ) -> AppResult<AutomationWithSequence> {
        let email_lookup = self.email_lookup(&links).await?;
        let sequence = links
            .into_iter()
            .map(|link| SequenceEntry {
                email: email_lookup.get(&link.email_id).cloned(),
                link,
            })
            .collect();

        Ok(AutomationWithSequence {
            automation,
            sequence,
        })
    }
}

/// Checks that sequence orders are unique and contiguous starting at 1 and
/// that no step has a negative delay.
fn check_sequence_shape(steps: &[SequenceStep]) -> AppResult<()> {
    if let Some(step) = steps.iter().find(|step| step.delay_hours < 0) {
        return Err(AppError::Validation {
            field: "email_sequence".to_string(),
            reason: format!("delay_hours must be non-negative, got {}", step.delay_hours),
        });
    }

    let mut orders: Vec<i32> = steps.iter().map(|step| step.sequence_order).collect();
    orders.sort_unstable();
    for (position, order) in orders.iter().enumerate() {
        let expected = position as i32 + 1;
        if *order != expected {
            return Err(AppError::Validation {
                field: "email_sequence".to_string(),
                reason: "sequence_order values must be unique and contiguous starting at 1"
                    .to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(email_id: i32, sequence_order: i32, delay_hours: i32) -> SequenceStep {
        SequenceStep {
            email_id,
            sequence_order,
            delay_hours,
        }
    }

    #[test]
    fn test_empty_sequence_is_valid() {
        assert!(check_sequence_shape(&[]).is_ok());
    }

    #[test]
    fn test_contiguous_sequence_is_valid() {
        let steps = vec![step(10, 1, 0), step(11, 2, 48)];
        assert!(check_sequence_shape(&steps).is_ok());
    }

    #[test]
    fn test_order_of_submission_does_not_matter() {
        let steps = vec![step(11, 2, 48), step(10, 1, 0)];
        assert!(check_sequence_shape(&steps).is_ok());
    }

    #[test]
    fn test_duplicate_order_is_rejected() {
        let steps = vec![step(10, 1, 0), step(11, 1, 24)];
        let err = check_sequence_shape(&steps).unwrap_err();
        assert!(matches!(err, AppError::Validation { field, .. } if field == "email_sequence"));
    }

    #[test]
    fn test_gap_in_order_is_rejected() {
        let steps = vec![step(10, 1, 0), step(11, 3, 24)];
        assert!(check_sequence_shape(&steps).is_err());
    }

    #[test]
    fn test_order_must_start_at_one() {
        let steps = vec![step(10, 2, 0), step(11, 3, 24)];
        assert!(check_sequence_shape(&steps).is_err());
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let steps = vec![step(10, 1, -5)];
        let err = check_sequence_shape(&steps).unwrap_err();
        match err {
            AppError::Validation { reason, .. } => assert!(reason.contains("-5")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_same_email_may_appear_twice() {
        // A sequence may legitimately send the same template at two offsets.
        let steps = vec![step(10, 1, 0), step(10, 2, 72)];
        assert!(check_sequence_shape(&steps).is_ok());
    }
}
