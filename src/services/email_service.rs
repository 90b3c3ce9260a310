//! Email template service for business logic operations.

use crate::error::{AppError, AppResult};
use crate::models::{Email, NewEmail, UpdateEmail};
use crate::repositories::EmailRepository;

/// Email template service.
///
/// Templates are administered independently of automations; the one business
/// rule here is that a template still referenced by a sequence cannot be
/// deleted.
#[derive(Clone)]
pub struct EmailService {
    repo: EmailRepository,
}

impl EmailService {
    /// Creates a new EmailService with the given repository.
    pub fn new(repo: EmailRepository) -> Self {
        Self { repo }
    }

    /// Creates a new email template.
    ///
    /// # Returns
    /// The created email with generated id and timestamps
    pub async fn create_email(&self, new_email: NewEmail) -> AppResult<Email> {
        let email = self.repo.create(new_email).await?;
        tracing::info!(email_id = email.id, title = %email.title, "Email template created");
        Ok(email)
    }

    /// Gets an email template by ID.
    ///
    /// # Returns
    /// The email if found, or `NotFound` error
    pub async fn get_email(&self, id: i32) -> AppResult<Email> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound {
            entity: "emails".to_string(),
            field: "id".to_string(),
            value: id.to_string(),
        })
    }

    /// Lists email templates with pagination.
    ///
    /// # Returns
    /// A tuple of (emails, total_count)
    pub async fn list_emails(&self, offset: i64, limit: i64) -> AppResult<(Vec<Email>, i64)> {
        self.repo.list(offset, limit).await
    }

    /// Updates an email template.
    ///
    /// # Returns
    /// The updated email
    pub async fn update_email(&self, id: i32, changes: UpdateEmail) -> AppResult<Email> {
        let email = self.repo.update(id, changes).await?;
        tracing::info!(email_id = email.id, "Email template updated");
        Ok(email)
    }

    /// Deletes an email template.
    ///
    /// # Errors
    /// `Conflict` if any automation sequence still references the template;
    /// the sequence must be edited first.
    pub async fn delete_email(&self, id: i32) -> AppResult<()> {
        let linked = self.repo.linked_automation_count(id).await?;
        if linked > 0 {
            return Err(AppError::Conflict {
                message: format!(
                    "email {} is referenced by {} automation sequence link(s)",
                    id, linked
                ),
            });
        }

        self.repo.delete(id).await?;
        tracing::info!(email_id = id, "Email template deleted");
        Ok(())
    }
}
