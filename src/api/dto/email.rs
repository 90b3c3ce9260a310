//! Email template DTOs for API requests and responses.

use crate::models::{Email, EmailStatus, EmailType, NewEmail, UpdateEmail};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body for creating a new email template.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "title": "Welcome email",
    "subject": "Welcome aboard!",
    "body_html": "<p>Thanks for signing up.</p>",
    "body_text": "Thanks for signing up.",
    "email_type": "transactional",
    "status": "active"
}))]
pub struct CreateEmailRequest {
    /// Internal name shown in listings, not sent to recipients
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    #[schema(example = "Welcome email")]
    pub title: String,

    #[validate(length(min = 1, max = 255, message = "Subject must be between 1 and 255 characters"))]
    #[schema(example = "Welcome aboard!")]
    pub subject: String,

    #[validate(length(min = 1, message = "HTML body must not be empty"))]
    pub body_html: String,

    #[validate(length(min = 1, message = "Text body must not be empty"))]
    pub body_text: String,

    pub email_type: EmailType,

    /// Lifecycle status; new templates start as drafts unless stated otherwise
    #[serde(default = "default_status")]
    pub status: EmailStatus,
}

fn default_status() -> EmailStatus {
    EmailStatus::Draft
}

impl CreateEmailRequest {
    /// Converts the request DTO into a NewEmail model for database insertion.
    pub fn into_new_email(self) -> NewEmail {
        NewEmail {
            title: self.title,
            subject: self.subject,
            body_html: self.body_html,
            body_text: self.body_text,
            email_type: self.email_type,
            status: self.status,
        }
    }
}

/// Request body for updating an email template.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateEmailRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Subject must be between 1 and 255 characters"))]
    pub subject: Option<String>,

    #[validate(length(min = 1, message = "HTML body must not be empty"))]
    pub body_html: Option<String>,

    #[validate(length(min = 1, message = "Text body must not be empty"))]
    pub body_text: Option<String>,

    pub email_type: Option<EmailType>,

    pub status: Option<EmailStatus>,
}

impl UpdateEmailRequest {
    /// Converts the request DTO into an UpdateEmail model for database update.
    pub fn into_update_email(self) -> UpdateEmail {
        UpdateEmail {
            title: self.title,
            subject: self.subject,
            body_html: self.body_html,
            body_text: self.body_text,
            email_type: self.email_type,
            status: self.status,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response body for email template data.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmailResponse {
    pub id: i32,
    pub title: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub email_type: EmailType,
    pub status: EmailStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Email> for EmailResponse {
    fn from(email: Email) -> Self {
        Self {
            id: email.id,
            title: email.title,
            subject: email.subject,
            body_html: email.body_html,
            body_text: email.body_text,
            email_type: email.email_type,
            status: email.status,
            created_at: email
                .created_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            updated_at: email
                .updated_at
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
        }
    }
}
