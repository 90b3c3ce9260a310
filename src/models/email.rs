//! Email template models for database operations.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

/// Classification of an email template
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, DbEnum,
)]
#[db_enum(existing_type_path = "crate::schema::sql_types::EmailType")]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Marketing,
    Transactional,
}

/// Lifecycle status of an email template. Only `active` templates are
/// dispatched by the processing engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, DbEnum,
)]
#[db_enum(existing_type_path = "crate::schema::sql_types::EmailStatus")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Draft,
    Active,
    Archived,
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailStatus::Draft => write!(f, "draft"),
            EmailStatus::Active => write!(f, "active"),
            EmailStatus::Archived => write!(f, "archived"),
        }
    }
}

/// Email template model for reading from database
#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::emails)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Email {
    pub id: i32,
    pub title: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub email_type: EmailType,
    pub status: EmailStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// NewEmail model for inserting new records
#[derive(Debug, Insertable, Deserialize, Clone)]
#[diesel(table_name = crate::schema::emails)]
pub struct NewEmail {
    pub title: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub email_type: EmailType,
    pub status: EmailStatus,
}

/// UpdateEmail model for partial updates
#[derive(Debug, AsChangeset, Deserialize, Clone, Default)]
#[diesel(table_name = crate::schema::emails)]
pub struct UpdateEmail {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
    pub email_type: Option<EmailType>,
    pub status: Option<EmailStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_status_serde() {
        assert_eq!(
            serde_json::to_string(&EmailStatus::Archived).unwrap(),
            "\"archived\""
        );
        let parsed: EmailType = serde_json::from_str("\"marketing\"").unwrap();
        assert_eq!(parsed, EmailType::Marketing);
    }
}
