//! Automation models for database operations.
//!
//! An automation maps a behavioral trigger to an ordered email sequence; the
//! sequence itself is stored as `automation_email_links` rows owned by the
//! automation.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Originating event class that can activate automations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, DbEnum,
)]
#[db_enum(existing_type_path = "crate::schema::sql_types::TriggerType")]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Signup,
    Purchase,
    Inactivity,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerType::Signup => write!(f, "signup"),
            TriggerType::Purchase => write!(f, "purchase"),
            TriggerType::Inactivity => write!(f, "inactivity"),
        }
    }
}

/// Automation model for reading from database
#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::automations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Automation {
    pub id: i32,
    pub name: String,
    pub trigger_type: TriggerType,
    pub trigger_conditions: Option<JsonValue>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// NewAutomation model for inserting new records
#[derive(Debug, Insertable, Deserialize, Clone)]
#[diesel(table_name = crate::schema::automations)]
pub struct NewAutomation {
    pub name: String,
    pub trigger_type: TriggerType,
    pub trigger_conditions: Option<JsonValue>,
    pub is_active: bool,
}

/// UpdateAutomation model for partial updates
#[derive(Debug, AsChangeset, Deserialize, Clone, Default)]
#[diesel(table_name = crate::schema::automations)]
pub struct UpdateAutomation {
    pub name: Option<String>,
    pub trigger_type: Option<TriggerType>,
    pub trigger_conditions: Option<Option<JsonValue>>,
    pub is_active: Option<bool>,
}

/// One step of an automation's email sequence
#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::automation_email_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AutomationEmailLink {
    pub id: i32,
    pub automation_id: i32,
    pub email_id: i32,
    pub sequence_order: i32,
    pub delay_hours: i32,
}

/// NewAutomationEmailLink model for (re)inserting a sequence
#[derive(Debug, Insertable, Deserialize, Clone)]
#[diesel(table_name = crate::schema::automation_email_links)]
pub struct NewAutomationEmailLink {
    pub automation_id: i32,
    pub email_id: i32,
    pub sequence_order: i32,
    pub delay_hours: i32,
}

/// One sequence step before the owning automation row exists. The repository
/// attaches the automation id when it persists the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStep {
    pub email_id: i32,
    pub sequence_order: i32,
    pub delay_hours: i32,
}
