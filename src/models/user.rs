use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;

/// Recipient contact record. Provisioned by the embedding application; this
/// service only reads it for delivery addressing.
#[derive(Debug, Queryable, Selectable, Serialize, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}
