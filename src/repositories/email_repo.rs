//! Email repository for async database operations.
//!
//! Provides CRUD operations for the emails table using diesel_async.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Email, NewEmail, UpdateEmail};

/// Email repository
#[derive(Clone)]
pub struct EmailRepository {
    pool: AsyncDbPool,
}

impl EmailRepository {
    /// Creates a new EmailRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Creates a new email template.
    ///
    /// # Returns
    /// The created email with generated id and timestamps
    pub async fn create(&self, new_email: NewEmail) -> AppResult<Email> {
        use crate::schema::emails::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::insert_into(emails)
            .values(&new_email)
            .returning(Email::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Finds an email by its ID.
    ///
    /// # Returns
    /// `Some(Email)` if found, `None` otherwise
    pub async fn find_by_id(&self, email_id: i32) -> AppResult<Option<Email>> {
        use crate::schema::emails::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        emails
            .filter(id.eq(email_id))
            .select(Email::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Loads a batch of emails by ID, for resolving sequence references.
    pub async fn find_by_ids(&self, email_ids: &[i32]) -> AppResult<Vec<Email>> {
        use crate::schema::emails::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        emails
            .filter(id.eq_any(email_ids))
            .select(Email::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Lists emails with pagination, newest first.
    ///
    /// # Returns
    /// Tuple of (emails vector, total count)
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Email>, i64)> {
        use crate::schema::emails::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let rows = emails
            .order(created_at.desc())
            .offset(offset)
            .limit(limit)
            .select(Email::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = emails
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((rows, total))
    }

    /// Updates an email template's data.
    ///
    /// # Errors
    /// `AppError::NotFound` if no email with this ID exists
    pub async fn update(&self, email_id: i32, changes: UpdateEmail) -> AppResult<Email> {
        use crate::schema::emails::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        diesel::update(emails.filter(id.eq(email_id)))
            .set(&changes)
            .returning(Email::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AppError::NotFound {
                    entity: "emails".to_string(),
                    field: "id".to_string(),
                    value: email_id.to_string(),
                },
                _ => AppError::from(e),
            })
    }

    /// Deletes an email template.
    ///
    /// # Errors
    /// `AppError::NotFound` if no email with this ID exists
    pub async fn delete(&self, email_id: i32) -> AppResult<()> {
        use crate::schema::emails::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let deleted = diesel::delete(emails.filter(id.eq(email_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        if deleted == 0 {
            Err(AppError::NotFound {
                entity: "emails".to_string(),
                field: "id".to_string(),
                value: email_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Counts sequence links that still reference an email.
    ///
    /// Used before delete: an email that is part of an automation sequence
    /// must not disappear out from under it.
    pub async fn linked_automation_count(&self, eid: i32) -> AppResult<i64> {
        use crate::schema::automation_email_links::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automation_email_links
            .filter(email_id.eq(eid))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
