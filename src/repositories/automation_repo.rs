//! Automation repository for async database operations.
//!
//! An automation row and its sequence links are written together inside a
//! transaction so a half-created sequence can never become visible.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    Automation, AutomationEmailLink, NewAutomation, NewAutomationEmailLink, SequenceStep,
    TriggerType, UpdateAutomation,
};

/// Automation repository
#[derive(Clone)]
pub struct AutomationRepository {
    pool: AsyncDbPool,
}

impl AutomationRepository {
    /// Creates a new AutomationRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Creates an automation together with its email sequence.
    ///
    /// # Arguments
    /// * `new_automation` - The automation definition to insert
    /// * `steps` - Sequence steps, already validated and ordered
    ///
    /// # Returns
    /// The created automation and its persisted sequence links
    pub async fn create(
        &self,
        new_automation: NewAutomation,
        steps: Vec<SequenceStep>,
    ) -> AppResult<(Automation, Vec<AutomationEmailLink>)> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        conn.transaction::<(Automation, Vec<AutomationEmailLink>), AppError, _>(|conn| {
            async move {
                let automation: Automation =
                    diesel::insert_into(crate::schema::automations::table)
                        .values(&new_automation)
                        .returning(Automation::as_returning())
                        .get_result(conn)
                        .await?;

                let links = insert_links(conn, automation.id, &steps).await?;

                Ok((automation, links))
            }
            .scope_boxed()
        })
        .await
    }

    /// Finds an automation by its ID.
    ///
    /// # Returns
    /// `Some(Automation)` if found, `None` otherwise
    pub async fn find_by_id(&self, automation_id: i32) -> AppResult<Option<Automation>> {
        use crate::schema::automations::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automations
            .filter(id.eq(automation_id))
            .select(Automation::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists automations with pagination, newest first.
    ///
    /// # Returns
    /// Tuple of (automations vector, total count)
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Automation>, i64)> {
        use crate::schema::automations::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let rows = automations
            .order(created_at.desc())
            .offset(offset)
            .limit(limit)
            .select(Automation::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = automations
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((rows, total))
    }

    /// Lists active automations matching a trigger type.
    pub async fn list_active_by_trigger(
        &self,
        trigger: TriggerType,
    ) -> AppResult<Vec<Automation>> {
        use crate::schema::automations::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automations
            .filter(is_active.eq(true))
            .filter(trigger_type.eq(trigger))
            .order(id.asc())
            .select(Automation::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Updates an automation, optionally replacing its entire email sequence.
    ///
    /// When `steps` is given, the old sequence links are deleted and the new
    /// steps inserted in their place, all inside one transaction. When it is
    /// `None` the existing sequence is left untouched.
    ///
    /// # Returns
    /// The updated automation and its current sequence links
    pub async fn update(
        &self,
        automation_id: i32,
        changes: UpdateAutomation,
        steps: Option<Vec<SequenceStep>>,
    ) -> AppResult<(Automation, Vec<AutomationEmailLink>)> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        conn.transaction::<(Automation, Vec<AutomationEmailLink>), AppError, _>(|conn| {
            async move {
                let automation: Automation = diesel::update(
                    crate::schema::automations::table
                        .filter(crate::schema::automations::id.eq(automation_id)),
                )
                .set(&changes)
                .returning(Automation::as_returning())
                .get_result(conn)
                .await
                .map_err(|e| match e {
                    diesel::result::Error::NotFound => AppError::NotFound {
                        entity: "automations".to_string(),
                        field: "id".to_string(),
                        value: automation_id.to_string(),
                    },
                    _ => AppError::from(e),
                })?;

                let links = match steps {
                    Some(steps) => {
                        diesel::delete(
                            crate::schema::automation_email_links::table.filter(
                                crate::schema::automation_email_links::automation_id
                                    .eq(automation_id),
                            ),
                        )
                        .execute(conn)
                        .await?;

                        insert_links(conn, automation_id, &steps).await?
                    }
                    None => {
                        crate::schema::automation_email_links::table
                            .filter(
                                crate::schema::automation_email_links::automation_id
                                    .eq(automation_id),
                            )
                            .order(crate::schema::automation_email_links::sequence_order.asc())
                            .select(AutomationEmailLink::as_select())
                            .load(conn)
                            .await?
                    }
                };

                Ok((automation, links))
            }
            .scope_boxed()
        })
        .await
    }

    /// Deletes an automation. Its sequence links go with it (cascade).
    ///
    /// # Errors
    /// `AppError::NotFound` if no automation with this ID exists
    pub async fn delete(&self, automation_id: i32) -> AppResult<()> {
        use crate::schema::automations::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        let deleted = diesel::delete(automations.filter(id.eq(automation_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)?;

        if deleted == 0 {
            Err(AppError::NotFound {
                entity: "automations".to_string(),
                field: "id".to_string(),
                value: automation_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Loads the email sequence of one automation, in sequence order.
    pub async fn links_for(&self, aid: i32) -> AppResult<Vec<AutomationEmailLink>> {
        use crate::schema::automation_email_links::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automation_email_links
            .filter(automation_id.eq(aid))
            .order(sequence_order.asc())
            .select(AutomationEmailLink::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Loads the sequences of several automations at once, grouped by caller.
    ///
    /// Rows come back ordered by automation, then by sequence position.
    pub async fn links_for_automations(
        &self,
        automation_ids: &[i32],
    ) -> AppResult<Vec<AutomationEmailLink>> {
        use crate::schema::automation_email_links::dsl::*;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AppError::ConnectionPool {
                source: anyhow::Error::from(e),
            })?;

        automation_email_links
            .filter(automation_id.eq_any(automation_ids))
            .order((automation_id.asc(), sequence_order.asc()))
            .select(AutomationEmailLink::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

/// Inserts sequence links for an automation inside an open transaction.
async fn insert_links(
    conn: &mut diesel_async::AsyncPgConnection,
    aid: i32,
    steps: &[SequenceStep],
) -> AppResult<Vec<AutomationEmailLink>> {
    if steps.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<NewAutomationEmailLink> = steps
        .iter()
        .map(|step| NewAutomationEmailLink {
            automation_id: aid,
            email_id: step.email_id,
            sequence_order: step.sequence_order,
            delay_hours: step.delay_hours,
        })
        .collect();

    diesel::insert_into(crate::schema::automation_email_links::table)
        .values(&rows)
        .returning(AutomationEmailLink::as_returning())
        .get_results(conn)
        .await
        .map_err(AppError::from)
}
