//! Event and event-day access for tour transitions.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::auth::ServiceRole;
use crate::errors::DataAccessError;
use crate::models::{EventCandidate, EventDay};
use crate::tour::{EventDayStore, EventStore};

/// Keeps each DELETE well under SQLite's bound-parameter limit.
const DELETE_CHUNK: usize = 500;

#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn flag_current_as_last_year(&self, role: &ServiceRole) -> Result<u64, DataAccessError> {
        let result = sqlx::query(
            "UPDATE events SET is_last_year_event = 1 WHERE event_day_out = 0 AND is_last_year_event = 0",
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            invocation_id = %role.invocation_id(),
            flagged = result.rows_affected(),
            "events flagged as last year's"
        );
        Ok(result.rows_affected())
    }

    async fn list_last_year(
        &self,
        _role: &ServiceRole,
    ) -> Result<Vec<EventCandidate>, DataAccessError> {
        let rows =
            sqlx::query("SELECT id, image_url FROM events WHERE is_last_year_event = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| -> Result<EventCandidate, DataAccessError> {
                Ok(EventCandidate {
                    id: row.try_get("id")?,
                    image_url: row.try_get("image_url")?,
                })
            })
            .collect()
    }

    async fn delete_by_ids(
        &self,
        role: &ServiceRole,
        ids: &[i64],
    ) -> Result<u64, DataAccessError> {
        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for chunk in ids.chunks(DELETE_CHUNK) {
            let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM events WHERE id IN (");
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            deleted += query.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(
            invocation_id = %role.invocation_id(),
            requested = ids.len(),
            deleted,
            "events deleted"
        );
        Ok(deleted)
    }
}

#[derive(Clone)]
pub struct SqliteEventDayStore {
    pool: SqlitePool,
}

impl SqliteEventDayStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventDayStore for SqliteEventDayStore {
    async fn list_all(&self) -> Result<Vec<EventDay>, DataAccessError> {
        let rows = sqlx::query("SELECT id, label, date FROM event_days ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<EventDay, DataAccessError> {
                Ok(EventDay {
                    id: row.try_get("id")?,
                    label: row.try_get("label")?,
                    date: row.try_get("date")?,
                })
            })
            .collect()
    }
}
