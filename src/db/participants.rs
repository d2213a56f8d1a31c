//! Participant flags touched by tour transitions.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::auth::ServiceRole;
use crate::errors::DataAccessError;
use crate::tour::ParticipantStore;

#[derive(Clone)]
pub struct SqliteParticipantStore {
    pool: SqlitePool,
}

impl SqliteParticipantStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantStore for SqliteParticipantStore {
    async fn mark_active_as_last_year(&self, role: &ServiceRole) -> Result<u64, DataAccessError> {
        let mut tx = self.pool.begin().await?;

        let (active,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM participants WHERE is_active = 1")
                .fetch_one(&mut *tx)
                .await?;

        // The flag is only ever raised here, never cleared.
        let result = sqlx::query(
            "UPDATE participants SET was_active_last_year = 1 WHERE is_active = 1 AND was_active_last_year = 0",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            invocation_id = %role.invocation_id(),
            active,
            newly_flagged = result.rows_affected(),
            "participants carried over"
        );
        Ok(active as u64)
    }
}
