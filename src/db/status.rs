//! Persistence of the singleton tour status row.
//!
//! Snapshots are stored as JSON documents; SQL `NULL` means "no snapshot",
//! which is distinct from an empty JSON array.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::auth::ServiceRole;
use crate::errors::DataAccessError;
use crate::models::{TourPhase, TourStatus, TOUR_STATUS_ID};
use crate::tour::TourStatusStore;

#[derive(Clone)]
pub struct SqliteTourStatusStore {
    pool: SqlitePool,
}

impl SqliteTourStatusStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TourStatusStore for SqliteTourStatusStore {
    async fn read(&self) -> Result<TourStatus, DataAccessError> {
        let row = sqlx::query(
            "SELECT current_tour_status, previous_tour_event_days, previous_tour_map_info, updated_at FROM tour_status WHERE id = ?",
        )
        .bind(TOUR_STATUS_ID)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(missing_row)?;

        status_from_row(&row)
    }

    async fn write(&self, role: &ServiceRole, status: &TourStatus) -> Result<(), DataAccessError> {
        let event_days = status
            .previous_tour_event_days
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let map_info = status
            .previous_tour_map_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"UPDATE tour_status SET
                current_tour_status = ?, previous_tour_event_days = ?,
                previous_tour_map_info = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(status.current_tour_status.as_str())
        .bind(&event_days)
        .bind(&map_info)
        .bind(status.updated_at)
        .bind(TOUR_STATUS_ID)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(missing_row());
        }

        tracing::debug!(
            invocation_id = %role.invocation_id(),
            phase = status.current_tour_status.as_str(),
            "tour status written"
        );
        Ok(())
    }

    async fn set_phase(
        &self,
        _role: &ServiceRole,
        phase: TourPhase,
        now: DateTime<Utc>,
    ) -> Result<TourStatus, DataAccessError> {
        let result = sqlx::query(
            "UPDATE tour_status SET current_tour_status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(phase.as_str())
        .bind(now)
        .bind(TOUR_STATUS_ID)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(missing_row());
        }

        self.read().await
    }
}

fn missing_row() -> DataAccessError {
    DataAccessError::Backend(format!("tour status row {} is missing", TOUR_STATUS_ID))
}

fn status_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TourStatus, DataAccessError> {
    let phase: String = row.try_get("current_tour_status")?;
    let event_days: Option<String> = row.try_get("previous_tour_event_days")?;
    let map_info: Option<String> = row.try_get("previous_tour_map_info")?;

    Ok(TourStatus {
        current_tour_status: TourPhase::parse(&phase).ok_or_else(|| {
            DataAccessError::Backend(format!("unknown tour status {:?}", phase))
        })?,
        previous_tour_event_days: event_days
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        previous_tour_map_info: map_info.as_deref().map(serde_json::from_str).transpose()?,
        updated_at: row.try_get("updated_at")?,
    })
}
