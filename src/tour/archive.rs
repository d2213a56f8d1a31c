//! Single-purpose wrappers around the participant, event and event-day stores.

use std::sync::Arc;

use crate::auth::ServiceRole;
use crate::errors::DataAccessError;
use crate::models::{EventCandidate, EventDaySnapshot};

use super::store::{EventDayStore, EventStore, ParticipantStore};

/// Carries active participants over as last year's participants.
#[derive(Clone)]
pub struct ParticipantArchiver {
    store: Arc<dyn ParticipantStore>,
}

impl ParticipantArchiver {
    pub fn new(store: Arc<dyn ParticipantStore>) -> Self {
        Self { store }
    }

    /// Returns the number of participants active at archive time.
    pub async fn archive_active(&self, role: &ServiceRole) -> Result<u64, DataAccessError> {
        let count = self.store.mark_active_as_last_year(role).await?;
        tracing::info!(participants = count, "flagged active participants as last year's");
        Ok(count)
    }
}

/// Flags and purges last year's events.
#[derive(Clone)]
pub struct EventArchiver {
    store: Arc<dyn EventStore>,
}

impl EventArchiver {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn flag_current(&self, role: &ServiceRole) -> Result<u64, DataAccessError> {
        let flagged = self.store.flag_current_as_last_year(role).await?;
        tracing::info!(events = flagged, "flagged current events as last year's");
        Ok(flagged)
    }

    pub async fn last_year_candidates(
        &self,
        role: &ServiceRole,
    ) -> Result<Vec<EventCandidate>, DataAccessError> {
        let candidates = self.store.list_last_year(role).await?;
        tracing::debug!(candidates = candidates.len(), "loaded last year's events");
        Ok(candidates)
    }

    /// Deletes the events in one batch. An empty list is a no-op.
    pub async fn delete_batch(
        &self,
        role: &ServiceRole,
        ids: &[i64],
    ) -> Result<u64, DataAccessError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.store.delete_by_ids(role, ids).await?;
        if deleted != ids.len() as u64 {
            // Rows removed by a previous, interrupted open() are simply gone.
            tracing::warn!(
                requested = ids.len(),
                deleted,
                "event batch delete removed fewer rows than requested"
            );
        }
        Ok(deleted)
    }
}

/// Reads all event days as frozen snapshots.
#[derive(Clone)]
pub struct EventDaySnapshotReader {
    store: Arc<dyn EventDayStore>,
}

impl EventDaySnapshotReader {
    pub fn new(store: Arc<dyn EventDayStore>) -> Self {
        Self { store }
    }

    /// Every event-day row, copied verbatim and ordered by day id.
    pub async fn read_snapshot(&self) -> Result<Vec<EventDaySnapshot>, DataAccessError> {
        let mut days: Vec<EventDaySnapshot> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .map(|day| EventDaySnapshot {
                day_id: day.id,
                label: day.label,
                date: day.date,
            })
            .collect();
        days.sort_by_key(|day| day.day_id);
        Ok(days)
    }
}
