//! Narrow interfaces to the stores a transition touches.
//!
//! Mutating methods require a [`ServiceRole`]; reads of shared data do not.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::ServiceRole;
use crate::errors::{AssetCleanupError, DataAccessError};
use crate::models::{EventCandidate, EventDay, RawMapLocation, TourPhase, TourStatus};

/// Participant records.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Sets `was_active_last_year` on every active participant.
    ///
    /// Returns the number of active participants, whether or not their flag
    /// was already set.
    async fn mark_active_as_last_year(&self, role: &ServiceRole) -> Result<u64, DataAccessError>;
}

/// Event records.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Flags every current, non day-trip event as last year's.
    ///
    /// Returns the number of events newly flagged.
    async fn flag_current_as_last_year(&self, role: &ServiceRole) -> Result<u64, DataAccessError>;

    /// Lists every event flagged as last year's, ordered by id.
    async fn list_last_year(
        &self,
        role: &ServiceRole,
    ) -> Result<Vec<EventCandidate>, DataAccessError>;

    /// Deletes the given events. Returns the number of rows removed.
    async fn delete_by_ids(&self, role: &ServiceRole, ids: &[i64])
        -> Result<u64, DataAccessError>;
}

/// Event-day records.
#[async_trait]
pub trait EventDayStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<EventDay>, DataAccessError>;
}

/// Joined location/participant/hub view used by the map.
#[async_trait]
pub trait MapAggregator: Send + Sync {
    async fn aggregate(&self) -> Result<Vec<RawMapLocation>, DataAccessError>;
}

/// Managed binary asset storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AssetCleanupError>;
}

/// The singleton tour status row.
#[async_trait]
pub trait TourStatusStore: Send + Sync {
    async fn read(&self) -> Result<TourStatus, DataAccessError>;

    /// Replaces phase, both snapshots and `updated_at`.
    async fn write(&self, role: &ServiceRole, status: &TourStatus) -> Result<(), DataAccessError>;

    /// Updates only the phase and `updated_at`, leaving snapshots untouched.
    async fn set_phase(
        &self,
        role: &ServiceRole,
        phase: TourPhase,
        now: DateTime<Utc>,
    ) -> Result<TourStatus, DataAccessError>;
}
