//! Sequencing of the close and open transitions.
//!
//! Steps run in order and stop at the first failure. Nothing is rolled back:
//! each mutating step is idempotent, so the recovery for any failure is to
//! run the whole flow again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::auth::ServiceRole;
use crate::errors::{DataAccessError, TourError, TourStep};
use crate::models::{AssetFailure, CloseSummary, OpenSummary, TourPhase, TourStatus};

use super::archive::{EventArchiver, EventDaySnapshotReader, ParticipantArchiver};
use super::assets::{AssetCleaner, AssetOutcome};
use super::snapshot::MapSnapshotBuilder;
use super::store::{EventDayStore, EventStore, MapAggregator, ParticipantStore, TourStatusStore};

/// The stores a transition reads and writes.
#[derive(Clone)]
pub struct TourStores {
    pub participants: Arc<dyn ParticipantStore>,
    pub events: Arc<dyn EventStore>,
    pub event_days: Arc<dyn EventDayStore>,
    pub map: Arc<dyn MapAggregator>,
    pub status: Arc<dyn TourStatusStore>,
}

/// Timing knobs for transitions.
#[derive(Debug, Clone, Copy)]
pub struct TransitionSettings {
    /// Deadline for each individual step.
    pub step_timeout: Duration,
    /// Extra attempts for the status write once events are deleted.
    pub status_write_retries: u32,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(30),
            status_write_retries: 3,
        }
    }
}

/// Coordinates `close()`, `open()` and the raw status fallback.
pub struct TourLifecycleOrchestrator {
    participants: ParticipantArchiver,
    events: EventArchiver,
    event_days: EventDaySnapshotReader,
    map: MapSnapshotBuilder,
    assets: AssetCleaner,
    status: Arc<dyn TourStatusStore>,
    settings: TransitionSettings,
    // Held for the duration of a structured transition in this process.
    in_flight: Mutex<()>,
}

impl TourLifecycleOrchestrator {
    pub fn new(stores: TourStores, assets: AssetCleaner, settings: TransitionSettings) -> Self {
        Self {
            participants: ParticipantArchiver::new(stores.participants),
            events: EventArchiver::new(stores.events),
            event_days: EventDaySnapshotReader::new(stores.event_days),
            map: MapSnapshotBuilder::new(stores.map),
            assets,
            status: stores.status,
            settings,
            in_flight: Mutex::new(()),
        }
    }

    /// Reads the current lifecycle record.
    pub async fn current_status(&self) -> Result<TourStatus, DataAccessError> {
        self.status.read().await
    }

    /// Archives the running tour: `new -> older`.
    pub async fn close(&self, role: &ServiceRole) -> Result<(TourStatus, CloseSummary), TourError> {
        let _guard = self.in_flight.try_lock().map_err(|_| TourError::Busy)?;
        let span = tracing::info_span!(
            "tour_transition",
            invocation_id = %role.invocation_id(),
            granted_to = %role.granted_to(),
            action = "close"
        );

        async {
            tracing::info!("closing tour");

            let participant_count = self
                .bounded(TourStep::Participants, self.participants.archive_active(role))
                .await?;
            let flagged_events_count = self
                .bounded(TourStep::Events, self.events.flag_current(role))
                .await?;

            // Both are pure reads, so they can run side by side.
            let (event_days, map_info) = tokio::join!(
                self.bounded(TourStep::EventDays, self.event_days.read_snapshot()),
                self.bounded(TourStep::MapSnapshot, self.map.capture()),
            );
            let event_days = event_days?;
            let map_info = map_info?;

            let event_days_count = event_days.len();
            let map_locations_count = map_info.len();
            let status = TourStatus::archived(event_days, map_info, Utc::now());

            self.bounded(TourStep::StatusWrite, self.status.write(role, &status))
                .await?;

            let summary = CloseSummary {
                participant_count,
                flagged_events_count,
                map_locations_count,
                event_days_count,
                message: format!(
                    "Tour closed: {} participants carried over, {} events archived, {} event days and {} map locations frozen",
                    participant_count, flagged_events_count, event_days_count, map_locations_count
                ),
            };
            tracing::info!(
                participants = participant_count,
                events = flagged_events_count,
                event_days = event_days_count,
                map_locations = map_locations_count,
                "tour closed"
            );
            Ok::<_, TourError>((status, summary))
        }
        .instrument(span)
        .await
    }

    /// Purges the archived tour: `older -> new`.
    pub async fn open(&self, role: &ServiceRole) -> Result<(TourStatus, OpenSummary), TourError> {
        let _guard = self.in_flight.try_lock().map_err(|_| TourError::Busy)?;
        let span = tracing::info_span!(
            "tour_transition",
            invocation_id = %role.invocation_id(),
            granted_to = %role.granted_to(),
            action = "open"
        );

        async {
            tracing::info!("opening tour");

            let candidates = self
                .bounded(TourStep::Events, self.events.last_year_candidates(role))
                .await?;

            let mut assets_deleted = 0;
            let mut assets_skipped = 0;
            let mut asset_failures = Vec::new();
            for candidate in &candidates {
                let Some(url) = candidate.image_url.as_deref() else {
                    assets_skipped += 1;
                    continue;
                };
                match self.assets.clean(url).await {
                    AssetOutcome::Deleted(object) => {
                        tracing::debug!(event_id = candidate.id, key = %object.key, "removed event image");
                        assets_deleted += 1;
                    }
                    AssetOutcome::Skipped => assets_skipped += 1,
                    AssetOutcome::Failed(err) => {
                        tracing::warn!(event_id = candidate.id, url, error = %err, "event image cleanup failed");
                        asset_failures.push(AssetFailure {
                            event_id: candidate.id,
                            image_url: url.to_string(),
                            reason: err.to_string(),
                        });
                    }
                }
            }

            let ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
            let deleted_events_count = self
                .bounded(TourStep::EventDelete, self.events.delete_batch(role, &ids))
                .await?;

            let status = TourStatus::fresh(Utc::now());
            self.write_status_with_retry(role, &status).await?;

            let summary = OpenSummary {
                deleted_events_count,
                assets_deleted,
                assets_skipped,
                message: format!(
                    "Tour opened: {} archived events deleted ({} images removed, {} skipped, {} failed)",
                    deleted_events_count,
                    assets_deleted,
                    assets_skipped,
                    asset_failures.len()
                ),
                asset_failures,
            };
            tracing::info!(
                events = deleted_events_count,
                assets_deleted,
                assets_skipped,
                assets_failed = summary.asset_failures.len(),
                "tour opened"
            );
            Ok::<_, TourError>((status, summary))
        }
        .instrument(span)
        .await
    }

    /// Writes the phase alone, with no archival work and no snapshot change.
    ///
    /// For manual correction only; never a substitute for `close`/`open`.
    /// Rejected while a transition is running, since its final status write
    /// would overwrite the correction.
    pub async fn set_status(
        &self,
        role: &ServiceRole,
        phase: TourPhase,
    ) -> Result<TourStatus, TourError> {
        let _guard = self.in_flight.try_lock().map_err(|_| TourError::Busy)?;
        tracing::warn!(
            invocation_id = %role.invocation_id(),
            phase = phase.as_str(),
            "writing raw tour status without archival"
        );
        self.bounded(
            TourStep::StatusWrite,
            self.status.set_phase(role, phase, Utc::now()),
        )
        .await
    }

    // Rows are already gone at this point, so the write is retried instead
    // of failing the flow on the first error.
    async fn write_status_with_retry(
        &self,
        role: &ServiceRole,
        status: &TourStatus,
    ) -> Result<(), TourError> {
        let mut attempt = 0;
        loop {
            match self
                .bounded(TourStep::StatusWrite, self.status.write(role, status))
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.settings.status_write_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "retrying tour status write");
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs one step under the step deadline and tags its failure.
    async fn bounded<T, F>(&self, step: TourStep, fut: F) -> Result<T, TourError>
    where
        F: Future<Output = Result<T, DataAccessError>>,
    {
        let result = match tokio::time::timeout(self.settings.step_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DataAccessError::Timeout(self.settings.step_timeout)),
        };
        result.map_err(|source| {
            tracing::error!(step = step.as_str(), error = %source, "tour step failed");
            TourError::step(step, source)
        })
    }
}
