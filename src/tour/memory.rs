//! In-memory stores for exercising transitions in tests.
//!
//! [`InMemoryPlatform`] implements every record store over plain vectors and
//! can be told to fail or hang at a chosen [`FailPoint`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::ServiceRole;
use crate::errors::{AssetCleanupError, DataAccessError};
use crate::models::{EventCandidate, EventDay, RawMapLocation, TourPhase, TourStatus};

use super::store::{
    BlobStore, EventDayStore, EventStore, MapAggregator, ParticipantStore, TourStatusStore,
};

/// Store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    MarkParticipants,
    FlagEvents,
    ListLastYearEvents,
    DeleteEvents,
    ListEventDays,
    Aggregate,
    WriteStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemParticipant {
    pub id: String,
    pub is_active: bool,
    pub was_active_last_year: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemEvent {
    pub id: i64,
    pub is_last_year_event: bool,
    pub event_day_out: bool,
    pub image_url: Option<String>,
}

pub struct InMemoryPlatform {
    pub participants: Mutex<Vec<MemParticipant>>,
    pub events: Mutex<Vec<MemEvent>>,
    pub event_days: Mutex<Vec<EventDay>>,
    pub locations: Mutex<Vec<RawMapLocation>>,
    pub status: Mutex<TourStatus>,
    failing: Mutex<HashSet<FailPoint>>,
    hanging: Mutex<HashSet<FailPoint>>,
    status_write_failures: AtomicU32,
    status_writes: AtomicUsize,
}

impl Default for InMemoryPlatform {
    fn default() -> Self {
        Self {
            participants: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            event_days: Mutex::new(Vec::new()),
            locations: Mutex::new(Vec::new()),
            status: Mutex::new(TourStatus::fresh(Utc::now())),
            failing: Mutex::new(HashSet::new()),
            hanging: Mutex::new(HashSet::new()),
            status_write_failures: AtomicU32::new(0),
            status_writes: AtomicUsize::new(0),
        }
    }
}

impl InMemoryPlatform {
    pub fn add_participant(&self, id: &str, is_active: bool) {
        self.participants.lock().unwrap().push(MemParticipant {
            id: id.to_string(),
            is_active,
            was_active_last_year: false,
        });
    }

    pub fn add_event(
        &self,
        id: i64,
        is_last_year_event: bool,
        event_day_out: bool,
        image_url: Option<&str>,
    ) {
        self.events.lock().unwrap().push(MemEvent {
            id,
            is_last_year_event,
            event_day_out,
            image_url: image_url.map(str::to_string),
        });
    }

    pub fn add_event_day(&self, id: i64, label: &str, date: NaiveDate) {
        self.event_days.lock().unwrap().push(EventDay {
            id,
            label: label.to_string(),
            date,
        });
    }

    pub fn add_location(&self, location: RawMapLocation) {
        self.locations.lock().unwrap().push(location);
    }

    pub fn set_status(&self, status: TourStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.failing.lock().unwrap().insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.failing.lock().unwrap().remove(&point);
    }

    pub fn hang_at(&self, point: FailPoint) {
        self.hanging.lock().unwrap().insert(point);
    }

    /// Makes the next `count` status writes fail.
    pub fn fail_status_writes(&self, count: u32) {
        self.status_write_failures.store(count, Ordering::SeqCst);
    }

    pub fn status_write_attempts(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    pub fn current_status(&self) -> TourStatus {
        self.status.lock().unwrap().clone()
    }

    pub fn participant(&self, id: &str) -> MemParticipant {
        self.participants
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap()
    }

    pub fn event(&self, id: i64) -> Option<MemEvent> {
        self.events.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }

    async fn check(&self, point: FailPoint) -> Result<(), DataAccessError> {
        let hang = self.hanging.lock().unwrap().contains(&point);
        if hang {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(&point) {
            return Err(DataAccessError::Backend(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for InMemoryPlatform {
    async fn mark_active_as_last_year(&self, _role: &ServiceRole) -> Result<u64, DataAccessError> {
        self.check(FailPoint::MarkParticipants).await?;
        let mut participants = self.participants.lock().unwrap();
        let mut active = 0;
        for participant in participants.iter_mut().filter(|p| p.is_active) {
            participant.was_active_last_year = true;
            active += 1;
        }
        Ok(active)
    }
}

#[async_trait]
impl EventStore for InMemoryPlatform {
    async fn flag_current_as_last_year(&self, _role: &ServiceRole) -> Result<u64, DataAccessError> {
        self.check(FailPoint::FlagEvents).await?;
        let mut events = self.events.lock().unwrap();
        let mut flagged = 0;
        for event in events
            .iter_mut()
            .filter(|e| !e.event_day_out && !e.is_last_year_event)
        {
            event.is_last_year_event = true;
            flagged += 1;
        }
        Ok(flagged)
    }

    async fn list_last_year(
        &self,
        _role: &ServiceRole,
    ) -> Result<Vec<EventCandidate>, DataAccessError> {
        self.check(FailPoint::ListLastYearEvents).await?;
        let mut candidates: Vec<EventCandidate> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.is_last_year_event)
            .map(|e| EventCandidate {
                id: e.id,
                image_url: e.image_url.clone(),
            })
            .collect();
        candidates.sort_by_key(|c| c.id);
        Ok(candidates)
    }

    async fn delete_by_ids(
        &self,
        _role: &ServiceRole,
        ids: &[i64],
    ) -> Result<u64, DataAccessError> {
        self.check(FailPoint::DeleteEvents).await?;
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| !ids.contains(&e.id));
        Ok((before - events.len()) as u64)
    }
}

#[async_trait]
impl EventDayStore for InMemoryPlatform {
    async fn list_all(&self) -> Result<Vec<EventDay>, DataAccessError> {
        self.check(FailPoint::ListEventDays).await?;
        Ok(self.event_days.lock().unwrap().clone())
    }
}

#[async_trait]
impl MapAggregator for InMemoryPlatform {
    async fn aggregate(&self) -> Result<Vec<RawMapLocation>, DataAccessError> {
        self.check(FailPoint::Aggregate).await?;
        Ok(self.locations.lock().unwrap().clone())
    }
}

#[async_trait]
impl TourStatusStore for InMemoryPlatform {
    async fn read(&self) -> Result<TourStatus, DataAccessError> {
        Ok(self.current_status())
    }

    async fn write(&self, _role: &ServiceRole, status: &TourStatus) -> Result<(), DataAccessError> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::WriteStatus).await?;
        let remaining = self.status_write_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.status_write_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DataAccessError::Backend("injected status write failure".to_string()));
        }
        *self.status.lock().unwrap() = status.clone();
        Ok(())
    }

    async fn set_phase(
        &self,
        _role: &ServiceRole,
        phase: TourPhase,
        now: DateTime<Utc>,
    ) -> Result<TourStatus, DataAccessError> {
        self.check(FailPoint::WriteStatus).await?;
        let mut status = self.status.lock().unwrap();
        status.current_tour_status = phase;
        status.updated_at = now;
        Ok(status.clone())
    }
}

/// Blob store that records deletes and fails for chosen keys.
#[derive(Default)]
pub struct RecordingBlobStore {
    deleted: Mutex<Vec<(String, String)>>,
    failing_keys: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
}

impl RecordingBlobStore {
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AssetCleanupError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(AssetCleanupError::Rejected {
                status: 500,
                body: "injected".to_string(),
            });
        }
        self.deleted
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}
