//! Tour lifecycle record and its frozen snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Well-known id of the singleton tour status row.
pub const TOUR_STATUS_ID: i64 = 1;

/// Lifecycle state of the current tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourPhase {
    /// A tour is being prepared or running.
    New,
    /// The previous tour is archived and its snapshots are frozen.
    Older,
}

impl TourPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourPhase::New => "new",
            TourPhase::Older => "older",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(TourPhase::New),
            "older" => Some(TourPhase::Older),
            _ => None,
        }
    }
}

/// Frozen copy of one event day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDaySnapshot {
    pub day_id: i64,
    pub label: String,
    pub date: NaiveDate,
}

/// Frozen copy of a participant shown at a location.
///
/// Optional fields always serialize, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub user_id: String,
    pub user_name: String,
    pub is_host: bool,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub display_number: Option<String>,
}

/// Frozen copy of one map location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLocationSnapshot {
    pub id: i64,
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub participants: Vec<ParticipantRef>,
    pub is_hub: bool,
    pub is_collective: bool,
    pub is_special_program: bool,
    pub hub_name: Option<String>,
    pub hub_description: Option<String>,
    pub display_number: Option<String>,
    pub hub_display_number: Option<String>,
}

/// The singleton lifecycle record.
///
/// `Older` carries both snapshots, `New` carries neither. Only the raw
/// status fallback can write a phase without touching the snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourStatus {
    pub current_tour_status: TourPhase,
    pub previous_tour_event_days: Option<Vec<EventDaySnapshot>>,
    pub previous_tour_map_info: Option<Vec<MapLocationSnapshot>>,
    pub updated_at: DateTime<Utc>,
}

impl TourStatus {
    /// State written by `open()`: snapshots cleared.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            current_tour_status: TourPhase::New,
            previous_tour_event_days: None,
            previous_tour_map_info: None,
            updated_at: now,
        }
    }

    /// State written by `close()`: snapshots frozen.
    pub fn archived(
        event_days: Vec<EventDaySnapshot>,
        map_info: Vec<MapLocationSnapshot>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            current_tour_status: TourPhase::Older,
            previous_tour_event_days: Some(event_days),
            previous_tour_map_info: Some(map_info),
            updated_at: now,
        }
    }
}

/// Structured transition selected by a status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourAction {
    Close,
    Open,
}

impl TourAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "close" => Some(TourAction::Close),
            "open" => Some(TourAction::Open),
            _ => None,
        }
    }

    /// Phase the flow leaves the tour in.
    pub fn target_phase(&self) -> TourPhase {
        match self {
            TourAction::Close => TourPhase::Older,
            TourAction::Open => TourPhase::New,
        }
    }
}

/// Request body for `PUT /api/tour-status`.
///
/// Values stay as strings so malformed ones surface as validation errors.
#[derive(Debug, Clone, Deserialize)]
pub struct TourStatusRequest {
    pub current_tour_status: String,
    #[serde(default)]
    pub action: Option<String>,
}

/// Counters reported by `close()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSummary {
    pub participant_count: u64,
    pub flagged_events_count: u64,
    pub map_locations_count: usize,
    pub event_days_count: usize,
    pub message: String,
}

/// One asset that could not be deleted during `open()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFailure {
    pub event_id: i64,
    pub image_url: String,
    pub reason: String,
}

/// Counters reported by `open()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSummary {
    pub deleted_events_count: u64,
    pub assets_deleted: usize,
    pub assets_skipped: usize,
    pub asset_failures: Vec<AssetFailure>,
    pub message: String,
}

/// Response body for a tour status update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourTransitionResponse {
    pub tour_status: TourStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_locations_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_days_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_events_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_deleted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_skipped: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_failed: Option<Vec<AssetFailure>>,
}

impl TourTransitionResponse {
    pub fn from_close(tour_status: TourStatus, summary: CloseSummary) -> Self {
        Self {
            tour_status,
            message: summary.message,
            participant_count: Some(summary.participant_count),
            map_locations_count: Some(summary.map_locations_count),
            event_days_count: Some(summary.event_days_count),
            deleted_events_count: None,
            assets_deleted: None,
            assets_skipped: None,
            assets_failed: None,
        }
    }

    pub fn from_open(tour_status: TourStatus, summary: OpenSummary) -> Self {
        Self {
            tour_status,
            message: summary.message,
            participant_count: None,
            map_locations_count: None,
            event_days_count: None,
            deleted_events_count: Some(summary.deleted_events_count),
            assets_deleted: Some(summary.assets_deleted),
            assets_skipped: Some(summary.assets_skipped),
            assets_failed: Some(summary.asset_failures),
        }
    }

    pub fn from_raw(tour_status: TourStatus) -> Self {
        let message = format!(
            "Tour status set to `{}` without archival",
            tour_status.current_tour_status.as_str()
        );
        Self {
            tour_status,
            message,
            participant_count: None,
            map_locations_count: None,
            event_days_count: None,
            deleted_events_count: None,
            assets_deleted: None,
            assets_skipped: None,
            assets_failed: None,
        }
    }
}
