//! Normalization of the joined map view into storable snapshots.

use std::sync::Arc;

use crate::errors::DataAccessError;
use crate::models::{MapLocationSnapshot, ParticipantRef, RawMapLocation, RawMapParticipant};

use super::store::MapAggregator;

/// Captures the map view in its self-contained snapshot shape.
#[derive(Clone)]
pub struct MapSnapshotBuilder {
    aggregator: Arc<dyn MapAggregator>,
}

impl MapSnapshotBuilder {
    pub fn new(aggregator: Arc<dyn MapAggregator>) -> Self {
        Self { aggregator }
    }

    /// Queries the aggregation collaborator and normalizes its result.
    pub async fn capture(&self) -> Result<Vec<MapLocationSnapshot>, DataAccessError> {
        let raw = self.aggregator.aggregate().await?;
        let snapshot = normalize_locations(&raw);
        tracing::debug!(locations = snapshot.len(), "captured map snapshot");
        Ok(snapshot)
    }
}

/// Coerces every optional field to an explicit value or `None`.
///
/// Missing booleans become `false`; present strings are copied as they are.
/// The input is left untouched.
pub fn normalize_locations(raw: &[RawMapLocation]) -> Vec<MapLocationSnapshot> {
    raw.iter().map(normalize_location).collect()
}

fn normalize_location(location: &RawMapLocation) -> MapLocationSnapshot {
    MapLocationSnapshot {
        id: location.id,
        formatted_address: location.formatted_address.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
        participants: location
            .participants
            .iter()
            .map(normalize_participant)
            .collect(),
        is_hub: location.is_hub.unwrap_or(false),
        is_collective: location.is_collective.unwrap_or(false),
        is_special_program: location.is_special_program.unwrap_or(false),
        hub_name: location.hub_name.clone(),
        hub_description: location.hub_description.clone(),
        display_number: location.display_number.clone(),
        hub_display_number: location.hub_display_number.clone(),
    }
}

fn normalize_participant(participant: &RawMapParticipant) -> ParticipantRef {
    ParticipantRef {
        user_id: participant.user_id.clone(),
        user_name: participant.user_name.clone(),
        is_host: participant.is_host.unwrap_or(false),
        slug: participant.slug.clone(),
        image_url: participant.image_url.clone(),
        display_number: participant.display_number.clone(),
    }
}
