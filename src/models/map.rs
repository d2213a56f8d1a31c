//! Joined location view produced by the map-aggregation collaborator.
//!
//! Every field the aggregation may leave out is optional here; the snapshot
//! builder turns this loose shape into [`crate::models::MapLocationSnapshot`].

use serde::{Deserialize, Serialize};

/// A participant attached to a map location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMapParticipant {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub is_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_number: Option<String>,
}

/// A location with its participants and optional hub information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMapLocation {
    pub id: i64,
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub participants: Vec<RawMapParticipant>,
    #[serde(default)]
    pub is_hub: Option<bool>,
    #[serde(default)]
    pub is_collective: Option<bool>,
    #[serde(default)]
    pub is_special_program: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_display_number: Option<String>,
}
