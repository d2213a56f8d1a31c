//! Map aggregation: locations joined with their hubs and active participants.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::errors::DataAccessError;
use crate::models::{RawMapLocation, RawMapParticipant};
use crate::tour::MapAggregator;

#[derive(Clone)]
pub struct SqliteMapAggregator {
    pool: SqlitePool,
}

impl SqliteMapAggregator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MapAggregator for SqliteMapAggregator {
    async fn aggregate(&self) -> Result<Vec<RawMapLocation>, DataAccessError> {
        let location_rows = sqlx::query(
            r#"SELECT l.id, l.formatted_address, l.latitude, l.longitude,
                      l.is_special_program, l.display_number,
                      h.id AS hub_id, h.name AS hub_name, h.description AS hub_description,
                      h.display_number AS hub_display_number, h.is_collective
               FROM map_locations l
               LEFT JOIN hubs h ON h.id = l.hub_id
               ORDER BY l.id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let participant_rows = sqlx::query(
            r#"SELECT id, user_name, slug, image_url, display_number, is_host, location_id
               FROM participants
               WHERE is_active = 1 AND location_id IS NOT NULL
               ORDER BY location_id, is_host DESC, user_name"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_location: HashMap<i64, Vec<RawMapParticipant>> = HashMap::new();
        for row in &participant_rows {
            let is_host: i64 = row.try_get("is_host")?;
            by_location
                .entry(row.try_get("location_id")?)
                .or_default()
                .push(RawMapParticipant {
                    user_id: row.try_get("id")?,
                    user_name: row.try_get("user_name")?,
                    is_host: Some(is_host != 0),
                    slug: row.try_get("slug")?,
                    image_url: row.try_get("image_url")?,
                    display_number: row.try_get("display_number")?,
                });
        }

        let mut locations = Vec::with_capacity(location_rows.len());
        for row in &location_rows {
            let id: i64 = row.try_get("id")?;
            let hub_id: Option<i64> = row.try_get("hub_id")?;
            let is_collective: Option<i64> = row.try_get("is_collective")?;
            let is_special_program: i64 = row.try_get("is_special_program")?;

            locations.push(RawMapLocation {
                id,
                formatted_address: row.try_get("formatted_address")?,
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                participants: by_location.remove(&id).unwrap_or_default(),
                is_hub: Some(hub_id.is_some()),
                is_collective: is_collective.map(|v| v != 0),
                is_special_program: Some(is_special_program != 0),
                hub_name: row.try_get("hub_name")?,
                hub_description: row.try_get("hub_description")?,
                display_number: row.try_get("display_number")?,
                hub_display_number: row.try_get("hub_display_number")?,
            });
        }

        Ok(locations)
    }
}
