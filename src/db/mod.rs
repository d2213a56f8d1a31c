//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for participants, events, event days, the
//! map tables and the singleton tour status row.

mod events;
mod map;
mod participants;
mod status;

pub use events::*;
pub use map::*;
pub use participants::*;
pub use status::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // The status row is seeded once; later runs leave it alone.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tour_status (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            current_tour_status TEXT NOT NULL CHECK (current_tour_status IN ('new', 'older')),
            previous_tour_event_days TEXT,
            previous_tour_map_info TEXT,
            updated_at TEXT NOT NULL
        );

        INSERT OR IGNORE INTO tour_status (id, current_tour_status, updated_at)
        VALUES (1, 'new', strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hubs (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            display_number TEXT,
            is_collective INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS map_locations (
            id INTEGER PRIMARY KEY,
            formatted_address TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            hub_id INTEGER REFERENCES hubs(id) ON DELETE SET NULL,
            is_special_program INTEGER NOT NULL DEFAULT 0,
            display_number TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS participants (
            id TEXT PRIMARY KEY,
            user_name TEXT NOT NULL,
            slug TEXT,
            image_url TEXT,
            display_number TEXT,
            is_host INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 0,
            was_active_last_year INTEGER NOT NULL DEFAULT 0,
            location_id INTEGER REFERENCES map_locations(id) ON DELETE SET NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_days (
            id INTEGER PRIMARY KEY,
            label TEXT NOT NULL,
            date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            event_day_id INTEGER REFERENCES event_days(id) ON DELETE SET NULL,
            image_url TEXT,
            is_last_year_event INTEGER NOT NULL DEFAULT 0,
            event_day_out INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for the archival filters
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_participants_active ON participants(is_active);
        CREATE INDEX IF NOT EXISTS idx_participants_location ON participants(location_id);
        CREATE INDEX IF NOT EXISTS idx_events_last_year ON events(is_last_year_event, event_day_out);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
