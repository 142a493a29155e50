//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS assets (
            asset_id TEXT PRIMARY KEY,
            asset_type TEXT NOT NULL,
            building TEXT NOT NULL,
            floor TEXT NOT NULL,
            zone TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ONLINE',
            fault_reoccurrence_level TEXT NOT NULL DEFAULT '',
            energy_consumed_per_hour REAL NOT NULL DEFAULT 0,
            planned_active_hours REAL NOT NULL DEFAULT 0,
            actual_active_hours REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_assets_type ON assets(asset_type);
        CREATE INDEX IF NOT EXISTS idx_assets_location ON assets(building, floor);
        CREATE INDEX IF NOT EXISTS idx_assets_status ON assets(status);",
    )?;

    Ok(())
}
