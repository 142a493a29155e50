//! Read queries over the `assets` table, plus bulk loading for seeding.

use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use tracing::debug;

use super::filter::AssetFilter;
use super::Pool;
use crate::model::{AssetRecord, KpiSummary, STATUS_OFFLINE};

const ASSET_COLUMNS: &str = "asset_id, asset_type, building, floor, zone, status, \
     fault_reoccurrence_level, energy_consumed_per_hour, \
     planned_active_hours, actual_active_hours";

fn from_row(row: &Row<'_>) -> rusqlite::Result<AssetRecord> {
    Ok(AssetRecord {
        asset_id: row.get(0)?,
        asset_type: row.get(1)?,
        building: row.get(2)?,
        floor: row.get(3)?,
        zone: row.get(4)?,
        status: row.get(5)?,
        fault_reoccurrence_level: row.get(6)?,
        energy_consumed_per_hour: row.get(7)?,
        planned_active_hours: row.get(8)?,
        actual_active_hours: row.get(9)?,
    })
}

/// Assets matching `filter`, ordered by type, building, floor, id.
pub fn list(pool: &Pool, filter: &AssetFilter) -> Result<Vec<AssetRecord>> {
    let conn = pool.get()?;

    let (clause, criteria) = filter.where_clause();
    let n = criteria.len();
    let sql = format!(
        "SELECT {ASSET_COLUMNS} FROM assets {clause}
         ORDER BY asset_type, building, floor, asset_id
         LIMIT ?{} OFFSET ?{}",
        n + 1,
        n + 2
    );

    let mut values: Vec<Value> = criteria
        .into_iter()
        .map(|v| Value::Text(v.to_string()))
        .collect();
    values.push(Value::Integer(filter.limit));
    values.push(Value::Integer(filter.offset));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), from_row)?;

    let mut assets = Vec::new();
    for r in rows {
        assets.push(r?);
    }
    debug!(?filter, count = assets.len(), "listed assets");
    Ok(assets)
}

/// Every asset in the store, in id order.
pub fn load_snapshot(pool: &Pool) -> Result<Vec<AssetRecord>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {ASSET_COLUMNS} FROM assets ORDER BY asset_id"
    ))?;
    let rows = stmt.query_map([], from_row)?;

    let mut assets = Vec::new();
    for r in rows {
        assets.push(r.context("failed to decode asset row")?);
    }
    Ok(assets)
}

/// Portfolio totals. All fields are zero on an empty table.
pub fn kpi_summary(pool: &Pool) -> Result<KpiSummary> {
    let conn = pool.get()?;
    let summary = conn.query_row(
        "SELECT
            COALESCE(SUM(planned_active_hours * energy_consumed_per_hour), 0.0),
            COALESCE(SUM(actual_active_hours * energy_consumed_per_hour), 0.0),
            COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0)
         FROM assets",
        params![STATUS_OFFLINE],
        |row| {
            let baseline_kwh: f64 = row.get(0)?;
            let actual_kwh: f64 = row.get(1)?;
            Ok(KpiSummary {
                baseline_kwh,
                actual_kwh,
                saved_kwh: baseline_kwh - actual_kwh,
                offline_count: row.get(2)?,
            })
        },
    )?;
    Ok(summary)
}

/// Insert or replace `assets` in one transaction. Returns the number of rows written.
pub fn upsert_many(pool: &Pool, assets: &[AssetRecord]) -> Result<usize> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT OR REPLACE INTO assets ({ASSET_COLUMNS}, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))"
        ))?;
        for a in assets {
            stmt.execute(params![
                a.asset_id,
                a.asset_type,
                a.building,
                a.floor,
                a.zone,
                a.status,
                a.fault_reoccurrence_level,
                a.energy_consumed_per_hour,
                a.planned_active_hours,
                a.actual_active_hours,
            ])
            .with_context(|| format!("failed to write asset {}", a.asset_id))?;
        }
    }
    tx.commit()?;
    Ok(assets.len())
}
