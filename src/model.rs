//! Asset rows and KPI aggregates as exchanged with storage and API consumers.
//!
//! Field names are part of the public JSON contract and must not be renamed.

use serde::{Deserialize, Serialize};

/// Status value that marks an asset as offline in KPI counts.
pub const STATUS_OFFLINE: &str = "OFFLINE";

/// One row of the `assets` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub asset_id: String,
    /// Peer-group category, e.g. `"HVAC"`.
    pub asset_type: String,
    pub building: String,
    pub floor: String,
    pub zone: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub fault_reoccurrence_level: String,
    pub energy_consumed_per_hour: f64,
    pub planned_active_hours: f64,
    pub actual_active_hours: f64,
}

fn default_status() -> String {
    "ONLINE".to_string()
}

impl AssetRecord {
    /// Energy actually consumed, in kWh.
    pub fn actual_energy(&self) -> f64 {
        self.actual_active_hours * self.energy_consumed_per_hour
    }

    /// Energy the asset would have consumed running its planned hours, in kWh.
    pub fn baseline_energy(&self) -> f64 {
        self.planned_active_hours * self.energy_consumed_per_hour
    }

    /// True if any numeric field is negative. Such rows are not rejected.
    pub fn has_negative_fields(&self) -> bool {
        self.energy_consumed_per_hour < 0.0
            || self.planned_active_hours < 0.0
            || self.actual_active_hours < 0.0
    }
}

/// Portfolio-wide energy totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub baseline_kwh: f64,
    pub actual_kwh: f64,
    pub saved_kwh: f64,
    pub offline_count: i64,
}

#[cfg(test)]
pub(crate) fn asset(id: &str, asset_type: &str, energy_per_hour: f64, actual_hours: f64) -> AssetRecord {
    AssetRecord {
        asset_id: id.to_string(),
        asset_type: asset_type.to_string(),
        building: "Building A".to_string(),
        floor: "F1".to_string(),
        zone: "Z1".to_string(),
        status: "ONLINE".to_string(),
        fault_reoccurrence_level: "LOW".to_string(),
        energy_consumed_per_hour: energy_per_hour,
        planned_active_hours: actual_hours,
        actual_active_hours: actual_hours,
    }
}
