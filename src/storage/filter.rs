//! Optional listing criteria and their translation into a parameterized `WHERE` clause.

use std::ops::RangeInclusive;

use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 500;
pub const LIMIT_RANGE: RangeInclusive<i64> = 1..=5000;

/// Exact-match filters for asset listings. `None` means "any".
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetFilter {
    pub building: Option<String>,
    pub floor: Option<String>,
    pub asset_type: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for AssetFilter {
    fn default() -> Self {
        Self {
            building: None,
            floor: None,
            asset_type: None,
            status: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl AssetFilter {
    /// Check pagination bounds, returning a message suitable for the caller.
    pub fn validate(&self) -> Result<(), String> {
        if !LIMIT_RANGE.contains(&self.limit) {
            return Err(format!(
                "limit must be between {} and {}, got {}",
                LIMIT_RANGE.start(),
                LIMIT_RANGE.end(),
                self.limit
            ));
        }
        if self.offset < 0 {
            return Err(format!("offset must be non-negative, got {}", self.offset));
        }
        Ok(())
    }

    /// `WHERE` clause (empty when no criteria are set) and its bind values, in order.
    pub fn where_clause(&self) -> (String, Vec<&str>) {
        let columns = [
            ("building", &self.building),
            ("floor", &self.floor),
            ("asset_type", &self.asset_type),
            ("status", &self.status),
        ];

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        for (column, value) in columns {
            if let Some(v) = value {
                params.push(v.as_str());
                conditions.push(format!("{column} = ?{}", params.len()));
            }
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }
}
