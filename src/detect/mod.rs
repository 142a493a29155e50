//! Peer-group anomaly detection over asset energy usage.
//!
//! Assets are grouped into cohorts by `asset_type`. Each asset's actual
//! energy is scored against its own cohort's mean and population standard
//! deviation, computed over the whole cohort including the asset itself.

pub mod cohort;
pub mod engine;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use self::cohort::Cohort;
use crate::model::AssetRecord;

/// Maximum number of anomalies returned by a single detection.
pub const MAX_ANOMALIES: usize = 50;

/// Threshold used when the caller does not supply one.
pub const DEFAULT_THRESHOLD: f64 = 2.0;

/// Thresholds callers are expected to pass. [`detect`] itself does not enforce it.
pub const THRESHOLD_RANGE: RangeInclusive<f64> = 0.0..=10.0;

/// Mean and spread of actual energy within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatistic {
    pub asset_type: String,
    pub members: usize,
    pub avg_kwh: f64,
    pub std_kwh: f64,
}

impl PeerStatistic {
    fn from_cohort(asset_type: &str, cohort: &Cohort) -> Self {
        Self {
            asset_type: asset_type.to_string(),
            members: cohort.len(),
            avg_kwh: cohort.mean(),
            std_kwh: cohort.std_dev(),
        }
    }

    /// Z = (value - mean) / std_dev, or 0 when the cohort has no spread.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std_kwh > 0.0 {
            (value - self.avg_kwh) / self.std_kwh
        } else {
            0.0
        }
    }
}

/// An asset whose energy deviates from its peers by at least the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub asset_id: String,
    pub asset_type: String,
    pub building: String,
    pub floor: String,
    pub zone: String,
    pub actual_kwh: f64,
    pub avg_kwh: f64,
    pub std_kwh: f64,
    pub zscore: f64,
}

/// Clamp a requested threshold into [`THRESHOLD_RANGE`].
pub fn clamp_threshold(z: f64) -> f64 {
    z.clamp(*THRESHOLD_RANGE.start(), *THRESHOLD_RANGE.end())
}

fn cohorts(assets: &[AssetRecord]) -> BTreeMap<&str, Cohort> {
    let mut groups: BTreeMap<&str, Cohort> = BTreeMap::new();
    for asset in assets {
        groups
            .entry(asset.asset_type.as_str())
            .or_default()
            .push(asset.actual_energy());
    }
    groups
}

/// Per-category statistics for every category present, ordered by category.
pub fn peer_statistics(assets: &[AssetRecord]) -> Vec<PeerStatistic> {
    cohorts(assets)
        .iter()
        .map(|(asset_type, cohort)| PeerStatistic::from_cohort(asset_type, cohort))
        .collect()
}

/// Score every asset against its cohort and return those with
/// `|zscore| >= threshold`, largest magnitude first, at most [`MAX_ANOMALIES`].
///
/// Ties keep input order. Negative hour or energy values are scored as-is.
pub fn detect(assets: &[AssetRecord], threshold: f64) -> Vec<AnomalyResult> {
    let stats: BTreeMap<&str, PeerStatistic> = cohorts(assets)
        .iter()
        .map(|(asset_type, cohort)| (*asset_type, PeerStatistic::from_cohort(asset_type, cohort)))
        .collect();

    let mut results: Vec<AnomalyResult> = assets
        .iter()
        .filter_map(|asset| {
            let peers = stats.get(asset.asset_type.as_str())?;
            let actual = asset.actual_energy();
            let zscore = peers.z_score(actual);
            if zscore.abs() < threshold {
                return None;
            }
            Some(AnomalyResult {
                asset_id: asset.asset_id.clone(),
                asset_type: asset.asset_type.clone(),
                building: asset.building.clone(),
                floor: asset.floor.clone(),
                zone: asset.zone.clone(),
                actual_kwh: actual,
                avg_kwh: peers.avg_kwh,
                std_kwh: peers.std_kwh,
                zscore,
            })
        })
        .collect();

    // sort_by is stable
    results.sort_by(|a, b| b.zscore.abs().total_cmp(&a.zscore.abs()));
    results.truncate(MAX_ANOMALIES);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::asset;

    #[test]
    fn test_three_member_cohort() {
        let assets = vec![
            asset("A", "X", 1.0, 10.0),
            asset("B", "X", 1.0, 10.0),
            asset("C", "X", 1.0, 100.0),
        ];

        let all = detect(&assets, 0.0);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].asset_id, "C");
        assert!((all[0].avg_kwh - 40.0).abs() < 1e-9);
        assert!((all[0].std_kwh - 42.426_406_871).abs() < 1e-6);
        assert!((all[0].zscore - 1.414_213_562).abs() < 1e-6);
        assert!((all[1].zscore + 0.707_106_781).abs() < 1e-6);
        assert!((all[2].zscore + 0.707_106_781).abs() < 1e-6);
        // equal magnitudes keep input order
        assert_eq!(all[1].asset_id, "A");
        assert_eq!(all[2].asset_id, "B");

        let flagged = detect(&assets, 1.0);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].asset_id, "C");
    }

    #[test]
    fn test_empty_input() {
        assert!(detect(&[], 2.0).is_empty());
        assert!(peer_statistics(&[]).is_empty());
    }

    #[test]
    fn test_nothing_over_threshold() {
        let assets = vec![asset("A", "X", 1.0, 10.0), asset("B", "X", 1.0, 12.0)];
        // two-member cohorts always score +/-1
        assert!(detect(&assets, 1.5).is_empty());
    }

    #[test]
    fn test_singleton_cohort_scores_zero() {
        let assets = vec![
            asset("LONE", "PUMP", 50.0, 24.0),
            asset("A", "X", 1.0, 10.0),
            asset("B", "X", 1.0, 30.0),
        ];
        let all = detect(&assets, 0.0);
        let lone = all.iter().find(|r| r.asset_id == "LONE").unwrap();
        assert_eq!(lone.zscore, 0.0);
        assert_eq!(lone.std_kwh, 0.0);

        assert!(detect(&assets, 0.5).iter().all(|r| r.asset_id != "LONE"));
    }

    #[test]
    fn test_identical_cohort_excluded_unless_threshold_zero() {
        let assets: Vec<_> = (0..4)
            .map(|i| asset(&format!("L-{i}"), "LIGHTING", 0.3, 7.0))
            .collect();

        let zero = detect(&assets, 0.0);
        assert_eq!(zero.len(), 4);
        assert!(zero.iter().all(|r| r.zscore == 0.0));

        assert!(detect(&assets, 0.01).is_empty());
    }

    #[test]
    fn test_categories_do_not_contaminate() {
        let assets = vec![
            asset("H1", "HVAC", 10.0, 10.0),
            asset("H2", "HVAC", 10.0, 20.0),
            asset("L1", "LIGHTING", 0.1, 10.0),
            asset("L2", "LIGHTING", 0.1, 30.0),
        ];
        let all = detect(&assets, 0.0);
        for r in &all {
            match r.asset_type.as_str() {
                "HVAC" => {
                    assert!((r.avg_kwh - 150.0).abs() < 1e-9);
                    assert!((r.std_kwh - 50.0).abs() < 1e-9);
                }
                "LIGHTING" => {
                    assert!((r.avg_kwh - 2.0).abs() < 1e-9);
                    assert!((r.std_kwh - 1.0).abs() < 1e-9);
                }
                other => panic!("unexpected category {other}"),
            }
            assert!((r.zscore.abs() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ordering_threshold_and_cap() {
        // 120 assets across 3 cohorts with a spread of energies
        let mut assets = Vec::new();
        for (c, cat) in ["HVAC", "PUMP", "LIGHTING"].iter().enumerate() {
            for i in 0..40 {
                let hours = (i * i % 37) as f64 + c as f64;
                assets.push(asset(&format!("{cat}-{i}"), cat, 1.5, hours));
            }
        }

        let results = detect(&assets, 0.0);
        assert_eq!(results.len(), MAX_ANOMALIES);
        assert!(results
            .windows(2)
            .all(|w| w[0].zscore.abs() >= w[1].zscore.abs()));

        for threshold in [0.5, 1.0, 1.5] {
            let results = detect(&assets, threshold);
            assert!(results.len() <= MAX_ANOMALIES);
            assert!(results.iter().all(|r| r.zscore.abs() >= threshold));
        }
    }

    #[test]
    fn test_peer_statistics() {
        let assets = vec![
            asset("P1", "PUMP", 2.0, 5.0),
            asset("H1", "HVAC", 1.0, 10.0),
            asset("H2", "HVAC", 1.0, 30.0),
        ];
        let stats = peer_statistics(&assets);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].asset_type, "HVAC");
        assert_eq!(stats[0].members, 2);
        assert_eq!(stats[0].avg_kwh, 20.0);
        assert_eq!(stats[0].std_kwh, 10.0);
        assert_eq!(stats[1].asset_type, "PUMP");
        assert_eq!(stats[1].std_kwh, 0.0);
    }

    #[test]
    fn test_clamp_threshold() {
        assert_eq!(clamp_threshold(-3.0), 0.0);
        assert_eq!(clamp_threshold(4.2), 4.2);
        assert_eq!(clamp_threshold(99.0), 10.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let assets = vec![asset("A", "X", 1.0, 1.0), asset("B", "X", 1.0, 3.0)];
        let json = serde_json::to_value(&detect(&assets, 0.0)[0]).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "actual_kwh", "asset_id", "asset_type", "avg_kwh", "building", "floor",
                "std_kwh", "zone", "zscore"
            ]
        );
    }
}
