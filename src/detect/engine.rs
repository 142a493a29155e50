use crate::detect::{self, AnomalyResult};
use crate::storage::{self, Pool};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Runs peer-group detection against the current contents of the asset store.
#[derive(Clone)]
pub struct AnomalyEngine {
    pool: Pool,
}

impl AnomalyEngine {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Take a snapshot of every asset and score it against its peers.
    pub async fn scan(&self, threshold: f64) -> Result<Vec<AnomalyResult>> {
        let pool = self.pool.clone();

        let assets = tokio::task::spawn_blocking(move || storage::assets::load_snapshot(&pool))
            .await
            .context("snapshot task panicked")??;

        let suspect = assets.iter().filter(|a| a.has_negative_fields()).count();
        if suspect > 0 {
            warn!(suspect, "assets with negative hours or energy are scored as-is");
        }

        let results = detect::detect(&assets, threshold);
        info!(
            assets = assets.len(),
            threshold,
            anomalies = results.len(),
            "anomaly scan complete"
        );
        Ok(results)
    }
}
