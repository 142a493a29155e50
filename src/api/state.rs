use crate::detect::engine::AnomalyEngine;
use crate::storage::Pool;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub engine: AnomalyEngine,
    /// Threshold applied when a request omits `z`.
    pub default_threshold: f64,
}

impl AppState {
    pub fn new(pool: Pool, default_threshold: f64) -> Self {
        let engine = AnomalyEngine::new(pool.clone());
        Self {
            pool,
            engine,
            default_threshold,
        }
    }
}
