//! API route definitions.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::state::AppState;
use crate::detect::{clamp_threshold, AnomalyResult};
use crate::model::{AssetRecord, KpiSummary};
use crate::storage::{self, filter::AssetFilter, Pool};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/kpi/summary", get(kpi_summary))
        .route("/assets", get(list_assets))
        .route("/insights/anomalies", get(anomalies))
}

/// Run a storage call on the blocking pool.
async fn blocking<T, F>(pool: &Pool, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Pool) -> anyhow::Result<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || f(&pool))
        .await
        .map_err(|e| ApiError::Storage(e.into()))?
        .map_err(ApiError::Storage)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn kpi_summary(State(state): State<AppState>) -> Result<Json<KpiSummary>, ApiError> {
    let summary = blocking(&state.pool, storage::assets::kpi_summary).await?;
    Ok(Json(summary))
}

async fn list_assets(
    State(state): State<AppState>,
    query: Result<Query<AssetFilter>, QueryRejection>,
) -> Result<Json<Vec<AssetRecord>>, ApiError> {
    let Query(filter) = query?;
    filter.validate().map_err(ApiError::Validation)?;
    let assets = blocking(&state.pool, move |pool| storage::assets::list(pool, &filter)).await?;
    Ok(Json(assets))
}

#[derive(Debug, Deserialize)]
struct AnomalyQuery {
    z: Option<f64>,
}

async fn anomalies(
    State(state): State<AppState>,
    query: Result<Query<AnomalyQuery>, QueryRejection>,
) -> Result<Json<Vec<AnomalyResult>>, ApiError> {
    let Query(query) = query?;
    let z = query.z.unwrap_or(state.default_threshold);
    if !z.is_finite() {
        return Err(ApiError::Validation(format!("z must be a finite number, got {z}")));
    }
    let results = state.engine.scan(clamp_threshold(z)).await?;
    Ok(Json(results))
}
