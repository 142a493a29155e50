//! API layer -- axum routes, handlers, and middleware.

pub mod error;
mod routes;
pub mod state;

use self::state::AppState;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Build the application router with all API routes.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .fallback(fallback)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for an explicit origin list; methods and headers mirror the request.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn fallback() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::NOT_FOUND, "not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::asset;
    use crate::storage;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    fn app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let pool = storage::open_pool(dir.path().join("api.db"), 2).unwrap();

        let mut offline = asset("C", "X", 1.0, 100.0);
        offline.status = "OFFLINE".into();
        offline.planned_active_hours = 120.0;
        storage::assets::upsert_many(
            &pool,
            &[asset("A", "X", 1.0, 10.0), asset("B", "X", 1.0, 10.0), offline],
        )
        .unwrap();

        let origins = vec!["http://localhost:5173".to_string()];
        (dir, router(AppState::new(pool, 2.0), &origins))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1_000_000)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_healthz() {
        let (_dir, app) = app();
        let (status, json) = get(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_kpi_summary() {
        let (_dir, app) = app();
        let (status, json) = get(app, "/kpi/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["baseline_kwh"], 140.0);
        assert_eq!(json["actual_kwh"], 120.0);
        assert_eq!(json["saved_kwh"], 20.0);
        assert_eq!(json["offline_count"], 1);
    }

    #[tokio::test]
    async fn test_list_assets_with_filter() {
        let (_dir, app) = app();
        let (status, json) = get(app, "/assets?status=OFFLINE").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["asset_id"], "C");
        assert_eq!(rows[0]["energy_consumed_per_hour"], 1.0);
    }

    #[tokio::test]
    async fn test_list_assets_rejects_bad_limit() {
        let (_dir, app) = app();
        let (status, json) = get(app.clone(), "/assets?limit=0").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("limit"));

        let (status, _) = get(app, "/assets?offset=-5").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_anomalies_threshold() {
        let (_dir, app) = app();

        // default z = 2.0 flags nothing in a 10/10/100 cohort
        let (status, json) = get(app.clone(), "/insights/anomalies").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());

        let (_, json) = get(app.clone(), "/insights/anomalies?z=1").await;
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["asset_id"], "C");
        assert_eq!(rows[0]["avg_kwh"], 40.0);
        assert!((rows[0]["zscore"].as_f64().unwrap() - 1.4142).abs() < 1e-3);

        // negative z clamps to 0 and returns every asset
        let (_, json) = get(app, "/insights/anomalies?z=-4").await;
        assert_eq!(json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_anomalies_rejects_nan() {
        let (_dir, app) = app();
        let (status, _) = get(app, "/insights/anomalies?z=NaN").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_query_is_json_422() {
        let (_dir, app) = app();

        let (status, json) = get(app.clone(), "/insights/anomalies?z=abc").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("z"));

        let (status, json) = get(app, "/assets?limit=abc").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (_dir, app) = app();
        let (status, _) = get(app, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let (_dir, app) = app();
        let request = Request::builder()
            .uri("/healthz")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );

        let request = Request::builder()
            .uri("/healthz")
            .header(header::ORIGIN, "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
