use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use badge_scoring::report::BadgeDistribution;
use badge_scoring::scoring::{Entity, ScoreResult, ScoringConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) entities: Vec<Entity>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) results: Vec<ScoreResult>,
    pub(crate) distribution: BadgeDistribution,
}

pub(crate) fn with_scoring_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/rules", get(rules_endpoint))
        .route("/api/v1/score", post(score_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn rules_endpoint(Extension(state): Extension<AppState>) -> Json<ScoringConfig> {
    Json(state.engine.config().clone())
}

pub(crate) async fn score_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ScoreRequest>,
) -> Json<ScoreResponse> {
    let results = state.engine.score_all(&payload.entities);
    let distribution = BadgeDistribution::from_results(state.engine.config().badges(), &results);
    info!(entities = results.len(), "scored request batch");

    Json(ScoreResponse {
        results,
        distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use badge_scoring::scoring::ScoringEngine;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    const RULES: &str = r#"
rules:
  sales_units:
    bins: [[500, 8], [300, 6], [100, 4], [0, -1]]
  visited_last_year:
    true: 1
  missing_account_manager:
    when_false_has_manager: -2
badges:
  medium: { min: 5, max: 9 }
  low: { min: 0, max: 4 }
"#;

    fn test_app(ready: bool) -> Router {
        let config = ScoringConfig::from_yaml_str(RULES).expect("rules load");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            engine: ScoringEngine::new(config),
        };
        with_scoring_routes().layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flag_set() {
        let response = test_app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let response = test_app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rules_endpoint_lists_configuration_in_order() {
        let response = test_app(true)
            .oneshot(Request::get("/api/v1/rules").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let names: Vec<_> = body["rules"]
            .as_array()
            .expect("rules array")
            .iter()
            .map(|rule| rule["name"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["sales_units", "visited_last_year", "missing_account_manager"]
        );
        assert_eq!(body["badges"][0]["name"], "medium");
    }

    #[tokio::test]
    async fn score_endpoint_returns_results_and_distribution() {
        let payload = json!({
            "entities": [
                { "entity_id": "A", "sales_units": 320, "visited_last_year": true, "has_account_manager": true },
                { "entity_id": "B", "sales_units": 50 }
            ]
        });
        let request = Request::post("/api/v1/score")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["results"][0]["entity_id"], "A");
        assert_eq!(body["results"][0]["total_score"], 7.0);
        assert_eq!(body["results"][0]["badge"], "medium");
        assert_eq!(body["results"][1]["total_score"], -3.0);
        assert_eq!(body["results"][1]["badge"], Value::Null);
        assert_eq!(body["results"][1]["issues"][0]["kind"], "unclassified_score");
        assert_eq!(
            body["distribution"],
            json!({ "medium": 1, "low": 0, "Unclassified": 1 })
        );
    }

    #[tokio::test]
    async fn score_endpoint_rejects_malformed_payload() {
        let request = Request::post("/api/v1/score")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"records": []}"#))
            .unwrap();

        let response = test_app(true).oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
