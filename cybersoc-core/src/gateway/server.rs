//! HTTP server built on axum.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::AppContext;
use crate::actions::UNKNOWN_ACTION;
use crate::metrics::NetworkTraffic;
use crate::scenarios;

/// Body of `/api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsPayload {
    pub active_threats: i64,
    pub logs_processed: i64,
    pub alerts_generated: i64,
    pub today_logs: i64,
    pub system_status: String,
    pub last_update: DateTime<Utc>,
}

/// Body of `/api/chart_data`: real 24h aggregates plus simulated figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartPayload {
    pub threat_distribution: BTreeMap<String, i64>,
    pub threat_timeline: BTreeMap<String, i64>,
    pub geographic_data: BTreeMap<String, u32>,
    pub performance_data: BTreeMap<String, u32>,
    pub network_data: NetworkTraffic,
    pub security_score: u32,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /api/execute_action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteActionRequest {
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub alert_id: i64,
}

fn default_action() -> String {
    UNKNOWN_ACTION.to_string()
}

/// Build the router with every dashboard and API route.
pub fn router(ctx: AppContext) -> Router {
    let mut app = Router::new()
        .route("/", get(dashboard_handler))
        .route("/chart/{chart_type}", get(chart_details_handler))
        .route("/assets/{name}", get(asset_handler))
        .route("/health", get(health_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/logs", get(logs_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/api/chart_data", get(chart_data_handler))
        .route("/api/scenarios", get(scenarios_handler))
        .route("/api/simulate/{threat_type}", get(simulate_handler))
        .route("/api/execute_action", post(execute_action_handler));

    if let Some(dir) = &ctx.static_dir {
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http()).with_state(ctx)
}

/// Serve until the context's cancellation token fires.
pub async fn serve(ctx: AppContext, listener: tokio::net::TcpListener) -> std::io::Result<()> {
    let token = ctx.cancellation_token();
    let app = router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
}

async fn dashboard_handler(State(ctx): State<AppContext>) -> Response {
    match ctx.views.dashboard(&ctx.scenarios) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render dashboard");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render dashboard").into_response()
        }
    }
}

async fn chart_details_handler(
    State(ctx): State<AppContext>,
    Path(chart_type): Path<String>,
) -> Response {
    match ctx.views.chart_details(&chart_type) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, chart_type = %chart_type, "Failed to render chart details");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render chart").into_response()
        }
    }
}

async fn asset_handler(Path(name): Path<String>) -> Response {
    match super::asset(&name) {
        Some(body) => (
            [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
            body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn health_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "uptime_secs": ctx.uptime_secs(),
        "generator_running": ctx.generator_running(),
    }))
}

/// Storage faults are reported in-band: HTTP 200, zeroed counters and
/// `system_status: "Error"`.
async fn stats_handler(State(ctx): State<AppContext>) -> Json<StatsPayload> {
    let payload = match ctx.storage.run(|s| s.aggregate_stats()).await {
        Ok(stats) => StatsPayload {
            active_threats: stats.active_alert_count,
            logs_processed: stats.total_log_count,
            alerts_generated: stats.total_alert_count,
            today_logs: stats.today_log_count,
            system_status: "Online".to_string(),
            last_update: Utc::now(),
        },
        Err(e) => {
            error!(error = %e, "Database error while loading stats");
            StatsPayload {
                active_threats: 0,
                logs_processed: 0,
                alerts_generated: 0,
                today_logs: 0,
                system_status: "Error".to_string(),
                last_update: Utc::now(),
            }
        }
    };
    Json(payload)
}

async fn logs_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    let limit = ctx.recent_log_limit;
    let logs = ctx
        .storage
        .run(move |s| s.list_recent_logs(limit))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Database error while listing logs");
            Vec::new()
        });
    Json(logs)
}

async fn alerts_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    let alerts = ctx
        .storage
        .run(|s| s.list_active_alerts())
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Database error while listing alerts");
            Vec::new()
        });
    Json(alerts)
}

/// Storage faults are reported as HTTP 500 with zeroed substructures.
async fn chart_data_handler(State(ctx): State<AppContext>) -> Response {
    let aggregates = ctx
        .storage
        .run(|s| Ok((s.threat_distribution()?, s.threat_timeline()?)))
        .await;

    match aggregates {
        Ok((threat_distribution, threat_timeline)) => {
            let simulated = ctx.metrics.sample();
            Json(ChartPayload {
                threat_distribution,
                threat_timeline,
                geographic_data: simulated.geographic_data,
                performance_data: simulated.performance_data,
                network_data: simulated.network_data,
                security_score: simulated.security_score,
                timestamp: Utc::now(),
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error while building chart data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Database error",
                    "threat_distribution": {},
                    "threat_timeline": {},
                    "geographic_data": {},
                    "performance_data": {},
                    "network_data": { "inbound": 0, "outbound": 0 },
                    "security_score": 0,
                })),
            )
                .into_response()
        }
    }
}

async fn scenarios_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    let listing: Vec<Value> = ctx
        .scenarios
        .iter()
        .map(|(key, s)| {
            json!({
                "key": key,
                "name": s.name,
                "severity": s.severity,
                "description": s.description,
                "recommended_actions": ctx.scenarios.actions_for_threat(&s.name),
            })
        })
        .collect();
    Json(listing)
}

async fn simulate_handler(
    State(ctx): State<AppContext>,
    Path(threat_type): Path<String>,
) -> (StatusCode, Json<Value>) {
    let Some(scenario) = ctx.scenarios.lookup(&threat_type).cloned() else {
        warn!(threat_type = %threat_type, "Unknown threat scenario requested");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid threat type" })),
        );
    };

    let outcome = ctx
        .storage
        .run(move |s| Ok(scenarios::simulate(s, &threat_type, &scenario)))
        .await;

    let alert_id = match outcome {
        Ok(outcome) => outcome.alert_id,
        Err(e) => {
            error!(error = %e, "Scenario simulation task failed");
            None
        }
    };
    (
        StatusCode::OK,
        Json(json!({ "success": alert_id.is_some(), "alert_id": alert_id })),
    )
}

async fn execute_action_handler(
    State(ctx): State<AppContext>,
    payload: Result<Json<ExecuteActionRequest>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed action request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Action execution failed",
                    "error": rejection.body_text(),
                })),
            );
        }
    };

    let detailed_message = ctx.actions.describe(&request.action);
    let alert_id = request.alert_id;
    let action = request.action.clone();
    let message = detailed_message.clone();
    let result = ctx
        .storage
        .run(move |s| s.record_action(alert_id, &action, &message))
        .await;

    match result {
        Ok(outcome) => {
            info!(
                alert_id,
                action = %request.action,
                resolved = outcome.resolved,
                "Executed response action"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!("{} executed successfully", request.action),
                    "detailed_message": detailed_message,
                    "resolved": outcome.resolved,
                })),
            )
        }
        Err(e) => {
            error!(alert_id, action = %request.action, error = %e, "Action execution failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Action execution failed",
                    "error": e.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use axum::body::Body;
    use tower::ServiceExt;

    async fn call(ctx: AppContext, uri: &str) -> (StatusCode, String) {
        let req = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(router(ctx), req)
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn make_ctx() -> (tempfile::TempDir, AppContext) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("soc.db"));
        storage.initialize().unwrap();
        (dir, AppContext::new(storage).unwrap())
    }

    #[test]
    fn test_router_builds() {
        let (_dir, ctx) = make_ctx();
        let _app = router(ctx);
    }

    #[test]
    fn test_execute_action_request_defaults() {
        let req: ExecuteActionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.action, "Unknown Action");
        assert_eq!(req.alert_id, 0);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, ctx) = make_ctx();
        let (status, body) = call(ctx, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["generator_running"], false);
    }

    #[tokio::test]
    async fn test_dashboard_renders_html() {
        let (_dir, ctx) = make_ctx();
        let (status, body) = call(ctx, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("data-threat=\"malware\""));
    }

    #[tokio::test]
    async fn test_chart_details_renders() {
        let (_dir, ctx) = make_ctx();
        let (status, body) = call(ctx, "/chart/network").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("data-chart-type=\"network\""));
    }

    #[tokio::test]
    async fn test_builtin_assets_served() {
        let (_dir, ctx) = make_ctx();
        let req = axum::http::Request::builder()
            .uri("/assets/dashboard.js")
            .body(Body::empty())
            .unwrap();
        let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(router(ctx.clone()), req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/javascript; charset=utf-8"
        );

        let (status, body) = call(ctx.clone(), "/assets/chart.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/api/chart_data"));

        let (status, _) = call(ctx, "/assets/style.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_dir_served() {
        let (dir, ctx) = make_ctx();
        let static_dir = dir.path().join("static");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("script.js"), "console.log('soc');").unwrap();
        let ctx = AppContext {
            static_dir: Some(static_dir),
            ..ctx
        };
        let (status, body) = call(ctx, "/static/script.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log('soc');");
    }
}
