//! HTTP Server module
//!
//! Wires the reporting endpoints together with the request-counting
//! middleware, the JSON 404 fallback, and panic recovery.

use crate::api::{create_api_router, ApiState};
use crate::config::SharedConfig;
use crate::metrics::SharedMetrics;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Response, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as CorsAny, CorsLayer};
use tower_http::trace::TraceLayer;

/// Server state
#[derive(Clone)]
pub struct ServerState {
    pub config: SharedConfig,
    pub metrics: SharedMetrics,
}

impl ServerState {
    pub fn new(config: SharedConfig, metrics: SharedMetrics) -> Self {
        Self { config, metrics }
    }
}

/// Request counting and timing middleware
///
/// Counts every inbound request before it is handled. Matched routes are
/// also counted per endpoint; unmatched paths only bump the total so the
/// per-endpoint map stays attributable to real routes. 404 and 5xx
/// responses bump the error counter.
pub async fn metrics_middleware(
    metrics: SharedMetrics,
    req: Request<Body>,
    next: Next,
) -> Response<Body> {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    match req.extensions().get::<MatchedPath>() {
        Some(matched) => metrics.record_request(matched.as_str()),
        None => metrics.record_unmatched(),
    }

    let response = next.run(req).await;

    let status = response.status();
    if status == StatusCode::NOT_FOUND || status.is_server_error() {
        metrics.record_error();
    }

    let latency = start.elapsed().as_secs_f64() * 1000.0;
    tracing::debug!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        latency_ms = %latency,
        "Request processed"
    );

    response
}

/// JSON body for unmatched paths
async fn not_found(state: Arc<ServerState>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not Found",
            "message": "The requested resource does not exist",
            "environment": state.config.environment,
        })),
    )
}

/// Create the main server router
pub fn create_server_router(state: Arc<ServerState>) -> Router {
    let api_state = Arc::new(ApiState::new(state.config.clone(), state.metrics.clone()));

    let metrics_for_middleware = state.metrics.clone();
    let environment = state.config.environment;
    let fallback_state = state.clone();

    Router::new()
        .merge(create_api_router(api_state))
        .fallback(move || not_found(fallback_state.clone()))
        // Innermost: turn handler panics into JSON 500s so the metrics
        // middleware above still sees and counts them
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| {
                let detail = if let Some(s) = err.downcast_ref::<String>() {
                    s.clone()
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    s.to_string()
                } else {
                    "unknown panic".to_string()
                };
                tracing::error!(error = %detail, "Handler panicked");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "Internal Server Error",
                        "message": "An internal error occurred",
                        "environment": environment,
                    })),
                )
                    .into_response()
            },
        ))
        .layer(middleware::from_fn(move |req, next| {
            metrics_middleware(metrics_for_middleware.clone(), req, next)
        }))
        .layer(
            CorsLayer::new()
                .allow_origin(CorsAny)
                .allow_methods(CorsAny)
                .allow_headers(CorsAny),
        )
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn start_server(config: SharedConfig, metrics: SharedMetrics) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    let state = Arc::new(ServerState::new(config, metrics));
    let app = create_server_router(state);

    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::metrics::create_shared_metrics;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn create_test_state() -> Arc<ServerState> {
        let config = Arc::new(AppConfig::default());
        let metrics = create_shared_metrics();
        Arc::new(ServerState::new(config, metrics))
    }

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_server_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["environment"], "development");
    }

    #[tokio::test]
    async fn test_home_page() {
        let app = create_server_router(create_test_state());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unmatched_path_returns_json_404() {
        let state = create_test_state();
        let app = create_server_router(state.clone());

        let request = Request::builder()
            .uri("/no/such/route")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["environment"], "development");

        let snapshot = state.metrics.snapshot();
        assert_eq!(snapshot.errors_total, 1);
        assert_eq!(snapshot.requests_total, 1);
        assert!(snapshot.requests_by_endpoint.is_empty());
    }

    #[tokio::test]
    async fn test_requests_are_counted_per_endpoint() {
        let state = create_test_state();
        let app = create_server_router(state.clone());

        for _ in 0..3 {
            let request = Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let snapshot = state.metrics.snapshot();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.requests_by_endpoint["/health"], 3);
        assert_eq!(snapshot.errors_total, 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_sees_its_own_request() {
        let app = create_server_router(create_test_state());

        let request = Request::builder()
            .uri("/api/metrics")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["requests_total"], 1);
        assert_eq!(json["requests_by_endpoint"]["/api/metrics"], 1);
        assert_eq!(json["errors_total"], 0);
        assert!(json["uptime_human"].as_str().unwrap().ends_with('s'));
    }
}
