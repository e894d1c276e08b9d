//! Reporting endpoints
//!
//! Handlers that assemble the config snapshot and a metrics snapshot into
//! response payloads: health, info, metrics, config, status, plus the mock
//! user endpoints.

use crate::config::{Environment, FeatureFlags, SharedConfig};
use crate::metrics::{format_uptime, SharedMetrics};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// API state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub config: SharedConfig,
    pub metrics: SharedMetrics,
}

impl ApiState {
    pub fn new(config: SharedConfig, metrics: SharedMetrics) -> Self {
        Self { config, metrics }
    }
}

/// Create the router for all reporting endpoints
pub fn create_api_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/info", get(api_info))
        .route("/api/metrics", get(api_metrics))
        .route("/api/config", get(api_config))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/status", get(api_status))
        .with_state(state)
}

/// Informational HTML page at the root
async fn home(State(state): State<Arc<ApiState>>) -> Html<String> {
    Html(render_home(&state.config))
}

fn render_home(config: &crate::config::AppConfig) -> String {
    let short_commit = if config.git_commit.len() > 7 {
        &config.git_commit[..7]
    } else {
        &config.git_commit
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>app-status - {env}</title>
    <style>
        body {{ font-family: sans-serif; max-width: 900px; margin: 50px auto; padding: 20px; }}
        h1 {{ color: #667eea; }}
        .badge {{ display: inline-block; padding: 5px 15px; border-radius: 20px; background: #ffd93d; }}
        table {{ border-collapse: collapse; }}
        td {{ padding: 6px 16px 6px 0; }}
        code {{ background: #f8f9fa; padding: 2px 6px; }}
    </style>
</head>
<body>
    <h1>app-status <span class="badge">{env}</span></h1>
    <table>
        <tr><td>Version</td><td>{version}</td></tr>
        <tr><td>Git commit</td><td>{commit}</td></tr>
        <tr><td>Git branch</td><td>{branch}</td></tr>
        <tr><td>Build time</td><td>{build_time}</td></tr>
        <tr><td>Deployed at</td><td>{deployed_at}</td></tr>
    </table>
    <h2>Endpoints</h2>
    <ul>
        <li><code>GET /health</code> - health check for monitoring</li>
        <li><code>GET /api/info</code> - application information</li>
        <li><code>GET /api/metrics</code> - request metrics and uptime</li>
        <li><code>GET /api/config</code> - configuration and feature flags</li>
        <li><code>GET /api/users</code> - sample user list (mock)</li>
        <li><code>POST /api/users</code> - create user (mock)</li>
        <li><code>GET /api/status</code> - detailed status</li>
    </ul>
</body>
</html>
"#,
        env = config.environment,
        version = config.version,
        commit = short_commit,
        branch = config.git_branch,
        build_time = config.build_time,
        deployed_at = config.deployed_at,
    )
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: Environment,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint for load balancers and orchestrators
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        environment: state.config.environment,
        version: state.config.version.clone(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Application info response
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub application: String,
    pub version: String,
    pub environment: Environment,
    pub build_time: String,
    pub git_commit: String,
    pub git_branch: String,
    pub deployed_at: String,
    pub rust_version: String,
    pub hostname: String,
}

/// Detailed application information
async fn api_info(State(state): State<Arc<ApiState>>) -> Json<InfoResponse> {
    let config = &state.config;
    Json(InfoResponse {
        application: env!("CARGO_PKG_NAME").to_string(),
        version: config.version.clone(),
        environment: config.environment,
        build_time: config.build_time.clone(),
        git_commit: config.git_commit.clone(),
        git_branch: config.git_branch.clone(),
        deployed_at: config.deployed_at.clone(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
        hostname: config.hostname.clone(),
    })
}

/// Metrics report response
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub uptime_seconds: f64,
    pub uptime_human: String,
    pub environment: Environment,
    pub version: String,
}

/// Request counters and uptime
async fn api_metrics(State(state): State<Arc<ApiState>>) -> Json<MetricsResponse> {
    let snapshot = state.metrics.snapshot();
    Json(MetricsResponse {
        requests_total: snapshot.requests_total,
        requests_by_endpoint: snapshot.requests_by_endpoint,
        errors_total: snapshot.errors_total,
        uptime_seconds: snapshot.uptime_seconds,
        uptime_human: format_uptime(snapshot.uptime_seconds),
        environment: state.config.environment,
        version: state.config.version.clone(),
    })
}

/// Non-sensitive configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub environment: Environment,
    pub version: String,
    pub git_branch: String,
    pub git_commit: String,
    pub features: FeatureFlags,
}

/// Current configuration without secrets
async fn api_config(State(state): State<Arc<ApiState>>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        environment: config.environment,
        version: config.version.clone(),
        git_branch: config.git_branch.clone(),
        git_commit: config.git_commit.clone(),
        features: config.environment.features(),
    })
}

/// A mock user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub role: String,
}

fn mock_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
            role: "admin".to_string(),
        },
        User {
            id: 2,
            name: "Bob Smith".to_string(),
            email: "bob@example.com".to_string(),
            role: "user".to_string(),
        },
        User {
            id: 3,
            name: "Charlie Brown".to_string(),
            email: "charlie@example.com".to_string(),
            role: "user".to_string(),
        },
    ]
}

/// User list response
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub environment: Environment,
    pub users: Vec<User>,
    pub total: usize,
}

/// Mock endpoint: fixed user list
async fn list_users(State(state): State<Arc<ApiState>>) -> Json<UsersResponse> {
    let users = mock_users();
    let total = users.len();
    Json(UsersResponse {
        environment: state.config.environment,
        users,
        total,
    })
}

/// Create user request body; all fields optional so validation can produce
/// a single uniform error instead of per-field deserialization failures
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Mock endpoint: create a user. No persistence; echoes a synthesized
/// record with a fixed id.
async fn create_user(
    State(state): State<Arc<ApiState>>,
    payload: Option<Json<CreateUserRequest>>,
) -> impl IntoResponse {
    let Json(req) = payload.unwrap_or_default();

    let name = req.name.unwrap_or_default();
    let email = req.email.unwrap_or_default();
    if name.is_empty() || email.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Name and email are required"
            })),
        );
    }

    let role = req.role.unwrap_or_else(|| "user".to_string());

    tracing::info!(name = %name, email = %email, "User created");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully",
            "user": {
                "id": 4,
                "name": name,
                "email": email,
                "role": role,
                "created_at": Utc::now().to_rfc3339(),
            },
            "environment": state.config.environment,
        })),
    )
}

/// Detailed status: config, git, deployment, runtime counters, and mock
/// dependency health checks
async fn api_status(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    let config = &state.config;
    let snapshot = state.metrics.snapshot();

    Json(serde_json::json!({
        "status": "running",
        "environment": config.environment,
        "version": config.version,
        "git": {
            "branch": config.git_branch,
            "commit": config.git_commit,
        },
        "deployment": {
            "build_time": config.build_time,
            "deployed_at": config.deployed_at,
        },
        "runtime": {
            "uptime_seconds": snapshot.uptime_seconds,
            "requests_total": snapshot.requests_total,
            "errors_total": snapshot.errors_total,
        },
        "health_checks": {
            "database": "ok",
            "cache": "ok",
            "external_api": "ok",
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::metrics::create_shared_metrics;

    fn test_state(environment: Environment) -> Arc<ApiState> {
        let config = AppConfig {
            environment,
            ..AppConfig::default()
        };
        Arc::new(ApiState::new(Arc::new(config), create_shared_metrics()))
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let Json(response) = health(State(test_state(Environment::Development))).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, "dev");
    }

    #[tokio::test]
    async fn test_config_features_production() {
        let Json(response) = api_config(State(test_state(Environment::Production))).await;
        assert!(response.features.authentication);
        assert!(!response.features.debug_mode);
        assert!(response.features.rate_limiting);
    }

    #[tokio::test]
    async fn test_users_fixture_is_stable() {
        let Json(response) = list_users(State(test_state(Environment::Development))).await;
        assert_eq!(response.total, 3);
        assert_eq!(response.users[0].name, "Alice Johnson");
        assert_eq!(response.users[0].role, "admin");
    }

    #[tokio::test]
    async fn test_metrics_reports_store_counts() {
        let state = test_state(Environment::Development);
        state.metrics.record_request("/health");
        state.metrics.record_request("/health");

        let Json(response) = api_metrics(State(state)).await;
        assert_eq!(response.requests_total, 2);
        assert_eq!(response.requests_by_endpoint["/health"], 2);
        assert!(response.uptime_human.ends_with('s'));
    }

    #[test]
    fn test_home_page_mentions_environment() {
        let config = AppConfig {
            environment: Environment::Staging,
            ..AppConfig::default()
        };
        let page = render_home(&config);
        assert!(page.contains("staging"));
        assert!(page.contains("/api/metrics"));
    }

    #[test]
    fn test_home_page_truncates_long_commit() {
        let config = AppConfig {
            git_commit: "0123456789abcdef".to_string(),
            ..AppConfig::default()
        };
        let page = render_home(&config);
        assert!(page.contains("0123456"));
        assert!(!page.contains("0123456789abcdef"));
    }
}
