//! app-status - Deployment Info and Metrics HTTP Service
//!
//! A small HTTP service providing:
//! - Application/deployment information endpoints
//! - Health check for load balancers and orchestrators
//! - Request counting with per-endpoint breakdown and uptime reporting
//! - Mock user endpoints for demo and smoke-test purposes

pub mod api;
pub mod config;
pub mod metrics;
pub mod server;

pub use config::{create_shared_config, AppConfig, Environment, SharedConfig};
pub use metrics::{create_shared_metrics, format_uptime, MetricsSnapshot, SharedMetrics};

/// Application result type
pub type Result<T> = anyhow::Result<T>;
