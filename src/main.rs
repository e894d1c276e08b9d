//! app-status - Main Application
//!
//! A Rust HTTP service exposing deployment info, health, and metrics
//! endpoints for a deployed application.

use app_status::{
    config::{create_shared_config, AppConfig},
    metrics::create_shared_metrics,
    server::start_server,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// app-status - Deployment Info and Metrics HTTP Service
#[derive(Parser)]
#[command(name = "app-status")]
#[command(about = "An HTTP service with deployment info, health checks, and request metrics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Server host
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Server,
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("app_status={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a malformed environment is a startup error
    let mut config = if std::path::Path::new(&cli.config).exists() {
        AppConfig::load_from_file(&cli.config)?
    } else {
        AppConfig::load()?
    };

    // Override with CLI args
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    match cli.command {
        Some(Commands::Server) | None => {
            tracing::info!(
                version = %config.version,
                environment = %config.environment,
                git_commit = %config.git_commit,
                git_branch = %config.git_branch,
                "Starting app-status server"
            );

            let shared_config = create_shared_config(config);
            let metrics = create_shared_metrics();
            start_server(shared_config, metrics).await?;
        }
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
