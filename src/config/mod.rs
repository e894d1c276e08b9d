//! Configuration module for app-status
//!
//! The configuration is loaded once at startup from environment variables
//! (with optional `config.toml` and `.env` overrides) and is immutable for
//! the lifetime of the process.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Deployment environment the application runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    /// Feature flags derived from the environment.
    ///
    /// None of these toggle real behavior here; they are reported through
    /// the config endpoint so deploy tooling can inspect them.
    pub fn features(&self) -> FeatureFlags {
        FeatureFlags {
            authentication: *self == Environment::Production,
            debug_mode: *self == Environment::Development,
            rate_limiting: matches!(self, Environment::Staging | Environment::Production),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Test => "test",
        };
        f.write_str(name)
    }
}

/// Environment-derived feature flags
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub authentication: bool,
    pub debug_mode: bool,
    pub rate_limiting: bool,
}

/// Immutable application configuration snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application version
    #[serde(rename = "app_version", default = "default_version")]
    pub version: String,
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,
    /// Build timestamp (ISO 8601)
    #[serde(default = "now_iso")]
    pub build_time: String,
    /// Git commit the build was produced from
    #[serde(default = "default_unknown")]
    pub git_commit: String,
    /// Git branch the build was produced from
    #[serde(default = "default_unknown")]
    pub git_branch: String,
    /// Timestamp of process start (ISO 8601), set at load time
    #[serde(default = "now_iso")]
    pub deployed_at: String,
    /// Host to bind the server to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Hostname reported by info endpoints
    #[serde(default = "default_unknown")]
    pub hostname: String,
    /// CI build number
    #[serde(default = "default_build_number")]
    pub build_number: String,
    /// Verbose logging toggle
    #[serde(default)]
    pub debug: bool,
}

fn default_version() -> String {
    "dev".to_string()
}

fn default_unknown() -> String {
    "unknown".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_build_number() -> String {
    "local".to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            environment: Environment::default(),
            build_time: now_iso(),
            git_commit: default_unknown(),
            git_branch: default_unknown(),
            deployed_at: now_iso(),
            host: default_host(),
            port: default_port(),
            hostname: default_unknown(),
            build_number: default_build_number(),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// Layering: defaults, then `config.toml` if present, then environment
    /// variables (`APP_VERSION`, `ENVIRONMENT`, `BUILD_TIME`, `GIT_COMMIT`,
    /// `GIT_BRANCH`, `PORT`, `BUILD_NUMBER`, `DEBUG`, `HOSTNAME`).
    /// A malformed `PORT` or an unrecognized `ENVIRONMENT` value is a
    /// configuration error rather than a silent fallback.
    pub fn load() -> anyhow::Result<Self> {
        // Try to load .env file (ignore if not found)
        let _ = dotenvy::dotenv();

        let mut config = config::Config::builder();

        // Add default config
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Try to load from config file if it exists
        if std::path::Path::new("config.toml").exists() {
            config = config.add_source(config::File::with_name("config").required(false));
        }

        // Override with environment variables (unprefixed, matching the
        // names the deploy pipeline exports)
        config = config.add_source(config::Environment::default().try_parsing(true));

        let config = config.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // deployed_at always reflects this process start, never the env
        app_config.deployed_at = now_iso();

        Ok(app_config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).or_else(|_| serde_json::from_str(&contents))?;
        Ok(config)
    }
}

/// Shared immutable configuration handle for use across handlers
pub type SharedConfig = Arc<AppConfig>;

/// Create a new shared configuration
pub fn create_shared_config(config: AppConfig) -> SharedConfig {
    Arc::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, "dev");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.git_commit, "unknown");
        assert!(!config.debug);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn test_environment_parse() {
        let env: Environment = serde_json::from_str("\"staging\"").unwrap();
        assert_eq!(env, Environment::Staging);

        // Unknown values are rejected, not silently defaulted
        assert!(serde_json::from_str::<Environment>("\"qa\"").is_err());
    }

    #[test]
    fn test_production_features() {
        let features = Environment::Production.features();
        assert!(features.authentication);
        assert!(!features.debug_mode);
        assert!(features.rate_limiting);
    }

    #[test]
    fn test_development_features() {
        let features = Environment::Development.features();
        assert!(!features.authentication);
        assert!(features.debug_mode);
        assert!(!features.rate_limiting);
    }

    #[test]
    fn test_staging_features() {
        let features = Environment::Staging.features();
        assert!(!features.authentication);
        assert!(features.rate_limiting);
    }

    #[test]
    fn test_load_from_toml() {
        let toml_str = r#"
            app_version = "2.1.0"
            environment = "production"
            port = 8080
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.version, "2.1.0");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.port, 8080);
        // Unset fields fall back to defaults
        assert_eq!(config.git_branch, "unknown");
    }
}
