use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::MatchQuery;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub matching_service: MatchingServiceSettings,
    pub session: SessionSettings,
    #[serde(default)]
    pub eligibility: EligibilitySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingServiceSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl MatchingServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }
}

/// The review session the service starts with
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub admin_id: String,
    pub job_source: String,
    pub job_id: String,
    pub limit: Option<u16>,
    pub max_score_threshold: Option<f64>,
    #[serde(default)]
    pub approved_only: bool,
}

impl SessionSettings {
    pub fn query(&self) -> MatchQuery {
        let mut query = MatchQuery::new(self.job_source.clone(), self.job_id.clone());
        if let Some(limit) = self.limit {
            query.limit = limit;
        }
        query.max_score_threshold = self.max_score_threshold;
        query.approved_only = self.approved_only;
        query
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EligibilitySettings {
    /// Also list skill gaps on results that already fail a hard rule
    #[serde(default)]
    pub include_skill_gaps_when_ineligible: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Text,
}

impl LogFormat {
    /// Unknown names fall back to JSON
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "text" => Self::Text,
            _ => Self::Json,
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PLACEMENT_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PLACEMENT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PLACEMENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_shortcuts(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from `CONFIG_PATH` when set, otherwise from the default locations
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::load_from(path),
            Err(_) => Self::load(),
        }
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PLACEMENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_env_shortcuts(settings)?;

        settings.try_deserialize()
    }
}

/// Honour the unprefixed variables deployments commonly set
fn apply_env_shortcuts(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("MATCHING_SERVICE_URL") {
        builder = builder.set_override("matching_service.base_url", url)?;
    }
    if let Ok(key) = env::var("MATCHING_SERVICE_API_KEY") {
        builder = builder.set_override("matching_service.api_key", key)?;
    }

    builder.build()
}
