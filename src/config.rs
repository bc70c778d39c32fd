//! Configuration types for peptide-tasks

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Filesystem locations used by the export pipeline
///
/// Groups settings related to where peptide assets are read from and where
/// export artifacts are written. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the per-peptide asset tree (default: "./assets")
    ///
    /// Resource sources live below `peptides/` (e.g. `peptides/pdb/{id}.pdb`).
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Scratch directory for per-build working directories (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Directory where finished archives are published (default: "./archives")
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            temp_dir: default_temp_dir(),
            archive_dir: default_archive_dir(),
        }
    }
}

/// Data storage and state management
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path for status records (default: "./peptide-tasks.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Background task behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskConfig {
    /// How long search task records stay pollable (default: 1 hour)
    #[serde(default = "default_search_ttl", with = "duration_serde")]
    pub search_ttl: Duration,

    /// How long export task records stay pollable (default: 24 hours)
    #[serde(default = "default_export_ttl", with = "duration_serde")]
    pub export_ttl: Duration,

    /// Upper bound on concurrently executing tasks (default: unbounded)
    ///
    /// `None` spawns every task immediately. When set, tasks beyond the limit
    /// persist their initial record and then wait for a permit.
    #[serde(default)]
    pub max_concurrent_tasks: Option<usize>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            search_ttl: default_search_ttl(),
            export_ttl: default_export_ttl(),
            max_concurrent_tasks: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration
///
/// Fields are organized into logical sub-configs:
/// - [`storage`](StorageConfig) — asset, scratch and archive directories
/// - [`persistence`](PersistenceConfig) — status database location
/// - [`tasks`](TaskConfig) — record lifetimes and concurrency
/// - [`api`](ApiConfig) — HTTP trigger layer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Asset, scratch and archive directories
    #[serde(default)]
    pub storage: StorageConfig,

    /// Status database location
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Record lifetimes and concurrency
    #[serde(default)]
    pub tasks: TaskConfig,

    /// HTTP trigger layer
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Reads a `.env` file first if one is present. Recognized variables:
    /// `ASSETS_LOCATION`, `TEMP_ARTIFACTS_LOCATION`, `ARCHIVE_LOCATION`,
    /// `DATABASE_PATH`, `API_BIND_ADDRESS`, `MAX_CONCURRENT_TASKS`,
    /// `SEARCH_TTL_SECS` and `EXPORT_TTL_SECS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Used by [`Config::from_env`]; tests pass a map-backed closure instead of
    /// mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(v) = lookup("ASSETS_LOCATION") {
            config.storage.assets_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("TEMP_ARTIFACTS_LOCATION") {
            config.storage.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ARCHIVE_LOCATION") {
            config.storage.archive_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            config.persistence.database_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("API_BIND_ADDRESS") {
            config.api.bind_address = parse_var("API_BIND_ADDRESS", &v)?;
        }
        if let Some(v) = lookup("MAX_CONCURRENT_TASKS") {
            config.tasks.max_concurrent_tasks = Some(parse_var("MAX_CONCURRENT_TASKS", &v)?);
        }
        if let Some(v) = lookup("SEARCH_TTL_SECS") {
            config.tasks.search_ttl = Duration::from_secs(parse_var("SEARCH_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("EXPORT_TTL_SECS") {
            config.tasks.export_ttl = Duration::from_secs(parse_var("EXPORT_TTL_SECS", &v)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the task framework unusable
    pub fn validate(&self) -> Result<()> {
        if self.tasks.search_ttl.is_zero() {
            return Err(Error::Config {
                message: "search TTL must be greater than zero".to_string(),
                key: Some("search_ttl".to_string()),
            });
        }
        if self.tasks.export_ttl.is_zero() {
            return Err(Error::Config {
                message: "export TTL must be greater than zero".to_string(),
                key: Some("export_ttl".to_string()),
            });
        }
        if self.tasks.max_concurrent_tasks == Some(0) {
            return Err(Error::Config {
                message: "max_concurrent_tasks must be at least 1 when set".to_string(),
                key: Some("max_concurrent_tasks".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::Config {
        message: format!("invalid value {:?} for {}: {}", value, key, e),
        key: Some(key.to_string()),
    })
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./archives")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./peptide-tasks.db")
}

fn default_search_ttl() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_export_ttl() -> Duration {
    Duration::from_secs(60 * 60 * 24)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
