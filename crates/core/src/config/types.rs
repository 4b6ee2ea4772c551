use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::workspace::{version_string, Workspace};

/// Root configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn workspace(&self) -> Workspace {
        Workspace::new(
            self.workspace
                .dir
                .clone()
                .unwrap_or_else(Workspace::default_dir),
        )
    }

    pub fn database_path(&self, workspace: &Workspace) -> PathBuf {
        workspace.resolve(&self.database.path)
    }

    pub fn registry_path(&self, workspace: &Workspace) -> PathBuf {
        workspace.resolve(&self.sources.registry)
    }
}

/// Working directory configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkspaceConfig {
    /// Defaults to `<user data dir>/NoPayStation`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve inside the working directory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("database.db")
}

/// Source registry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Relative paths resolve inside the working directory.
    #[serde(default = "default_registry_path")]
    pub registry: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            registry: default_registry_path(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("sources.json")
}

/// HTTP fetch configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "version_string")]
    pub user_agent: String,
    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 0 means unlimited.
    #[serde(default)]
    pub max_bytes_per_second: u64,
    /// Minimum time between progress notifications.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: version_string(),
            timeout_secs: default_timeout_secs(),
            max_bytes_per_second: 0,
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_progress_interval_ms() -> u64 {
    500
}

/// Sync runner configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Sources fetched and ingested at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Ingest existing cache files without fetching.
    #[serde(default)]
    pub skip_fetch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            skip_fetch: false,
        }
    }
}

fn default_concurrency() -> usize {
    2
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
