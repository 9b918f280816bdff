//! Centralized configuration for tasks-cli.
//!
//! All environment variables are loaded and validated at startup to fail fast
//! on misconfiguration rather than halfway through a command.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Backing engine for the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost when the process exits)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("memory") {
            Self::Memory
        } else {
            Self::Sqlite
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Local store engine (default: sqlite)
    pub storage_provider: StorageProvider,
    /// SQLite database path (default: ./data/tasks.db)
    pub db_path: PathBuf,
    /// Log format
    pub log_format: LogFormat,
    /// Latency added to every simulated remote call
    pub remote_latency: Duration,
    /// Whether the simulated remote starts with sample tasks
    pub remote_seed: bool,
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage provider
        let storage_provider =
            StorageProvider::from_str(&var("STORAGE_PROVIDER").unwrap_or_else(|| "sqlite".into()));

        // DB path (for sqlite)
        let db_path = var("DB_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/tasks.db"));

        // Log format
        let log_format = LogFormat::from_str(&var("LOG_FORMAT").unwrap_or_else(|| "pretty".into()));

        // Remote latency
        let remote_latency = match var("REMOTE_LATENCY_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|e| ConfigError {
                    field: "REMOTE_LATENCY_MS",
                    message: format!("Invalid milliseconds '{}': {}", raw, e),
                })?;
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(500),
        };

        // Remote seed
        let remote_seed = match var("REMOTE_SEED") {
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError {
                        field: "REMOTE_SEED",
                        message: format!("Expected true/false, got '{}'", raw),
                    })
                }
            },
            None => true,
        };

        Ok(Self {
            storage_provider,
            db_path,
            log_format,
            remote_latency,
            remote_seed,
        })
    }

    /// Log warnings about configurations that lose data.
    pub fn warn_if_volatile(&self) {
        if self.storage_provider == StorageProvider::Memory {
            tracing::warn!(
                "STORAGE_PROVIDER=memory: the local store is not persisted; every run \
                 starts empty and reloads from the remote."
            );
        }
    }
}
