//! # Invoicer Configuration
//!
//! Settings for the database, the sequence allocator and page layout.
//!
//! ## Load Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults                                                            │
//! │  2. invoicer.toml in the platform config dir (or an explicit path)      │
//! │  3. INVOICER_* environment variables                                    │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example File
//! ```toml
//! [database]
//! path = "/var/lib/invoicer/invoicer.db"
//! max_connections = 5
//!
//! [allocator]
//! timeout_ms = 5000
//! max_retries = 5
//! initial_backoff_ms = 20
//! max_backoff_ms = 500
//!
//! [layout]
//! rows_per_page = 15
//! first_page_reserved_rows = 2
//! ```
//!
//! ## Environment Overrides
//! | Variable                            | Setting                             |
//! |-------------------------------------|-------------------------------------|
//! | `INVOICER_DB_PATH`                  | `database.path`                     |
//! | `INVOICER_ALLOC_TIMEOUT_MS`         | `allocator.timeout_ms`              |
//! | `INVOICER_ALLOC_MAX_RETRIES`        | `allocator.max_retries`             |
//! | `INVOICER_ROWS_PER_PAGE`            | `layout.rows_per_page`              |
//! | `INVOICER_FIRST_PAGE_RESERVED_ROWS` | `layout.first_page_reserved_rows`   |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use invoicer_core::layout::PageCapacity;
use invoicer_core::{FIRST_PAGE_RESERVED_ROWS, ROWS_PER_PAGE};

use crate::allocator::AllocatorPolicy;
use crate::pool::DbConfig;

const CONFIG_FILE_NAME: &str = "invoicer.toml";
const DB_FILE_NAME: &str = "invoicer.db";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available on this platform")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `invoicer.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorSettings {
    /// Deadline for one allocation, retries included.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    20
}

fn default_max_backoff_ms() -> u64 {
    500
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        AllocatorSettings {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,

    #[serde(default = "default_first_page_reserved_rows")]
    pub first_page_reserved_rows: usize,
}

fn default_rows_per_page() -> usize {
    ROWS_PER_PAGE
}

fn default_first_page_reserved_rows() -> usize {
    FIRST_PAGE_RESERVED_ROWS
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            rows_per_page: default_rows_per_page(),
            first_page_reserved_rows: default_first_page_reserved_rows(),
        }
    }
}

// =============================================================================
// Invoicer Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub allocator: AllocatorSettings,

    #[serde(default)]
    pub layout: LayoutSettings,
}

impl InvoicerConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading invoicer config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load invoicer config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Invoicer config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.allocator.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "allocator.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.allocator.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "allocator.max_retries must be at least 1".into(),
            ));
        }
        if self.allocator.initial_backoff_ms > self.allocator.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "allocator.initial_backoff_ms cannot exceed max_backoff_ms".into(),
            ));
        }
        self.page_capacity()?;
        Ok(())
    }

    /// Applies `INVOICER_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("INVOICER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        override_parsed(&lookup, "INVOICER_ALLOC_TIMEOUT_MS", &mut self.allocator.timeout_ms);
        override_parsed(&lookup, "INVOICER_ALLOC_MAX_RETRIES", &mut self.allocator.max_retries);
        override_parsed(&lookup, "INVOICER_ROWS_PER_PAGE", &mut self.layout.rows_per_page);
        override_parsed(
            &lookup,
            "INVOICER_FIRST_PAGE_RESERVED_ROWS",
            &mut self.layout.first_page_reserved_rows,
        );
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "invoicer", "invoicer")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn default_database_path() -> PathBuf {
        directories::ProjectDirs::from("com", "invoicer", "invoicer")
            .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path()).max_connections(self.database.max_connections)
    }

    pub fn allocator_policy(&self) -> AllocatorPolicy {
        AllocatorPolicy {
            timeout: Duration::from_millis(self.allocator.timeout_ms),
            max_retries: self.allocator.max_retries,
            initial_backoff: Duration::from_millis(self.allocator.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.allocator.max_backoff_ms),
        }
    }

    pub fn page_capacity(&self) -> ConfigResult<PageCapacity> {
        PageCapacity::new(
            self.layout.rows_per_page,
            self.layout.first_page_reserved_rows,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => {
                debug!(key, value = %raw, "Overriding setting from environment");
                *target = value;
            }
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable environment override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = InvoicerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout.rows_per_page, 15);
        assert_eq!(config.layout.first_page_reserved_rows, 2);
        assert_eq!(config.allocator_policy(), AllocatorPolicy::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = InvoicerConfig::default();
        config.allocator.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = InvoicerConfig::default();
        config.allocator.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = InvoicerConfig::default();
        config.layout.rows_per_page = 2;
        config.layout.first_page_reserved_rows = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: InvoicerConfig = toml::from_str(
            r#"
            [layout]
            rows_per_page = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.layout.rows_per_page, 20);
        assert_eq!(config.layout.first_page_reserved_rows, 2);
        assert_eq!(config.allocator.max_retries, 5);
        assert_eq!(config.page_capacity().unwrap().first_page_items(), 18);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("INVOICER_DB_PATH", "/tmp/x.db"),
            ("INVOICER_ALLOC_TIMEOUT_MS", "250"),
            ("INVOICER_ALLOC_MAX_RETRIES", "not-a-number"),
            ("INVOICER_ROWS_PER_PAGE", "30"),
        ]
        .into_iter()
        .collect();

        let mut config = InvoicerConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.allocator.timeout_ms, 250);
        assert_eq!(config.allocator.max_retries, 5);
        assert_eq!(config.layout.rows_per_page, 30);
        assert_eq!(config.db_config().database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_toml_serialization() {
        let config = InvoicerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[allocator]"));
        assert!(toml_str.contains("[layout]"));

        let parsed: InvoicerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("invoicer-{}.toml", uuid::Uuid::new_v4()));
        let mut config = InvoicerConfig::default();
        config.allocator.max_retries = 9;

        config.save(Some(path.clone())).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: InvoicerConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.allocator.max_retries, 9);

        let _ = std::fs::remove_file(&path);
    }
}
