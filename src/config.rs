//! Configuration management for Inventorist
//!
//! This module handles loading, parsing, and validation of configuration files.
//! The resulting [`Config`] is passed explicitly to the components that need it;
//! nothing here is process-wide state.

use crate::constants::{
    APP_DIR_NAME, CONFIG_FILE_NAME, CONFIG_GENERATED, DATABASE_FILE_NAME, LOCAL_CONFIG_FILE_NAME,
    SYNC_DEFAULT_INTERVAL_MINUTES, SYNC_DEFAULT_MAX_BACKOFF_MINUTES, SYNC_DEFAULT_PULL_PAGE,
    SYNC_DEFAULT_PUSH_BATCH, SYNC_MAX_INTERVAL_MINUTES,
};
use crate::ordering::OrderingScope;
use crate::view::{CategoryFilter, SortMode, ViewQuery};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub view: ViewConfig,
    pub ordering: OrderingConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub remote: RemoteConfig,
}

/// Default presentation of the item list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Sort mode used when no explicit mode is requested
    pub default_sort_mode: SortMode,
    /// Category selected on startup: "all" or a category UUID
    pub default_category: String,
}

/// Manual ordering configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderingConfig {
    /// Set of items over which `sort_order` is kept dense
    pub scope: OrderingScope,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Auto-sync interval in minutes (0 = disabled, manual sync only)
    pub auto_sync_interval_minutes: u64,
    /// Maximum number of queued changes sent in one push request
    pub push_batch_size: usize,
    /// Maximum number of remote changes fetched per pull request
    pub pull_page_size: usize,
    /// Upper bound for the retry delay while the backend is unreachable
    pub max_backoff_minutes: u64,
}

/// Local database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; empty means the platform data directory
    pub database_path: String,
    /// Keep everything in memory (nothing survives a restart)
    pub in_memory: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging to file
    pub enabled: bool,
    /// Minimum level: "error", "warn", "info", "debug" or "trace"
    pub level: String,
}

/// Remote backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Backend type (e.g., "memory", "file")
    pub backend_type: String,
    /// Human-readable name for this backend
    pub name: String,
    /// Whether sync with the backend is enabled
    pub enabled: bool,
    /// Backend-specific configuration as a map of key-value pairs
    pub config: HashMap<String, String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_sort_mode: SortMode::Order,
            default_category: "all".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval_minutes: SYNC_DEFAULT_INTERVAL_MINUTES,
            push_batch_size: SYNC_DEFAULT_PUSH_BATCH,
            pull_page_size: SYNC_DEFAULT_PULL_PAGE,
            max_backoff_minutes: SYNC_DEFAULT_MAX_BACKOFF_MINUTES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend_type: "memory".to_string(),
            name: "In-process".to_string(),
            enabled: true,
            config: HashMap::new(),
        }
    }
}

impl ViewConfig {
    /// Build the startup view query.
    ///
    /// # Errors
    /// Returns an error if `default_category` is neither "all" nor a UUID
    pub fn default_query(&self) -> Result<ViewQuery> {
        let category = if self.default_category.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            let id = uuid::Uuid::parse_str(&self.default_category)
                .with_context(|| format!("Invalid default_category '{}'", self.default_category))?;
            CategoryFilter::Category(id)
        };
        Ok(ViewQuery::new(category, self.default_sort_mode))
    }
}

impl SyncConfig {
    /// Interval between background sync passes, `None` when auto-sync is disabled.
    pub fn auto_sync_interval(&self) -> Option<Duration> {
        if self.auto_sync_interval_minutes == 0 {
            None
        } else {
            Some(Duration::from_secs(self.auto_sync_interval_minutes * 60))
        }
    }

    /// Upper bound for the retry delay while the backend is unreachable.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_minutes * 60)
    }
}

impl StorageConfig {
    /// In-memory storage, used by tests and demos.
    pub fn in_memory() -> Self {
        Self {
            database_path: String::new(),
            in_memory: true,
        }
    }

    /// Resolve the database file path, falling back to the data directory.
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        if !self.database_path.is_empty() {
            return Ok(PathBuf::from(&self.database_path));
        }
        dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
            .map(|dir| dir.join(APP_DIR_NAME).join(DATABASE_FILE_NAME))
    }
}

impl RemoteConfig {
    /// Get a configuration value by key
    pub fn get_config(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    /// Create a file backend configuration pointing at a shared ledger file
    pub fn new_file<P: AsRef<Path>>(name: String, path: P) -> Self {
        let mut config = HashMap::new();
        config.insert("path".to_string(), path.as_ref().display().to_string());

        Self {
            backend_type: "file".to_string(),
            name,
            enabled: true,
            config,
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate view settings
        self.view.default_query()?;

        // Validate sync settings
        if self.sync.auto_sync_interval_minutes > SYNC_MAX_INTERVAL_MINUTES {
            anyhow::bail!(
                "auto_sync_interval_minutes cannot exceed {} (24 hours)",
                SYNC_MAX_INTERVAL_MINUTES
            );
        }
        if self.sync.push_batch_size == 0 {
            anyhow::bail!("push_batch_size must be at least 1");
        }
        if self.sync.pull_page_size == 0 {
            anyhow::bail!("pull_page_size must be at least 1");
        }
        if self.sync.max_backoff_minutes == 0 {
            anyhow::bail!("max_backoff_minutes must be at least 1");
        }

        // Validate logging level
        crate::logger::parse_level(&self.logging.level)?;

        // Validate remote configuration
        self.validate_remote()?;

        Ok(())
    }

    /// Validate the remote backend configuration
    fn validate_remote(&self) -> Result<()> {
        let remote = &self.remote;
        if !remote.enabled {
            return Ok(());
        }
        if remote.name.is_empty() {
            anyhow::bail!("Remote backend: name cannot be empty");
        }

        match remote.backend_type.as_str() {
            "memory" => {}
            "file" => match remote.get_config("path") {
                Some(path) if !path.is_empty() => {}
                Some(_) => anyhow::bail!("Remote backend '{}': path cannot be empty", remote.name),
                None => anyhow::bail!("Remote backend '{}': missing required config 'path'", remote.name),
            },
            "" => anyhow::bail!("Remote backend '{}': backend_type cannot be empty", remote.name),
            backend_type => {
                anyhow::bail!("Remote backend '{}': unsupported backend_type '{}'", remote.name, backend_type);
            }
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Inventorist Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join(CONFIG_FILE_NAME))
    }
}
