//! Constants used throughout the application
//!
//! This module centralizes magic strings, default values and display text
//! shared by the store, the view builder and the binary.

// Display fallbacks for weak references
pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const UNCATEGORIZED: &str = "";
pub const ALL_ITEMS: &str = "All Items";

// Default colors
pub const DEFAULT_LOCATION_COLOR: &str = "#8E8E93";

// Storage
pub const APP_DIR_NAME: &str = "inventorist";
pub const DATABASE_FILE_NAME: &str = "inventory.db";
pub const LOG_FILE_NAME: &str = "inventorist.log";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOCAL_CONFIG_FILE_NAME: &str = "inventorist.toml";

// Sync
pub const SYNC_CURSOR_KEY: &str = "remote_cursor";
pub const SYNC_DEFAULT_INTERVAL_MINUTES: u64 = 5;
pub const SYNC_MAX_INTERVAL_MINUTES: u64 = 1440;
pub const SYNC_DEFAULT_PUSH_BATCH: usize = 100;
pub const SYNC_DEFAULT_PULL_PAGE: usize = 200;
pub const SYNC_DEFAULT_MAX_BACKOFF_MINUTES: u64 = 60;
pub const STORE_EVENT_CAPACITY: usize = 256;

// Status messages
pub const CONFIG_GENERATED: &str = "✅ Configuration file generated";
pub const SYNC_UNAVAILABLE: &str = "⚠️  Sync paused: backend unavailable";
pub const SYNC_COMPLETED: &str = "✅ Sync completed";
