use inventorist::config::{Config, RemoteConfig};
use inventorist::ordering::OrderingScope;
use inventorist::view::{CategoryFilter, SortMode};
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.view.default_sort_mode, SortMode::Order);
    assert_eq!(config.view.default_category, "all");
    assert_eq!(config.ordering.scope, OrderingScope::Collection);
    assert_eq!(config.sync.auto_sync_interval_minutes, 5);
    assert_eq!(config.remote.backend_type, "memory");
    assert!(!config.storage.in_memory);
    assert!(!config.logging.enabled);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Invalid sync interval
    config.sync.auto_sync_interval_minutes = 2000;
    assert!(config.validate().is_err());

    // Reset and test invalid batch size
    config.sync.auto_sync_interval_minutes = 5;
    config.sync.push_batch_size = 0;
    assert!(config.validate().is_err());

    // Reset and test invalid log level
    config.sync.push_batch_size = 10;
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());

    // Reset and test invalid default category
    config.logging.level = "debug".to_string();
    config.view.default_category = "kitchen".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_remote_validation() {
    let mut config = Config::default();

    config.remote.backend_type = "file".to_string();
    assert!(config.validate().is_err());

    config.remote = RemoteConfig::new_file("Shared folder".to_string(), "/tmp/inventorist/ledger.json");
    assert!(config.validate().is_ok());

    config.remote.backend_type = "ftp".to_string();
    assert!(config.validate().is_err());

    // Disabled remotes are not checked
    config.remote.enabled = false;
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("default_sort_mode = \"order\""));
    assert!(toml_str.contains("scope = \"collection\""));
    assert!(toml_str.contains("auto_sync_interval_minutes = 5"));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
[view]
default_sort_mode = "date_modified"

[ordering]
scope = "category"

[sync]
auto_sync_interval_minutes = 0

[remote]
backend_type = "file"
name = "Dropbox"

[remote.config]
path = "/home/me/Dropbox/inventory.json"
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.view.default_sort_mode, SortMode::DateModified);
    assert_eq!(config.ordering.scope, OrderingScope::Category);
    assert_eq!(config.sync.auto_sync_interval(), None);
    assert_eq!(
        config.remote.get_config("path").map(String::as_str),
        Some("/home/me/Dropbox/inventory.json")
    );

    // Check that unspecified values use defaults
    assert_eq!(config.view.default_category, "all");
    assert_eq!(config.sync.push_batch_size, 100);
    assert_eq!(config.sync.max_backoff(), Duration::from_secs(3600));
    assert!(config.remote.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_config_deserialization() {
    // Test that empty TOML uses all defaults
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.view.default_sort_mode, default_config.view.default_sort_mode);
    assert_eq!(
        config.sync.auto_sync_interval_minutes,
        default_config.sync.auto_sync_interval_minutes
    );
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
}

#[test]
fn test_default_query() {
    let mut config = Config::default();
    let query = config.view.default_query().unwrap();
    assert_eq!(query.category, CategoryFilter::All);
    assert_eq!(query.sort_mode, SortMode::Order);

    let id = uuid::Uuid::new_v4();
    config.view.default_category = id.to_string();
    config.view.default_sort_mode = SortMode::Alphabetical;
    let query = config.view.default_query().unwrap();
    assert_eq!(query.category, CategoryFilter::Category(id));
    assert_eq!(query.sort_mode, SortMode::Alphabetical);
}

#[test]
fn test_generate_config_creates_directory() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");

    // Generate config should create the directory structure
    let result = Config::generate_default_config(&config_path);
    assert!(result.is_ok());
    assert!(config_path.exists());

    // Verify the file contains expected content
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("# Inventorist Configuration File"));
    assert!(content.contains("default_sort_mode = \"order\""));

    // The generated file loads back
    let loaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.sync.pull_page_size, Config::default().sync.pull_page_size);
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "[view]\ndefault_sort_mode = \"random\"\n").unwrap();
    assert!(Config::load_from_file(&config_path).is_err());

    std::fs::write(&config_path, "[sync]\nmax_backoff_minutes = 0\n").unwrap();
    assert!(Config::load_from_file(&config_path).is_err());
}
