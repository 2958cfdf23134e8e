use inventorist::config::LoggingConfig;
use inventorist::logger;
use log::LevelFilter;

#[test]
fn test_parse_level() {
    assert_eq!(logger::parse_level("info").unwrap(), LevelFilter::Info);
    assert_eq!(logger::parse_level("WARNING").unwrap(), LevelFilter::Warn);
    assert_eq!(logger::parse_level("trace").unwrap(), LevelFilter::Trace);
    assert_eq!(logger::parse_level("off").unwrap(), LevelFilter::Off);
    assert!(logger::parse_level("chatty").is_err());
}

#[test]
fn test_disabled_logging_installs_nothing() {
    let config = LoggingConfig::default();
    assert!(!config.enabled);
    assert_eq!(logger::init(&config).unwrap(), None);
}

#[test]
fn test_log_file_path() {
    // Log file path should be under the cache directory when one exists
    if let Ok(path) = logger::get_log_file_path() {
        assert!(path.ends_with("inventorist/inventorist.log"));
    }
}

#[test]
fn test_enabled_logging_writes_to_file() {
    let config = LoggingConfig {
        enabled: true,
        level: "debug".to_string(),
    };

    // May fail in sandboxes without a writable cache directory, that's okay
    let Ok(Some(path)) = logger::init(&config) else {
        return;
    };
    log::info!("logger smoke test");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("logger smoke test"));

    // A second initialisation returns the same file
    assert_eq!(logger::init(&config).unwrap(), Some(path));
}
