// Config loading and validation tests

use hostmon::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8787
host = "127.0.0.1"

[settings]
path = "data/settings.db"
max_pool_size = 4

[monitoring]
update_interval_ms = 2000
warm_start = false
process_markers = ["idea", "java"]
stats_log_interval_secs = 60

[panel]
channel_capacity = 16
"#;

const MINIMAL_CONFIG: &str = r#"
[server]
port = 8787
host = "127.0.0.1"

[settings]
path = "data/settings.db"

[monitoring]
stats_log_interval_secs = 60
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8787);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.settings.path, "data/settings.db");
    assert_eq!(config.settings.max_pool_size, 4);
    assert_eq!(config.monitoring.update_interval_ms, 2000);
    assert!(!config.monitoring.warm_start);
    assert_eq!(config.monitoring.process_markers, vec!["idea", "java"]);
    assert_eq!(config.panel.channel_capacity, 16);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).expect("valid");
    assert_eq!(config.settings.max_pool_size, 2);
    assert_eq!(config.monitoring.update_interval_ms, 4000);
    assert!(config.monitoring.warm_start);
    assert_eq!(
        config.monitoring.process_markers,
        vec!["code", "electron", "vscode"]
    );
    assert_eq!(config.panel.channel_capacity, 32);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8787", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_settings_path() {
    let bad = VALID_CONFIG.replace("path = \"data/settings.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("settings.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 4", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_short_update_interval() {
    let bad = VALID_CONFIG.replace("update_interval_ms = 2000", "update_interval_ms = 100");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("update_interval_ms"));
}

#[test]
fn test_config_accepts_minimum_update_interval() {
    let ok = VALID_CONFIG.replace("update_interval_ms = 2000", "update_interval_ms = 500");
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_config_validation_rejects_blank_process_markers() {
    let bad = VALID_CONFIG.replace(
        "process_markers = [\"idea\", \"java\"]",
        "process_markers = [\" \", \"\"]",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("process_markers"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 60",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_validation_rejects_channel_capacity_zero() {
    let bad = VALID_CONFIG.replace("channel_capacity = 16", "channel_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("channel_capacity"));
}

#[test]
fn test_config_validation_rejects_missing_section() {
    let err = AppConfig::load_from_str("[server]\nport = 1\nhost = \"x\"\n").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file_via_env() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    unsafe { std::env::set_var("CONFIG_FILE", path.to_str().unwrap()) };
    let result = AppConfig::load();
    unsafe { std::env::remove_var("CONFIG_FILE") };
    let config = result.expect("load from CONFIG_FILE");
    assert_eq!(config.server.port, 8787);
    assert_eq!(config.settings.path, "data/settings.db");
}
