use documind::config::{AppConfig, LogFormat};
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("DOCUMIND_SERVER__PORT");
        env::remove_var("DOCUMIND_CHAT__REPLY_DELAY_MS");
        env::remove_var("DOCUMIND_LOGGING__FORMAT");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("BACKEND_URL");
        env::remove_var("REPLY_DELAY_MS");
        env::remove_var("REPLY_TIMEOUT_MS");
        env::remove_var("LOG_FORMAT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["documind"]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.chat.reply_delay_ms, 2000);
    assert!(config.chat.backend_url.is_none());
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("DOCUMIND_SERVER__PORT", "9090");
        env::set_var("DOCUMIND_CHAT__REPLY_DELAY_MS", "25");
    }

    let config = AppConfig::load_from_args(["documind"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.chat.reply_delay_ms, 25);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("DOCUMIND_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["documind", "--port", "8181"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 8181);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("documind.yaml");
    fs::write(
        &file_path,
        r"
server:
  port: 7070
chat:
  backend_url: http://127.0.0.1:8000/reply
logging:
  format: json
",
    )
    .expect("Failed to write temp config");

    let config = AppConfig::load_from_args([
        "documind",
        "--config",
        file_path.to_str().unwrap(),
    ])
    .expect("Failed to load config from file");

    assert_eq!(config.server.port, 7070);
    assert_eq!(
        config.chat.backend_url.as_ref().map(url::Url::as_str),
        Some("http://127.0.0.1:8000/reply")
    );
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args(["documind", "--config", "/nonexistent/documind.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let cwd_path = "config.yaml";
    fs::write(cwd_path, "server:\n  port: 6060\n").expect("Failed to write ./config.yaml");

    let config = AppConfig::load_from_args(["documind"]);

    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6060);
}

#[test]
#[serial]
fn test_delay_above_timeout_is_rejected() {
    clear_env_vars();
    unsafe {
        env::set_var("DOCUMIND_CHAT__REPLY_DELAY_MS", "20000");
    }

    let result = AppConfig::load_from_args(["documind"]);
    clear_env_vars();

    let err = result.expect_err("delay past the reply timeout should fail to load");
    assert!(err.to_string().contains("reply_delay_ms"));
}
