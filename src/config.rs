use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::chat::{ERROR_REPLY, PLACEHOLDER_REPLY};

/// Prefix for environment overrides, e.g. `DOCUMIND_SERVER__PORT=8000`.
const ENV_PREFIX: &str = "DOCUMIND";

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Reply backend endpoint; the simulated backend is used when unset
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Simulated reply latency in milliseconds
    #[arg(long, env = "REPLY_DELAY_MS")]
    pub reply_delay_ms: Option<u64>,

    /// Upper bound on a single reply in milliseconds
    #[arg(long, env = "REPLY_TIMEOUT_MS")]
    pub reply_timeout_ms: Option<u64>,

    /// Log output format (pretty or json)
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub prefs: PrefsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_ms: u64,
    pub timeout_disabled: bool,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub reply_delay_ms: u64,
    pub reply_timeout_ms: u64,
    #[serde(default)]
    pub backend_url: Option<Url>,
    pub placeholder_reply: String,
    pub error_reply: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrefsConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-request timeout. A disabled timeout becomes one year so the
    /// middleware stack keeps a single type.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        if self.timeout_disabled {
            Duration::from_secs(365 * 24 * 60 * 60)
        } else {
            Duration::from_millis(self.request_timeout_ms)
        }
    }
}

impl ChatConfig {
    #[must_use]
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.request_timeout_ms", 30_000)?
            .set_default("server.timeout_disabled", false)?
            .set_default("server.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("chat.reply_delay_ms", 2000)?
            .set_default("chat.reply_timeout_ms", 10_000)?
            .set_default("chat.placeholder_reply", PLACEHOLDER_REPLY)?
            .set_default("chat.error_reply", ERROR_REPLY)?
            .set_default("prefs.path", "documind-prefs.json")?
            .set_default("logging.format", "pretty")?;

        // An explicit file must exist; the working-directory fallback may not.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Priority: CLI flag > CLI env var > prefixed env > config file > defaults.
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("chat.backend_url", url)?;
        }
        if let Some(delay) = cli.reply_delay_ms {
            builder = builder.set_override("chat.reply_delay_ms", delay)?;
        }
        if let Some(timeout) = cli.reply_timeout_ms {
            builder = builder.set_override("chat.reply_timeout_ms", timeout)?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("logging.format", format.to_lowercase())?;
        }

        let cfg = builder.build()?;
        let config: Self = cfg.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that load but can never work.
    fn validate(&self) -> Result<(), config::ConfigError> {
        // The simulated reply must be able to beat the pipeline timeout.
        if self.chat.backend_url.is_none()
            && self.chat.reply_delay_ms >= self.chat.reply_timeout_ms
        {
            return Err(config::ConfigError::Message(format!(
                "chat.reply_delay_ms ({}) must be below chat.reply_timeout_ms ({})",
                self.chat.reply_delay_ms, self.chat.reply_timeout_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_defaults() {
        let config = AppConfig::load_from_args([
            "documind",
            "--port",
            "4100",
            "--reply-delay-ms",
            "50",
            "--backend-url",
            "http://127.0.0.1:8000/chat",
            "--log-format",
            "JSON",
        ])
        .unwrap();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.chat.reply_delay(), Duration::from_millis(50));
        assert_eq!(
            config.chat.backend_url.as_ref().map(Url::as_str),
            Some("http://127.0.0.1:8000/chat")
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_simulated_delay_must_beat_reply_timeout() {
        let err = AppConfig::load_from_args([
            "documind",
            "--reply-delay-ms",
            "300",
            "--reply-timeout-ms",
            "100",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("reply_timeout_ms"));

        let config = AppConfig::load_from_args([
            "documind",
            "--reply-delay-ms",
            "300",
            "--reply-timeout-ms",
            "1000",
        ])
        .unwrap();
        assert_eq!(config.chat.reply_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_invalid_backend_url_is_rejected() {
        let result = AppConfig::load_from_args(["documind", "--backend-url", "not a url"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_disabled_timeout_is_effectively_unbounded() {
        let server = ServerConfig {
            host: "127.0.0.1".into(),
            port: 3000,
            request_timeout_ms: 10,
            timeout_disabled: true,
            max_upload_bytes: 1,
        };
        assert!(server.request_timeout() > Duration::from_secs(24 * 60 * 60));
        assert_eq!(server.address(), "127.0.0.1:3000");
    }
}
