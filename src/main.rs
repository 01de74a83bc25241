//! DocuMind server
//!
//! Entry point: loads configuration, initializes logging and serves the page.

use std::sync::Arc;

use dotenvy::dotenv;
use mimalloc::MiMalloc;
use tracing::info;

use documind::config::AppConfig;
use documind::{server, telemetry};

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before the config layers read the environment
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(config.logging.format);

    info!(
        name: "config.loaded",
        address = %config.server.address(),
        reply_delay_ms = config.chat.reply_delay_ms,
        prefs = %config.prefs.path.display(),
        "Configuration loaded"
    );

    server::start_server(Arc::new(config)).await
}
