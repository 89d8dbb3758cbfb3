//! Ficha Semanal server
//!
//! Reads configuration from a TOML file (~/.config/ficha-semanal/config.toml,
//! or the path in `FICHA_CONFIG`), then environment overrides.

use std::path::PathBuf;

use tracing::{error, info};

use ficha_semanal::{default_config_path, init_tracing, AppConfig, ServerHandle, ServerOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("FICHA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let mut cfg = AppConfig::default();
            cfg.apply_env_from(|key| std::env::var(key).ok());
            init_tracing(&cfg);
            error!("{}; using default configuration", e);
            cfg
        }
    };

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: true,
    })
    .await?;
    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down");

    handle.wait().await;
    Ok(())
}
