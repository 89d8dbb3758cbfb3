//! Ficha Semanal CLI
//!
//! ```sh
//! # Run the server with the default config (~/.config/ficha-semanal/config.toml)
//! ficha-cli serve
//!
//! # Validate config and print the security posture
//! ficha-cli --config /etc/ficha-semanal/config.toml serve --check
//!
//! # Client side
//! ficha-cli token
//! ficha-cli submit ficha.json
//! ficha-cli export --api-key "$POWERBI_API_KEY"
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use ficha_semanal::domain::Submission;
use ficha_semanal::{
    default_config_path, init_tracing, AppConfig, FichaClient, ServerHandle, ServerOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "ficha-cli",
    version,
    about = "Weekly timesheet service: server and client",
    long_about = "Ficha Semanal: token-guarded timesheet collection with a BI export.\n\n\
                  Default config: ~/.config/ficha-semanal/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, env = "FICHA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// Override the listen port.
        #[arg(long)]
        port: Option<u16>,

        /// Validate the configuration and exit without starting the server.
        #[arg(long)]
        check: bool,

        /// Skip database migrations on startup.
        #[arg(long)]
        no_migrate: bool,
    },
    /// Fetch a submit token and print it.
    Token {
        /// Server base URL (defaults to the configured local port).
        #[arg(long, env = "FICHA_URL")]
        url: Option<String>,
    },
    /// Submit a timesheet from a JSON file.
    Submit {
        file: PathBuf,

        #[arg(long, env = "FICHA_URL")]
        url: Option<String>,

        /// Use the API-key endpoint instead of a submit token.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Print the BI export as JSON.
    Export {
        #[arg(long, env = "POWERBI_API_KEY")]
        api_key: String,

        #[arg(long, env = "FICHA_URL")]
        url: Option<String>,
    },
}

fn load_config(path: &Path) -> AppConfig {
    match AppConfig::load(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}; using default configuration");
            let mut cfg = AppConfig::default();
            cfg.apply_env_from(|key| std::env::var(key).ok());
            cfg
        }
    }
}

fn base_url(url: Option<String>, config: &AppConfig) -> String {
    url.unwrap_or_else(|| format!("http://127.0.0.1:{}", config.server.port))
}

fn read_submission(path: &Path) -> Result<Submission, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path);

    match &cli.command {
        Command::Serve { .. } => {
            if let Some(level) = &cli.log_level {
                config.logging.level = level.clone();
            }
        }
        _ => config.logging.level = cli.log_level.clone().unwrap_or_else(|| "warn".into()),
    }
    init_tracing(&config);

    match cli.command {
        Command::Serve {
            port,
            check,
            no_migrate,
        } => {
            if let Some(port) = port {
                info!("CLI override: port = {}", port);
                config.server.port = port;
            }

            if check {
                println!("Configuration is valid");
                println!("   Config file : {}", config_path.display());
                println!("   Address     : {}", config.server.address());
                println!(
                    "   Database    : {}",
                    ficha_semanal::infrastructure::database::redact_url(
                        &config.database.connection_url()
                    )
                );
                println!("   Log level   : {}", config.logging.level);
                let warnings = config.security.posture_warnings();
                if warnings.is_empty() {
                    println!("   Security    : no open paths");
                } else {
                    println!("   Security warnings:");
                    for warning in warnings {
                        println!("     - {warning}");
                    }
                }
                return Ok(());
            }

            let handle = ServerHandle::start(ServerOptions {
                config,
                auto_migrate: !no_migrate,
            })
            .await?;
            handle.install_signal_handler();
            info!("Press Ctrl+C to shut down gracefully");
            handle.wait().await;
        }

        Command::Token { url } => {
            let client = FichaClient::new(base_url(url, &config));
            let credential = client.fetch_token().await?;
            println!("{}", credential.token);
        }

        Command::Submit { file, url, api_key } => {
            let submission = read_submission(&file)?;
            let client = FichaClient::new(base_url(url, &config));
            let result = match api_key {
                Some(key) => client.submit_with_api_key(&key, &submission).await,
                None => {
                    let mut credential = None;
                    client.submit(&mut credential, &submission).await
                }
            };
            match result {
                Ok(created) => println!("{}", serde_json::to_string_pretty(&created)?),
                Err(e) => {
                    error!("Submission failed: {}", e);
                    return Err(e.into());
                }
            }
        }

        Command::Export { api_key, url } => {
            let client = FichaClient::new(base_url(url, &config));
            let report = client.fetch_report(&api_key).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
