// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # ddgate
//!
//! Reverse proxy that screens every request with the DataDome Protection API
//! before relaying it to an upstream origin.
//!
//! ## Commands
//!
//! - `ddgate` / `ddgate serve` - Run the gateway
//! - `ddgate config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datadome_protection::TracingLogger;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use url::Url;

use ddgate::commands::{self, config::load_config, ConfigCommand};
use ddgate::server::{self, ServeOptions};

/// ddgate - DataDome protected reverse proxy
#[derive(Parser)]
#[command(name = "ddgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "DDGATE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, global = true, env = "DDGATE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port
    #[arg(long, global = true, env = "DDGATE_PORT", default_value = "8080")]
    port: u16,

    /// Origin that allowed requests are forwarded to
    #[arg(
        long,
        global = true,
        env = "DDGATE_UPSTREAM",
        default_value = "http://127.0.0.1:3000"
    )]
    upstream: Url,

    /// Upstream request timeout in seconds
    #[arg(long, global = true, env = "DDGATE_UPSTREAM_TIMEOUT", default_value = "30")]
    upstream_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DDGATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway (default)
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Serve) | None => {
            let client = load_config(cli.config)?
                .into_client(Some(TracingLogger::shared()))
                .context("Invalid protection configuration")?;
            info!("Protection API endpoint: {}", client.settings().endpoint);

            server::serve(
                client,
                ServeOptions {
                    host: cli.host,
                    port: cli.port,
                    upstream: cli.upstream,
                    upstream_timeout: Duration::from_secs(cli.upstream_timeout),
                },
            )
            .await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
