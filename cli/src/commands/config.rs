// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use datadome_protection::ProtectionConfig;
use std::path::{Path, PathBuf};

/// Working-directory configuration file picked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "./ddgate.yaml";

const SAMPLE_CONFIG: &str = include_str!("../../templates/ddgate.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective protection configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output } => generate(&output),
    }
}

/// Load the protection configuration.
///
/// An explicit path (`--config` or `DDGATE_CONFIG_PATH`) must exist; otherwise
/// `./ddgate.yaml` is used when present, else the defaults. Environment
/// overrides are applied last.
pub fn load_config(cli_path: Option<PathBuf>) -> Result<ProtectionConfig> {
    let mut config = if let Some(path) = cli_path {
        tracing::info!("Loading configuration from explicit path: {:?}", path);
        ProtectionConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to load config at {:?}", path))?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        tracing::info!("Loading configuration from discovered path: {}", DEFAULT_CONFIG_FILE);
        ProtectionConfig::from_yaml_file(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load config at {}", DEFAULT_CONFIG_FILE))?
    } else {
        tracing::warn!("No configuration file found. Using defaults and environment.");
        ProtectionConfig::default()
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Configuration as YAML with the server-side key masked.
pub fn redacted_yaml(config: &ProtectionConfig) -> Result<String> {
    let mut shown = config.clone();
    if !shown.server_side_key.is_empty() {
        shown.server_side_key = "********".to_string();
    }
    Ok(shown.to_yaml_string()?)
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config / DDGATE_CONFIG_PATH: {}", path.display()),
            None => println!("  1. --config / DDGATE_CONFIG_PATH: {}", "(not set)".dimmed()),
        }
        println!("  2. {}", DEFAULT_CONFIG_FILE);
        println!();
    }

    let config = load_config(config_override).context("Failed to load configuration")?;

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", redacted_yaml(&config)?);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = load_config(config_path).context("Failed to load configuration")?;
    config
        .into_client(None)
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path) -> Result<()> {
    std::fs::write(output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
