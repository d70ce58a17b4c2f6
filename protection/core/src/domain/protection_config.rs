// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protection configuration document
//!
//! YAML mirror of the [`crate::ClientBuilder`] options, so a host can keep the
//! protection settings next to the rest of its configuration:
//!
//! ```yaml
//! server_side_key: "..."
//! endpoint: api.datadome.co
//! timeout: 150
//! maximum_body_size: 25600
//! url_pattern_exclusion: '(?i)\.(css|js|png)$'
//! enable_graphql_support: true
//! ```
//!
//! Every field is optional; missing ones take the client defaults.
//! Environment variables override the file (see [`ProtectionConfig::apply_env_overrides`]).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Declarative configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::client::{
    Client, ConfigError, DEFAULT_ENDPOINT, DEFAULT_MAXIMUM_BODY_SIZE, DEFAULT_MODULE_NAME,
    DEFAULT_MODULE_VERSION, DEFAULT_TIMEOUT, DEFAULT_URL_PATTERN_EXCLUSION,
};
use crate::infrastructure::logger::Logger;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    pub server_side_key: String,
    pub endpoint: String,
    /// Milliseconds.
    pub timeout: i64,
    pub maximum_body_size: i64,
    pub module_name: String,
    pub module_version: String,
    pub url_pattern_inclusion: String,
    pub url_pattern_exclusion: String,
    pub enable_graphql_support: bool,
    pub enable_referrer_restoration: bool,
    pub use_x_forwarded_host: bool,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            server_side_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT.as_millis() as i64,
            maximum_body_size: DEFAULT_MAXIMUM_BODY_SIZE as i64,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            module_version: DEFAULT_MODULE_VERSION.to_string(),
            url_pattern_inclusion: String::new(),
            url_pattern_exclusion: DEFAULT_URL_PATTERN_EXCLUSION.to_string(),
            enable_graphql_support: false,
            enable_referrer_restoration: false,
            use_x_forwarded_host: false,
        }
    }
}

impl ProtectionConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigFileError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigFileError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("DATADOME_SERVER_SIDE_KEY") {
            tracing::info!("Environment override: DATADOME_SERVER_SIDE_KEY=<redacted>");
            self.server_side_key = val;
        }

        if let Some(val) = lookup("DATADOME_ENDPOINT") {
            tracing::info!("Environment override: DATADOME_ENDPOINT={}", val);
            self.endpoint = val;
        }

        if let Some(val) = lookup("DATADOME_TIMEOUT") {
            match val.trim().parse::<i64>() {
                Ok(timeout) => {
                    tracing::info!("Environment override: DATADOME_TIMEOUT={}", timeout);
                    self.timeout = timeout;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for DATADOME_TIMEOUT: '{}'. Expected milliseconds. Ignoring.",
                        val
                    );
                }
            }
        }

        let flags: [(&str, &mut bool); 3] = [
            ("DATADOME_ENABLE_GRAPHQL_SUPPORT", &mut self.enable_graphql_support),
            ("DATADOME_ENABLE_REFERRER_RESTORATION", &mut self.enable_referrer_restoration),
            ("DATADOME_USE_X_FORWARDED_HOST", &mut self.use_x_forwarded_host),
        ];
        for (name, flag) in flags {
            let Some(val) = lookup(name) else {
                continue;
            };
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: {}=true", name);
                    *flag = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: {}=false", name);
                    *flag = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                        name,
                        val
                    );
                }
            }
        }
    }

    /// Validate and build the client. Negative limits are reported the same
    /// way as zero ones.
    pub fn into_client(self, logger: Option<Arc<dyn Logger>>) -> Result<Client, ConfigError> {
        let timeout = u64::try_from(self.timeout).unwrap_or(0);
        let maximum_body_size = usize::try_from(self.maximum_body_size).unwrap_or(0);

        let mut builder = Client::builder(self.server_side_key)
            .endpoint(self.endpoint)
            .timeout(Duration::from_millis(timeout))
            .maximum_body_size(maximum_body_size)
            .module_name(self.module_name)
            .module_version(self.module_version)
            .url_pattern_inclusion(self.url_pattern_inclusion)
            .url_pattern_exclusion(self.url_pattern_exclusion)
            .enable_graphql_support(self.enable_graphql_support)
            .enable_referrer_restoration(self.enable_referrer_restoration)
            .use_x_forwarded_host(self.use_x_forwarded_host);
        if let Some(logger) = logger {
            builder = builder.logger(logger);
        }
        builder.build()
    }
}
