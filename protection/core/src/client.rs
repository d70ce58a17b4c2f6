// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protection client
//!
//! A [`Client`] is configured once per application and shared across every
//! request. Construction validates the options, compiles the URL patterns and
//! builds the Protection API transport; nothing is mutable afterwards.
//!
//! ```no_run
//! use datadome_protection::Client;
//! use std::time::Duration;
//!
//! let client = Client::builder("server-side-key")
//!     .timeout(Duration::from_millis(200))
//!     .enable_graphql_support(true)
//!     .build()
//!     .unwrap();
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Application Layer (composition root)
//! - **Purpose:** Construction-time validation and shared state

use regex::Regex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::infrastructure::decision_client::{DecisionClient, DecisionError};
use crate::infrastructure::logger::{Logger, TracingLogger};
use crate::presentation::middleware::ProtectionLayer;

pub const DEFAULT_ENDPOINT: &str = "api.datadome.co";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(150);
pub const DEFAULT_MAXIMUM_BODY_SIZE: usize = 25 * 1024;
pub const DEFAULT_MODULE_NAME: &str = "Rust";
pub const DEFAULT_MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static assets never worth a Protection API round trip.
pub const DEFAULT_URL_PATTERN_EXCLUSION: &str = r"(?i)\.(avi|avif|bmp|css|eot|flac|flv|gif|gz|ico|jpeg|jpg|js|json|less|map|mka|mkv|mov|mp3|mp4|mpeg|mpg|ogg|ogm|opus|otf|png|svg|svgz|swf|ttf|wav|webm|webp|woff|woff2|xml|zip)$";

const VALIDATE_REQUEST_PATH: &str = "/validate-request";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ServerSideKey must be defined")]
    MissingServerSideKey,

    #[error("Timeout must be a positive integer")]
    InvalidTimeout,

    #[error("MaximumBodySize must be a positive integer")]
    InvalidMaximumBodySize,

    #[error("UrlPatternExclusion must be a valid RegExp: {0}")]
    InvalidUrlPatternExclusion(#[source] regex::Error),

    #[error("UrlPatternInclusion must be a valid RegExp: {0}")]
    InvalidUrlPatternInclusion(#[source] regex::Error),

    #[error("Endpoint must be a valid URL: {0}")]
    InvalidEndpoint(#[source] url::ParseError),

    #[error("Protection API transport could not be built: {0}")]
    Transport(#[source] DecisionError),
}

/// Validated, immutable options of a [`Client`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_side_key: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub maximum_body_size: usize,
    pub module_name: String,
    pub module_version: String,
    pub enable_graphql_support: bool,
    pub enable_referrer_restoration: bool,
    pub use_x_forwarded_host: bool,
}

pub struct Client {
    pub(crate) settings: Settings,
    pub(crate) url_pattern_inclusion: Option<Regex>,
    pub(crate) url_pattern_exclusion: Option<Regex>,
    pub(crate) decision: DecisionClient,
    pub(crate) logger: Arc<dyn Logger>,
}

impl Client {
    pub fn builder(server_side_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(server_side_key)
    }

    /// Client with every option at its default.
    pub fn new(server_side_key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder(server_side_key).build()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn url_pattern_inclusion(&self) -> Option<&Regex> {
        self.url_pattern_inclusion.as_ref()
    }

    pub fn url_pattern_exclusion(&self) -> Option<&Regex> {
        self.url_pattern_exclusion.as_ref()
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Tower layer running the protection ahead of the wrapped service.
    pub fn layer(self) -> ProtectionLayer {
        ProtectionLayer::new(Arc::new(self))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.settings.endpoint)
            .field("timeout", &self.settings.timeout)
            .field("module_name", &self.settings.module_name)
            .field("module_version", &self.settings.module_version)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ClientBuilder {
    server_side_key: String,
    endpoint: String,
    timeout: Duration,
    maximum_body_size: usize,
    module_name: String,
    module_version: String,
    url_pattern_inclusion: String,
    url_pattern_exclusion: String,
    enable_graphql_support: bool,
    enable_referrer_restoration: bool,
    use_x_forwarded_host: bool,
    logger: Option<Arc<dyn Logger>>,
}

impl ClientBuilder {
    pub fn new(server_side_key: impl Into<String>) -> Self {
        Self {
            server_side_key: server_side_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            maximum_body_size: DEFAULT_MAXIMUM_BODY_SIZE,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            module_version: DEFAULT_MODULE_VERSION.to_string(),
            url_pattern_inclusion: String::new(),
            url_pattern_exclusion: DEFAULT_URL_PATTERN_EXCLUSION.to_string(),
            enable_graphql_support: false,
            enable_referrer_restoration: false,
            use_x_forwarded_host: false,
            logger: None,
        }
    }

    /// Host (normalized to `https://<host>/validate-request`), absolute URL
    /// or path starting with `/`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Byte budget of the GraphQL body probe.
    pub fn maximum_body_size(mut self, size: usize) -> Self {
        self.maximum_body_size = size;
        self
    }

    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn module_version(mut self, version: impl Into<String>) -> Self {
        self.module_version = version.into();
        self
    }

    /// Only matching URLs are inspected. Empty disables the filter.
    pub fn url_pattern_inclusion(mut self, pattern: impl Into<String>) -> Self {
        self.url_pattern_inclusion = pattern.into();
        self
    }

    /// Matching URLs are skipped. Empty disables the filter.
    pub fn url_pattern_exclusion(mut self, pattern: impl Into<String>) -> Self {
        self.url_pattern_exclusion = pattern.into();
        self
    }

    pub fn enable_graphql_support(mut self, enabled: bool) -> Self {
        self.enable_graphql_support = enabled;
        self
    }

    pub fn enable_referrer_restoration(mut self, enabled: bool) -> Self {
        self.enable_referrer_restoration = enabled;
        self
    }

    pub fn use_x_forwarded_host(mut self, enabled: bool) -> Self {
        self.use_x_forwarded_host = enabled;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<Client, ConfigError> {
        if self.server_side_key.is_empty() {
            return Err(ConfigError::MissingServerSideKey);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.maximum_body_size == 0 {
            return Err(ConfigError::InvalidMaximumBodySize);
        }

        let url_pattern_exclusion = compile(&self.url_pattern_exclusion)
            .map_err(ConfigError::InvalidUrlPatternExclusion)?;
        let url_pattern_inclusion = compile(&self.url_pattern_inclusion)
            .map_err(ConfigError::InvalidUrlPatternInclusion)?;

        let endpoint = normalize_endpoint(&self.endpoint)?;
        let logger = self.logger.unwrap_or_else(TracingLogger::shared);
        let decision = DecisionClient::new(endpoint.clone(), self.timeout, logger.clone())
            .map_err(ConfigError::Transport)?;

        Ok(Client {
            settings: Settings {
                server_side_key: self.server_side_key,
                endpoint,
                timeout: self.timeout,
                maximum_body_size: self.maximum_body_size,
                module_name: self.module_name,
                module_version: self.module_version,
                enable_graphql_support: self.enable_graphql_support,
                enable_referrer_restoration: self.enable_referrer_restoration,
                use_x_forwarded_host: self.use_x_forwarded_host,
            },
            url_pattern_inclusion,
            url_pattern_exclusion,
            decision,
            logger,
        })
    }
}

fn compile(pattern: &str) -> Result<Option<Regex>, regex::Error> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern).map(Some)
}

/// Expand a bare host to the validation URL. Absolute URLs must parse;
/// paths are kept verbatim.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ConfigError> {
    if endpoint.starts_with('/') {
        return Ok(endpoint.to_string());
    }

    let endpoint = if endpoint.starts_with("http") {
        endpoint.to_string()
    } else {
        format!("https://{}{}", endpoint, VALIDATE_REQUEST_PATH)
    };
    Url::parse(&endpoint).map_err(ConfigError::InvalidEndpoint)?;
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let client = Client::new("key").unwrap();
        let settings = client.settings();

        assert_eq!(settings.server_side_key, "key");
        assert_eq!(settings.endpoint, "https://api.datadome.co/validate-request");
        assert_eq!(settings.timeout, Duration::from_millis(150));
        assert_eq!(settings.maximum_body_size, 25 * 1024);
        assert_eq!(settings.module_name, "Rust");
        assert_eq!(settings.module_version, env!("CARGO_PKG_VERSION"));
        assert!(!settings.enable_graphql_support);
        assert!(!settings.enable_referrer_restoration);
        assert!(!settings.use_x_forwarded_host);
        assert!(client.url_pattern_inclusion().is_none());
        assert_eq!(
            client.url_pattern_exclusion().map(Regex::as_str),
            Some(DEFAULT_URL_PATTERN_EXCLUSION)
        );
    }

    #[test]
    fn test_custom_options() {
        let client = Client::builder("key")
            .endpoint("https://eu.example.test/validate")
            .timeout(Duration::from_millis(300))
            .maximum_body_size(2048)
            .module_name("Gate")
            .module_version("9.9.9")
            .url_pattern_inclusion("^/api")
            .url_pattern_exclusion("")
            .enable_graphql_support(true)
            .enable_referrer_restoration(true)
            .use_x_forwarded_host(true)
            .build()
            .unwrap();
        let settings = client.settings();

        assert_eq!(settings.endpoint, "https://eu.example.test/validate");
        assert_eq!(settings.timeout, Duration::from_millis(300));
        assert_eq!(settings.maximum_body_size, 2048);
        assert_eq!(settings.module_name, "Gate");
        assert_eq!(settings.module_version, "9.9.9");
        assert!(settings.enable_graphql_support);
        assert!(settings.enable_referrer_restoration);
        assert!(settings.use_x_forwarded_host);
        assert_eq!(client.url_pattern_inclusion().map(Regex::as_str), Some("^/api"));
        assert!(client.url_pattern_exclusion().is_none());
    }

    #[test]
    fn test_missing_server_side_key() {
        let err = Client::new("").unwrap_err();
        assert!(matches!(err, ConfigError::MissingServerSideKey));
        assert!(err.to_string().starts_with("ServerSideKey"));
    }

    #[test]
    fn test_non_positive_limits() {
        let err = Client::builder("key").timeout(Duration::ZERO).build().unwrap_err();
        assert!(err.to_string().starts_with("Timeout"));

        let err = Client::builder("key").maximum_body_size(0).build().unwrap_err();
        assert!(err.to_string().starts_with("MaximumBodySize"));
    }

    #[test]
    fn test_invalid_patterns() {
        let err = Client::builder("key").url_pattern_exclusion("(").build().unwrap_err();
        assert!(err.to_string().starts_with("UrlPatternExclusion must be a valid RegExp"));

        let err = Client::builder("key").url_pattern_inclusion("[a-").build().unwrap_err();
        assert!(err.to_string().starts_with("UrlPatternInclusion must be a valid RegExp"));
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("api-eu.datadome.co").unwrap(),
            "https://api-eu.datadome.co/validate-request"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:8080/validate-request").unwrap(),
            "http://localhost:8080/validate-request"
        );
        assert_eq!(normalize_endpoint("/validate-request").unwrap(), "/validate-request");
        assert!(matches!(
            normalize_endpoint("http://[::1"),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_default_exclusion_pattern() {
        let client = Client::new("key").unwrap();
        let exclusion = client.url_pattern_exclusion().unwrap();

        assert!(exclusion.is_match("example.com/picture.jpg"));
        assert!(exclusion.is_match("example.com/STYLE.CSS"));
        assert!(!exclusion.is_match("example.com/login"));
        assert!(!exclusion.is_match("example.com/picture.jpg/edit"));
    }
}
