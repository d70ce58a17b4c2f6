// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! DataDome protection
//!
//! Server-side bot protection for axum/tower services. Each incoming request
//! is summarized and submitted to the DataDome Protection API, whose verdict
//! decides whether the request is forwarded (possibly enriched) or answered
//! directly with the API's challenge or block response.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Crate root and public surface

pub mod application;
pub mod client;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::payload_builder::PayloadError;
pub use application::protection::ProtectionError;
pub use client::{Client, ClientBuilder, ConfigError, Settings};
pub use domain::protection_config::{ConfigFileError, ProtectionConfig};
pub use domain::verdict::Verdict;
pub use infrastructure::decision_client::DecisionError;
pub use infrastructure::logger::{Logger, TracingLogger};
pub use infrastructure::response_writer::ResponseWriter;
pub use presentation::middleware::{protection_middleware, ProtectionLayer, ProtectionService};
