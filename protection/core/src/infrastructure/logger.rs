// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Logging sink
//!
//! The client reports through an injected [`Logger`] so embedding servers can
//! route protection diagnostics wherever they like. [`TracingLogger`] is the
//! default and forwards to `tracing` under the `datadome` target.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Logging port and its default adapter

use std::sync::Arc;

/// Log sink shared by every request handled by a client.
///
/// Implementations must be safe for concurrent use.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default [`Logger`] backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn shared() -> Arc<dyn Logger> {
        Arc::new(Self)
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "datadome", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "datadome", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "datadome", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "datadome", "{}", message);
    }
}
