// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`datadome-protection-core`)
//!
//! Pure types and rules with no I/O:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`field_catalog`] | Payload fields and truncation limits |
//! | [`payload`] | Ordered, truncated, form-encoded Protection API body |
//! | [`graphql`] | GraphQL operation type/name/count extraction |
//! | [`header_propagation`] | `X-DataDome-Headers` / `X-DataDome-Request-Headers` rules |
//! | [`verdict`] | Interpretation of Protection API responses |
//! | [`protection_config`] | YAML configuration document and env overrides |

pub mod field_catalog;
pub mod graphql;
pub mod header_propagation;
pub mod payload;
pub mod protection_config;
pub mod verdict;
