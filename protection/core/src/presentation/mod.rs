// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`datadome-protection-core`)
//!
//! The surfaces a host server wires in: the tower [`middleware::ProtectionLayer`]
//! and the axum [`middleware::protection_middleware`] function.

pub mod middleware;
