// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Layer (`datadome-protection-core`)
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`payload_builder`] | Request summary sent to the Protection API |
//! | [`protection`] | URL gating, Protection API round trip, verdict application |

pub mod payload_builder;
pub mod protection;
