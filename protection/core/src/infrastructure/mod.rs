// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Infrastructure Layer (`datadome-protection-core`)
//!
//! Adapters between the protection rules and the outside world.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request_inspector`] | Values read from the incoming `http::Request` |
//! | [`referrer`] | `dd_referrer` based Referer restoration |
//! | [`body_probe`] | Bounded, replaying GraphQL body scan |
//! | [`decision_client`] | reqwest transport to the Protection API |
//! | [`response_writer`] | Buffered downstream response |
//! | [`logger`] | Injected logging sink |

pub mod body_probe;
pub mod decision_client;
pub mod logger;
pub mod referrer;
pub mod request_inspector;
pub mod response_writer;
