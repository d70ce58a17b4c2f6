// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! GraphQL body probe
//!
//! Looks for the `"query":` member of a JSON GraphQL request without taking
//! the body away from downstream handlers. At most `maximum_body_size` bytes
//! are scanned; everything pulled from the body is replayed in front of the
//! still-unread remainder. A read failure is replayed too, so downstream
//! handlers never mistake a partial body for a complete one.
//!
//! ```text
//! body ──► [scanned chunks] ──► rolling 2 KiB window ──► regex
//!            │
//!            └─► replay(scanned) ++ rest-of-stream ──► downstream handler
//! ```
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Bounded, non-destructive request body inspection

use axum::body::Body;
use axum::http::{header, Method, Request};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use thiserror::Error;

use super::request_inspector::header_str;

/// Scan granularity; the rolling window holds two of these.
pub const READ_SIZE: usize = 1024;

static QUERY_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""query"\s*:\s*("(?:query|mutation|subscription)?\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*[{(].*)"#,
    )
    .expect("query member pattern is valid")
});

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("error while reading request body: {0}")]
    Read(#[source] axum::Error),
}

/// Result of probing a request body.
pub struct ProbedBody {
    /// Replacement body, byte-for-byte identical to the original.
    pub body: Body,
    /// Text following `"query":`, when found within the budget.
    pub candidate: Option<String>,
    pub error: Option<ProbeError>,
}

/// Whether the request looks like a JSON GraphQL POST worth probing.
pub fn is_graphql_request<B>(request: &Request<B>) -> bool {
    let content_length = header_str(request, header::CONTENT_LENGTH.as_str())
        .trim()
        .parse::<u64>()
        .unwrap_or(0);

    header_str(request, header::CONTENT_TYPE.as_str()) == "application/json"
        && request.method() == Method::POST
        && content_length > 0
        && request.uri().path().contains("graphql")
}

/// Scan up to `maximum_body_size` bytes of `body` for the GraphQL query member.
pub async fn probe_query(body: Body, maximum_body_size: usize) -> ProbedBody {
    let mut rest = body.into_data_stream();
    let mut consumed: Vec<Bytes> = Vec::new();
    let mut window: Vec<u8> = Vec::with_capacity(2 * READ_SIZE);
    let mut scanned = 0usize;
    let mut candidate = None;
    let mut error = None;
    let mut failure = None;

    while candidate.is_none() && scanned < maximum_body_size {
        let chunk = match rest.next().await {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                failure = Some(axum::Error::new(e.to_string()));
                error = Some(ProbeError::Read(e));
                break;
            }
            None => break,
        };

        let in_budget = chunk.len().min(maximum_body_size - scanned);
        for piece in chunk[..in_budget].chunks(READ_SIZE) {
            window.extend_from_slice(piece);
            if window.len() >= 2 * READ_SIZE {
                window.drain(..window.len() - 2 * READ_SIZE);
            }
            if let Some(found) = QUERY_MEMBER.captures(&window).and_then(|c| c.get(1)) {
                candidate = Some(String::from_utf8_lossy(found.as_bytes()).into_owned());
                break;
            }
        }

        scanned += in_budget;
        consumed.push(chunk);
    }

    let replay = stream::iter(consumed.into_iter().map(Ok::<_, axum::Error>));
    let body = match failure {
        Some(failure) => Body::from_stream(replay.chain(stream::once(async { Err(failure) }))),
        None => Body::from_stream(replay.chain(rest)),
    };

    ProbedBody {
        body,
        candidate,
        error,
    }
}
