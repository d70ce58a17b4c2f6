// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Upstream forwarding
//!
//! Fallback handler that relays every request which survived the protection
//! layer to the origin, and streams the origin's answer back.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Largest request body relayed to the origin.
pub const MAX_FORWARDED_BODY: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        warn!("{}", self);
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

#[derive(Clone)]
pub struct ProxyState {
    http: reqwest::Client,
    upstream: Url,
}

impl ProxyState {
    pub fn new(upstream: Url, timeout: Duration) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(ProxyError::Client)?;
        Ok(Self { http, upstream })
    }
}

/// Connection-scoped headers that must not cross a proxy.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            forwarded.append(name.clone(), value.clone());
        }
    }
    forwarded
}

pub async fn forward(
    State(state): State<ProxyState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = state.upstream.join(path_and_query)?;

    let mut headers = end_to_end(&parts.headers);
    headers.remove(header::HOST);
    let body = axum::body::to_bytes(body, MAX_FORWARDED_BODY)
        .await
        .map_err(ProxyError::Body)?;

    let upstream = state
        .http
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(ProxyError::Upstream)?;

    let status = upstream.status();
    let upstream_headers = end_to_end(upstream.headers());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = upstream_headers;
    Ok(response)
}
