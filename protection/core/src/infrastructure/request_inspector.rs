// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request inspectors
//!
//! Read-only helpers that pull the values the Protection API needs out of an
//! incoming request: client IP, host, protocol, port, request line, header
//! names and the DataDome client identifier.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Adapter between `http::Request` and the payload fields

use axum::extract::ConnectInfo;
use axum::http::{header, uri::Scheme, Request};
use std::borrow::Cow;
use std::net::SocketAddr;
use thiserror::Error;

/// Session-by-header client identifier.
pub const CLIENT_ID_HEADER: &str = "x-datadome-clientid";

/// Cookie holding the client identifier when the header is not used.
pub const CLIENT_ID_COOKIE: &str = "datadome";

pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InspectError {
    #[error("no remote address attached to the request")]
    MissingRemoteAddr,

    #[error("address {0}: missing port in address")]
    MissingPort(String),

    #[error("address {0}: too many colons in address")]
    TooManyColons(String),

    #[error("address {0}: missing ']' in address")]
    UnterminatedBracket(String),
}

/// First value of `name`, lossily decoded, or `""` when absent.
pub fn header_str<'a, B>(request: &'a Request<B>, name: &str) -> Cow<'a, str> {
    request
        .headers()
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .unwrap_or(Cow::Borrowed(""))
}

/// Peer address recorded by the server through `ConnectInfo`.
pub fn remote_addr<B>(request: &Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
}

/// Split `host:port` (or `[v6]:port`) and return the host part.
pub fn split_host_port(addr: &str) -> Result<&str, InspectError> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| InspectError::UnterminatedBracket(addr.to_string()))?;
        return match tail.strip_prefix(':') {
            Some(_) => Ok(host),
            None => Err(InspectError::MissingPort(addr.to_string())),
        };
    }

    let (host, _port) = addr
        .rsplit_once(':')
        .ok_or_else(|| InspectError::MissingPort(addr.to_string()))?;
    if host.contains(':') {
        return Err(InspectError::TooManyColons(addr.to_string()));
    }
    Ok(host)
}

/// IP of the connected peer.
pub fn client_ip<B>(request: &Request<B>) -> Result<String, InspectError> {
    let addr = remote_addr(request).ok_or(InspectError::MissingRemoteAddr)?;
    split_host_port(&addr).map(str::to_string)
}

/// The `Host` header, falling back to the URI authority for absolute-form requests.
pub fn request_host<B>(request: &Request<B>) -> String {
    let host = header_str(request, header::HOST.as_str());
    if !host.is_empty() {
        return host.into_owned();
    }
    request
        .uri()
        .authority()
        .map(|authority| authority.to_string())
        .unwrap_or_default()
}

/// Host used for URL pattern matching.
pub fn effective_host<B>(request: &Request<B>, use_x_forwarded_host: bool) -> String {
    if use_x_forwarded_host {
        let forwarded = header_str(request, X_FORWARDED_HOST);
        if !forwarded.is_empty() {
            return forwarded.into_owned();
        }
    }
    request_host(request)
}

/// `X-Forwarded-Proto` when it names http or https, else the URI scheme.
pub fn protocol<B>(request: &Request<B>) -> String {
    let forwarded = header_str(request, X_FORWARDED_PROTO);
    if forwarded.eq_ignore_ascii_case("http") || forwarded.eq_ignore_ascii_case("https") {
        return forwarded.into_owned();
    }
    if request.uri().scheme() == Some(&Scheme::HTTPS) {
        return "https".to_string();
    }
    "http".to_string()
}

/// Explicit URI port, else the protocol's default.
pub fn port<B>(request: &Request<B>, protocol: &str) -> String {
    match request.uri().port_u16() {
        Some(port) => port.to_string(),
        None if protocol.eq_ignore_ascii_case("https") => "443".to_string(),
        None => "80".to_string(),
    }
}

/// Path plus `?query` when a query is present.
pub fn request_line<B>(request: &Request<B>) -> String {
    let uri = request.uri();
    match uri.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", uri.path(), query),
        _ => uri.path().to_string(),
    }
}

/// Effective host and path, without query or fragment.
pub fn pattern_uri<B>(request: &Request<B>, use_x_forwarded_host: bool) -> String {
    let path = request.uri().path();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    format!("{}{}", effective_host(request, use_x_forwarded_host), path)
}

/// Comma-separated header names in map iteration order.
pub fn header_list<B>(request: &Request<B>) -> String {
    request
        .headers()
        .keys()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// `X-DataDome-ClientID` header when set, else the `datadome` cookie.
pub fn client_id<B>(request: &Request<B>) -> String {
    let from_header = header_str(request, CLIENT_ID_HEADER);
    if !from_header.is_empty() {
        return from_header.into_owned();
    }
    cookie_value(request, CLIENT_ID_COOKIE).unwrap_or_default()
}

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn cookie_value<B>(request: &Request<B>, name: &str) -> Option<String> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .flat_map(|value| {
            String::from_utf8_lossy(value.as_bytes())
                .split(';')
                .map(|pair| pair.trim().to_string())
                .collect::<Vec<_>>()
        })
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().trim_matches('"').to_string())
        })
}
