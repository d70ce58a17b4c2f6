// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Header propagation
//!
//! The Protection API nominates, through two directive headers, which of its
//! own response headers travel onwards:
//!
//! | Directive | Destination | Semantics |
//! |-----------|-------------|-----------|
//! | `X-DataDome-Headers` | downstream response | `Set-Cookie` appended, others replaced |
//! | `X-DataDome-Request-Headers` | upstream request | appended |
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Response composition rules

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue};

/// Header names to copy onto the downstream response.
pub const RESPONSE_HEADERS_DIRECTIVE: &str = "x-datadome-headers";

/// Header names to copy onto the upstream request.
pub const REQUEST_HEADERS_DIRECTIVE: &str = "x-datadome-request-headers";

/// Headers selected for propagation, in directive order.
pub type HeaderList = Vec<(HeaderName, HeaderValue)>;

/// Resolve the whitespace-separated names listed in `directive` against
/// `source`. Names that are invalid, absent or carry an empty value are skipped.
pub fn nominated_headers(source: &HeaderMap, directive: &str) -> HeaderList {
    let Some(listed) = source.get(directive) else {
        return Vec::new();
    };

    String::from_utf8_lossy(listed.as_bytes())
        .split_whitespace()
        .filter_map(|name| HeaderName::from_bytes(name.as_bytes()).ok())
        .filter_map(|name| {
            let value = source.get(&name)?.clone();
            (!value.is_empty()).then_some((name, value))
        })
        .collect()
}

/// Copy `headers` onto a downstream response. `Set-Cookie` entries are added
/// next to existing cookies; any other header replaces the current value.
pub fn apply_to_response(headers: &HeaderList, target: &mut HeaderMap) {
    for (name, value) in headers {
        if *name == SET_COOKIE {
            target.append(name.clone(), value.clone());
        } else {
            target.insert(name.clone(), value.clone());
        }
    }
}

/// Append `headers` to an upstream request.
pub fn apply_to_request(headers: &HeaderList, target: &mut HeaderMap) {
    for (name, value) in headers {
        target.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protection_response() -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(RESPONSE_HEADERS_DIRECTIVE, HeaderValue::from_static("X-DataDome Set-Cookie X-Missing"));
        map.insert("x-datadome", HeaderValue::from_static("protected"));
        map.insert(SET_COOKIE, HeaderValue::from_static("datadome=other_value"));
        map
    }

    #[test]
    fn test_nominated_headers_skip_missing() {
        let headers = nominated_headers(&protection_response(), RESPONSE_HEADERS_DIRECTIVE);
        let names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["x-datadome", "set-cookie"]);
    }

    #[test]
    fn test_no_directive_no_headers() {
        let mut map = protection_response();
        map.remove(RESPONSE_HEADERS_DIRECTIVE);
        assert!(nominated_headers(&map, RESPONSE_HEADERS_DIRECTIVE).is_empty());
    }

    #[test]
    fn test_set_cookie_is_appended() {
        let headers = nominated_headers(&protection_response(), RESPONSE_HEADERS_DIRECTIVE);
        let mut downstream = HeaderMap::new();
        downstream.append(SET_COOKIE, HeaderValue::from_static("some_cookie=some_value"));
        downstream.insert("x-datadome", HeaderValue::from_static("stale"));

        apply_to_response(&headers, &mut downstream);

        let cookies: Vec<&HeaderValue> = downstream.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["some_cookie=some_value", "datadome=other_value"]);
        assert_eq!(downstream.get_all("x-datadome").iter().count(), 1);
        assert_eq!(downstream["x-datadome"], "protected");
        assert!(downstream.get(RESPONSE_HEADERS_DIRECTIVE).is_none());
    }

    #[test]
    fn test_request_headers_appended() {
        let mut source = HeaderMap::new();
        source.insert(REQUEST_HEADERS_DIRECTIVE, HeaderValue::from_static("X-DataDome-isbot"));
        source.insert("x-datadome-isbot", HeaderValue::from_static("1"));
        source.insert("x-datadome-obiwan", HeaderValue::from_static("Kenoby"));

        let headers = nominated_headers(&source, REQUEST_HEADERS_DIRECTIVE);
        let mut upstream = HeaderMap::new();
        upstream.insert("x-datadome-isbot", HeaderValue::from_static("0"));
        apply_to_request(&headers, &mut upstream);

        let values: Vec<&HeaderValue> = upstream.get_all("x-datadome-isbot").iter().collect();
        assert_eq!(values, vec!["0", "1"]);
        assert!(upstream.get("x-datadome-obiwan").is_none());
    }
}
