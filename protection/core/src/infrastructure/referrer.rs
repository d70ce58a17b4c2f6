// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Referer restoration
//!
//! Some redirect flows make the browser send a `Referer` equal to the page
//! being requested, while the true referrer travels in the `dd_referrer`
//! query parameter. When the two URLs match (ignoring `dd_referrer`, query
//! order and fragments) the header is restored from the parameter and the
//! parameter is stripped from the request URI.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** In-place request rewrite ahead of payload building

use axum::http::{
    header::REFERER,
    uri::{InvalidUri, InvalidUriParts, PathAndQuery},
    HeaderValue, Request, Uri,
};
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;
use std::str::Utf8Error;
use thiserror::Error;
use url::{form_urlencoded, Url};

use super::request_inspector::{header_str, protocol, request_host, request_line};

/// Query parameter carrying the original referrer.
pub const REFERRER_PARAM: &str = "dd_referrer";

#[derive(Debug, Error)]
pub enum ReferrerError {
    #[error("fail to parse request URL: {0}")]
    RequestUrl(#[source] url::ParseError),

    #[error("fail to decode referer header: {0}")]
    DecodeReferer(#[source] UnescapeError),

    #[error("fail to parse referer header: {0}")]
    RefererUrl(#[source] url::ParseError),

    #[error("fail to decode dd_referrer query value: {0}")]
    DecodeParam(#[source] UnescapeError),

    #[error("restored referer is not a valid header value")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    #[error("fail to rebuild request URI: {0}")]
    PathAndQuery(#[from] InvalidUri),

    #[error("fail to rebuild request URI: {0}")]
    Uri(#[from] InvalidUriParts),
}

#[derive(Debug, Error)]
pub enum UnescapeError {
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),

    #[error(transparent)]
    Utf8(#[from] Utf8Error),
}

/// Form-style unescape: `+` becomes a space, `%XX` sequences are decoded.
/// A `%` not followed by two hex digits is rejected.
fn query_unescape(value: &str) -> Result<String, UnescapeError> {
    let bytes = value.as_bytes();
    if let Some(at) = bytes.iter().enumerate().find_map(|(i, b)| {
        let valid = *b != b'%'
            || (bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit));
        (!valid).then_some(i)
    }) {
        let escape = String::from_utf8_lossy(&bytes[at..bytes.len().min(at + 3)]).into_owned();
        return Err(UnescapeError::InvalidEscape(escape));
    }

    let spaced = value.replace('+', " ");
    Ok(percent_decode_str(&spaced).decode_utf8()?.into_owned())
}

/// Render `url` with sorted query keys and values, no fragment, and
/// without the `skip` parameter.
fn canonicalize(mut url: Url, skip: Option<&str>) -> String {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        if skip == Some(&*key) {
            continue;
        }
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in params.iter_mut() {
        values.sort();
        for value in values.iter() {
            serializer.append_pair(key, value);
        }
    }
    let query = serializer.finish();

    url.set_query((!query.is_empty()).then_some(query.as_str()));
    url.set_fragment(None);
    url.to_string()
}

/// Whether the `Referer` header mirrors the current URL.
pub fn is_matching_referrer<B>(request: &Request<B>) -> Result<bool, ReferrerError> {
    let full_url = format!(
        "{}://{}{}",
        protocol(request),
        request_host(request),
        request_line(request)
    );
    let current = Url::parse(&full_url).map_err(ReferrerError::RequestUrl)?;

    let referer = header_str(request, REFERER.as_str());
    if referer.is_empty() {
        return Ok(false);
    }
    let decoded = query_unescape(&referer).map_err(ReferrerError::DecodeReferer)?;
    let referer = Url::parse(&decoded).map_err(ReferrerError::RefererUrl)?;

    Ok(canonicalize(current, Some(REFERRER_PARAM)) == canonicalize(referer, None))
}

/// Move `dd_referrer` into the `Referer` header, or drop the header when the
/// parameter is empty. Returns whether the request was rewritten.
pub fn restore_referrer<B>(request: &mut Request<B>) -> Result<bool, ReferrerError> {
    let pairs: Vec<(String, String)> = request
        .uri()
        .query()
        .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let Some((_, referrer)) = pairs.iter().find(|(key, _)| key == REFERRER_PARAM) else {
        return Ok(false);
    };

    if referrer.is_empty() {
        request.headers_mut().remove(REFERER);
    } else {
        let decoded = query_unescape(referrer).map_err(ReferrerError::DecodeParam)?;
        request
            .headers_mut()
            .insert(REFERER, HeaderValue::from_str(&decoded)?);
    }

    let mut remaining: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(key, _)| key != REFERRER_PARAM)
        .collect();
    remaining.sort_by(|a, b| a.0.cmp(&b.0));

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in remaining {
        serializer.append_pair(key, value);
    }
    let query = serializer.finish();

    let path_and_query = if query.is_empty() {
        request.uri().path().to_string()
    } else {
        format!("{}?{}", request.uri().path(), query)
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    *request.uri_mut() = Uri::from_parts(parts)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, referer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(referer) = referer {
            builder = builder.header(REFERER, referer);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn query_value(request: &Request<Body>, key: &str) -> Option<String> {
        form_urlencoded::parse(request.uri().query().unwrap_or_default().as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_without_referer() {
        let req = request("http://example.com/foo?dd_referrer=", None);
        assert!(!is_matching_referrer(&req).unwrap());
    }

    #[test]
    fn test_not_matching_referer() {
        let req = request(
            "http://example.com/foo?dd_referrer=",
            Some("http%3A%2F%2Fhttpbin.org%2Fbar"),
        );
        assert!(!is_matching_referrer(&req).unwrap());
    }

    #[test]
    fn test_matching_referer() {
        let req = request(
            "http://example.com/foo?dd_referrer=http%3A%2F%2Fexample.com%2Ffoo",
            Some("http%3A%2F%2Fexample.com%2Ffoo"),
        );
        assert!(is_matching_referrer(&req).unwrap());
    }

    #[test]
    fn test_matching_referer_ignores_query_order() {
        let req = request(
            "http://example.com/foo?toto=tata&dd_referrer=&foo=bar",
            Some("http%3A%2F%2Fexample.com%2Ffoo%3Ftoto%3Dtata%26foo%3Dbar"),
        );
        assert!(is_matching_referrer(&req).unwrap());
    }

    #[test]
    fn test_relative_referer_is_an_error() {
        let req = request("http://example.com/foo", Some("www.example2.com"));
        assert!(matches!(
            is_matching_referrer(&req),
            Err(ReferrerError::RefererUrl(_))
        ));
    }

    #[test]
    fn test_malformed_escape_in_referer_is_an_error() {
        let req = request("http://example.com/foo", Some("http://example.com/%ZZ"));
        assert!(matches!(
            is_matching_referrer(&req),
            Err(ReferrerError::DecodeReferer(UnescapeError::InvalidEscape(escape))) if escape == "%ZZ"
        ));
    }

    #[test]
    fn test_truncated_escape_is_rejected() {
        assert!(matches!(query_unescape("abc%4"), Err(UnescapeError::InvalidEscape(_))));
        assert_eq!(query_unescape("a+b%2Fc").unwrap(), "a b/c");
    }

    #[test]
    fn test_malformed_escape_in_param_leaves_request_untouched() {
        let mut req = request("http://example.com/foo?dd_referrer=%25ZZ", Some("Bar"));
        assert!(matches!(
            restore_referrer(&mut req),
            Err(ReferrerError::DecodeParam(UnescapeError::InvalidEscape(_)))
        ));
        assert_eq!(req.headers()[REFERER], "Bar");
        assert_eq!(req.uri().query(), Some("dd_referrer=%25ZZ"));
    }

    #[test]
    fn test_restore_without_param_is_noop() {
        let mut req = request("http://example.com/foo", Some("Bar"));
        assert!(!restore_referrer(&mut req).unwrap());
        assert_eq!(req.headers()[REFERER], "Bar");
        assert_eq!(req.uri().to_string(), "http://example.com/foo");
    }

    #[test]
    fn test_restore_filled_param() {
        let mut req = request("http://example.com/foo?dd_referrer=Foo", Some("Bar"));
        assert!(restore_referrer(&mut req).unwrap());
        assert_eq!(req.headers()[REFERER], "Foo");
        assert_eq!(req.uri().query(), None);
    }

    #[test]
    fn test_restore_empty_param_drops_header() {
        let mut req = request("http://example.com/foo?dd_referrer=", Some("Bar"));
        assert!(restore_referrer(&mut req).unwrap());
        assert!(req.headers().get(REFERER).is_none());
        assert_eq!(query_value(&req, REFERRER_PARAM), None);
    }

    #[test]
    fn test_restore_keeps_other_params() {
        let mut req = request(
            "http://example.com/foo?query=params&dd_referrer=Foo&toto=tata",
            Some("Bar"),
        );
        assert!(restore_referrer(&mut req).unwrap());
        assert_eq!(req.headers()[REFERER], "Foo");
        assert_eq!(req.uri().query(), Some("query=params&toto=tata"));
        assert_eq!(query_value(&req, "query").as_deref(), Some("params"));
        assert_eq!(query_value(&req, "toto").as_deref(), Some("tata"));
    }

    #[test]
    fn test_restore_decodes_encoded_url() {
        let mut req = request(
            "/foo?dd_referrer=https%253A%252F%252Fsearch.example%252F",
            Some("http://example.com/foo"),
        );
        assert!(restore_referrer(&mut req).unwrap());
        assert_eq!(req.headers()[REFERER], "https://search.example/");
        assert_eq!(req.uri().to_string(), "/foo");
    }
}
