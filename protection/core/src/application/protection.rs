// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request protection
//!
//! The per-request sequence: URL gating, payload build, Protection API call,
//! verdict application. Every failure is fail-open: the request is reported
//! as not blocked and the error is handed back for the caller to inspect.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates one protection round trip

use axum::body::Body;
use axum::http::Request;
use thiserror::Error;

use super::payload_builder::{build_payload, PayloadError};
use crate::client::Client;
use crate::domain::header_propagation::{apply_to_request, apply_to_response};
use crate::domain::verdict::Verdict;
use crate::infrastructure::decision_client::DecisionError;
use crate::infrastructure::request_inspector::{header_str, pattern_uri, CLIENT_ID_HEADER};
use crate::infrastructure::response_writer::ResponseWriter;

#[derive(Debug, Error)]
pub enum ProtectionError {
    #[error("error when building request payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("error when performing call to Protection API: {0}")]
    Decision(#[from] DecisionError),
}

impl Client {
    /// Whether `request` is subject to protection according to the URL patterns.
    pub fn should_inspect<B>(&self, request: &Request<B>) -> bool {
        let uri = pattern_uri(request, self.settings.use_x_forwarded_host);

        if let Some(exclusion) = &self.url_pattern_exclusion {
            if exclusion.is_match(&uri) {
                self.logger.info("UrlPatternExclusion matches requested URI, skipping.");
                return false;
            }
        }

        if let Some(inclusion) = &self.url_pattern_inclusion {
            if !inclusion.is_match(&uri) {
                self.logger.info("UrlPatternInclusion does not match requested URI, skipping.");
                return false;
            }
        }

        true
    }

    /// Validate `request` against the Protection API.
    ///
    /// Returns `Ok(true)` when the request was blocked; `writer` then holds
    /// the complete response and the request must not be forwarded. On
    /// `Ok(false)` the request may have been enriched with headers and
    /// `writer` may carry headers for the downstream response. `Err` means
    /// the protection was bypassed; the request should still be forwarded.
    pub async fn protect(
        &self,
        writer: &mut ResponseWriter,
        request: &mut Request<Body>,
    ) -> Result<bool, ProtectionError> {
        if !self.should_inspect(request) {
            return Ok(false);
        }

        let payload = match build_payload(&self.settings, self.logger.as_ref(), request).await {
            Ok(payload) => payload,
            Err(e) => {
                let err = ProtectionError::from(e);
                self.logger.error(&err.to_string());
                return Err(err);
            }
        };

        let session_by_header = !header_str(request, CLIENT_ID_HEADER).is_empty();
        match self.decision.validate(payload.encode(), session_by_header).await {
            Ok(verdict) => Ok(apply_verdict(verdict, writer, request)),
            Err(e) => {
                let err = ProtectionError::from(e);
                self.logger.error(&err.to_string());
                Err(err)
            }
        }
    }
}

/// Carry out `verdict` on the request and downstream response. Returns
/// whether the request was blocked.
pub fn apply_verdict(
    verdict: Verdict,
    writer: &mut ResponseWriter,
    request: &mut Request<Body>,
) -> bool {
    match verdict {
        Verdict::Allow {
            request_headers,
            response_headers,
        } => {
            apply_to_request(&request_headers, request.headers_mut());
            apply_to_response(&response_headers, writer.headers_mut());
            false
        }
        Verdict::Block {
            status,
            body,
            headers,
        } => {
            apply_to_response(&headers, writer.headers_mut());
            writer.write_header(status);
            writer.write(&body);
            true
        }
        Verdict::Bypass | Verdict::ClientError => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::logger::testing::RecordingLogger;
    use axum::extract::ConnectInfo;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use bytes::Bytes;
    use std::net::SocketAddr;
    use std::sync::Arc;

    fn request(uri: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri(uri)
            .header("host", "example.com")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    fn header(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
        (HeaderName::from_static(name), HeaderValue::from_static(value))
    }

    #[test]
    fn test_exclusion_gate() {
        let logger = Arc::new(RecordingLogger::default());
        let client = Client::builder("key").logger(logger.clone()).build().unwrap();

        assert!(!client.should_inspect(&request("/picture.jpg")));
        assert!(logger.contains("INFO: UrlPatternExclusion matches requested URI, skipping."));
        assert!(client.should_inspect(&request("/login")));
    }

    #[test]
    fn test_inclusion_gate() {
        let logger = Arc::new(RecordingLogger::default());
        let client = Client::builder("key")
            .url_pattern_inclusion("(?i).*/included-path/?.*")
            .logger(logger.clone())
            .build()
            .unwrap();

        assert!(!client.should_inspect(&request("/not-included-path")));
        assert!(logger.contains("INFO: UrlPatternInclusion does not match requested URI, skipping."));
        assert!(client.should_inspect(&request("/included-path/page")));
    }

    #[test]
    fn test_gate_uses_forwarded_host() {
        let client = Client::builder("key")
            .url_pattern_inclusion("^shop\\.example\\.test/")
            .use_x_forwarded_host(true)
            .build()
            .unwrap();

        let mut forwarded = request("/cart");
        forwarded
            .headers_mut()
            .insert("x-forwarded-host", HeaderValue::from_static("shop.example.test"));

        assert!(client.should_inspect(&forwarded));
        assert!(!client.should_inspect(&request("/cart")));
    }

    #[test]
    fn test_apply_allow() {
        let mut writer = ResponseWriter::new();
        let mut req = request("/");
        let verdict = Verdict::Allow {
            request_headers: vec![header("x-datadome-isbot", "1")],
            response_headers: vec![header("set-cookie", "datadome=abc")],
        };

        assert!(!apply_verdict(verdict, &mut writer, &mut req));
        assert_eq!(req.headers()["x-datadome-isbot"], "1");
        assert_eq!(writer.headers()["set-cookie"], "datadome=abc");
        assert!(!writer.is_written());
    }

    #[test]
    fn test_apply_block() {
        let mut writer = ResponseWriter::new();
        let mut req = request("/");
        let verdict = Verdict::Block {
            status: StatusCode::FORBIDDEN,
            body: Bytes::from_static(b"captcha"),
            headers: vec![header("x-datadome", "protected")],
        };

        assert!(apply_verdict(verdict, &mut writer, &mut req));
        assert_eq!(writer.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(writer.body(), b"captcha");
        assert_eq!(writer.headers()["x-datadome"], "protected");
    }

    #[test]
    fn test_apply_passthrough_verdicts() {
        for verdict in [Verdict::Bypass, Verdict::ClientError] {
            let mut writer = ResponseWriter::new();
            let mut req = request("/");
            assert!(!apply_verdict(verdict, &mut writer, &mut req));
            assert!(writer.headers().is_empty());
            assert!(!writer.is_written());
        }
    }

    #[tokio::test]
    async fn test_protect_without_peer_fails_open() {
        let logger = Arc::new(RecordingLogger::default());
        let client = Client::builder("key")
            .endpoint("http://127.0.0.1:1/validate-request")
            .logger(logger.clone())
            .build()
            .unwrap();
        let mut writer = ResponseWriter::new();
        let mut req = Request::builder().uri("/login").body(Body::empty()).unwrap();

        let err = client.protect(&mut writer, &mut req).await.unwrap_err();
        assert!(matches!(err, ProtectionError::Payload(_)));
        assert!(logger.contains("ERROR: error when building request payload"));
        assert!(!writer.is_written());
    }
}
