// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Verdict
//!
//! Interpretation of a Protection API response. The `X-DataDomeResponse`
//! header must repeat the HTTP status; when it does, the status selects the
//! verdict.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Typed outcome of a Protection API call

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use thiserror::Error;

use super::header_propagation::{nominated_headers, HeaderList, REQUEST_HEADERS_DIRECTIVE, RESPONSE_HEADERS_DIRECTIVE};

/// Header carrying the Protection API's own copy of the status code.
pub const RESPONSE_STATUS_HEADER: &str = "x-datadomeresponse";

/// Outcome of a Protection API call for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Forward the request, enriched with `request_headers`; decorate the
    /// downstream response with `response_headers`.
    Allow {
        request_headers: HeaderList,
        response_headers: HeaderList,
    },
    /// Answer the client directly with the Protection API's response.
    Block {
        status: StatusCode,
        body: Bytes,
        headers: HeaderList,
    },
    /// Forward the request untouched.
    Bypass,
    /// The Protection API judged the client request malformed; forward untouched.
    ClientError,
}

impl Verdict {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Block { .. })
    }

    /// Derive the verdict from a Protection API response.
    pub fn from_response(
        status: StatusCode,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Self, VerdictError> {
        let declared = headers
            .get(RESPONSE_STATUS_HEADER)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .filter(|value| !value.is_empty())
            .ok_or(VerdictError::MissingStatus { status })?;

        if declared != status.as_str() {
            return Err(VerdictError::StatusMismatch { status, declared });
        }

        match status.as_u16() {
            200 => Ok(Verdict::Allow {
                request_headers: nominated_headers(headers, REQUEST_HEADERS_DIRECTIVE),
                response_headers: nominated_headers(headers, RESPONSE_HEADERS_DIRECTIVE),
            }),
            400 => Ok(Verdict::ClientError),
            301 | 302 | 401 | 403 => Ok(Verdict::Block {
                status,
                body,
                headers: nominated_headers(headers, RESPONSE_HEADERS_DIRECTIVE),
            }),
            _ => Err(VerdictError::UnexpectedStatus(declared)),
        }
    }
}

/// A Protection API response that cannot be turned into a verdict.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerdictError {
    #[error("missing X-DataDomeResponse header on {status} response from Protection API")]
    MissingStatus { status: StatusCode },

    #[error("X-DataDomeResponse header ({declared}) does not match response status {status}")]
    StatusMismatch { status: StatusCode, declared: String },

    #[error("{0} response from Protection API - unexpected status")]
    UnexpectedStatus(String),
}

impl VerdictError {
    /// Missing or mismatched status headers mean the response cannot be trusted.
    pub fn is_inconsistent(&self) -> bool {
        !matches!(self, VerdictError::UnexpectedStatus(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_allow_collects_both_directions() {
        let map = headers(&[
            ("X-DataDomeResponse", "200"),
            ("X-DataDome-Headers", "X-DataDome"),
            ("X-DataDome-Request-Headers", "X-DataDome-isbot"),
            ("X-DataDome", "protected"),
            ("X-DataDome-isbot", "1"),
        ]);

        let verdict = Verdict::from_response(StatusCode::OK, &map, Bytes::new()).unwrap();
        match verdict {
            Verdict::Allow { request_headers, response_headers } => {
                assert_eq!(request_headers.len(), 1);
                assert_eq!(request_headers[0].0, "x-datadome-isbot");
                assert_eq!(response_headers.len(), 1);
                assert_eq!(response_headers[0].1, "protected");
            }
            other => panic!("Expected allow, got {:?}", other),
        }
    }

    #[test]
    fn test_block_keeps_status_and_body() {
        let map = headers(&[("X-DataDomeResponse", "403")]);
        let verdict =
            Verdict::from_response(StatusCode::FORBIDDEN, &map, Bytes::from_static(b"blocked")).unwrap();
        assert!(verdict.is_blocking());
        assert_eq!(
            verdict,
            Verdict::Block {
                status: StatusCode::FORBIDDEN,
                body: Bytes::from_static(b"blocked"),
                headers: vec![],
            }
        );
    }

    #[test]
    fn test_redirect_and_unauthorized_block() {
        for code in [301u16, 302, 401] {
            let status = StatusCode::from_u16(code).unwrap();
            let map = headers(&[("X-DataDomeResponse", status.as_str())]);
            let verdict = Verdict::from_response(status, &map, Bytes::new()).unwrap();
            assert!(verdict.is_blocking(), "{} should block", code);
        }
    }

    #[test]
    fn test_client_error() {
        let map = headers(&[("X-DataDomeResponse", "400")]);
        let verdict = Verdict::from_response(StatusCode::BAD_REQUEST, &map, Bytes::new()).unwrap();
        assert_eq!(verdict, Verdict::ClientError);
    }

    #[test]
    fn test_missing_status_header_is_inconsistent() {
        let err = Verdict::from_response(StatusCode::FORBIDDEN, &HeaderMap::new(), Bytes::new())
            .unwrap_err();
        assert!(err.is_inconsistent());
    }

    #[test]
    fn test_status_mismatch_is_inconsistent() {
        let map = headers(&[("X-DataDomeResponse", "403")]);
        let err = Verdict::from_response(StatusCode::OK, &map, Bytes::new()).unwrap_err();
        assert_eq!(
            err,
            VerdictError::StatusMismatch {
                status: StatusCode::OK,
                declared: "403".to_string(),
            }
        );
    }

    #[test]
    fn test_unexpected_status() {
        let map = headers(&[("X-DataDomeResponse", "500")]);
        let err = Verdict::from_response(StatusCode::INTERNAL_SERVER_ERROR, &map, Bytes::new())
            .unwrap_err();
        assert!(!err.is_inconsistent());
        assert!(err.to_string().starts_with("500 response"));
    }
}
