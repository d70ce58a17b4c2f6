// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Downstream response writer
//!
//! Buffers what the protection layer wants to say to the client: headers
//! nominated by the Protection API, and on a block the status and body.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Host-server response primitive

use axum::body::Body;
use axum::http::{header::SET_COOKIE, HeaderMap, StatusCode};
use axum::response::Response;
use bytes::{Bytes, BytesMut};

#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Record the status line. Only the first call takes effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    /// Append to the body, implying `200 OK` if no status was written.
    pub fn write(&mut self, data: &[u8]) {
        self.write_header(StatusCode::OK);
        self.body.extend_from_slice(data);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether a status or body has been written.
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(Bytes::from(self.body)));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }

    /// Fold the buffered headers into a response produced by the next
    /// handler. `Set-Cookie` values are added alongside the handler's own;
    /// other headers only fill gaps the handler left.
    pub fn merge_into(self, response: &mut Response) {
        let target = response.headers_mut();
        let mut current = None;
        for (name, value) in self.headers {
            if let Some(name) = name {
                current = Some(name);
            }
            let Some(name) = current.as_ref() else {
                continue;
            };
            if *name == SET_COOKIE {
                target.append(name.clone(), value);
            } else if !target.contains_key(name) {
                target.insert(name.clone(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_into_response() {
        let mut writer = ResponseWriter::new();
        writer.headers_mut().insert("x-datadome", HeaderValue::from_static("protected"));
        writer.write_header(StatusCode::FORBIDDEN);
        writer.write(b"blocked");
        writer.write_header(StatusCode::OK);

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["x-datadome"], "protected");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"blocked");
    }

    #[test]
    fn test_untouched_writer() {
        let writer = ResponseWriter::new();
        assert!(!writer.is_written());
        assert!(writer.body().is_empty());
    }

    #[test]
    fn test_merge_keeps_handler_headers_and_all_cookies() {
        let mut writer = ResponseWriter::new();
        writer.headers_mut().append(SET_COOKIE, HeaderValue::from_static("datadome=abc"));
        writer.headers_mut().insert("x-datadome", HeaderValue::from_static("protected"));
        writer.headers_mut().insert("cache-control", HeaderValue::from_static("no-store"));

        let mut response = Response::new(Body::empty());
        response.headers_mut().append(SET_COOKIE, HeaderValue::from_static("session=1"));
        response.headers_mut().insert("cache-control", HeaderValue::from_static("max-age=60"));

        writer.merge_into(&mut response);

        let cookies: Vec<&HeaderValue> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["session=1", "datadome=abc"]);
        assert_eq!(response.headers()["x-datadome"], "protected");
        assert_eq!(response.headers()["cache-control"], "max-age=60");
    }
}
