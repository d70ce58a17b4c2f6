// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protection API client
//!
//! Posts the form-encoded payload to the Protection API and turns the answer
//! into a [`Verdict`]. The underlying `reqwest::Client` is built once per
//! [`crate::Client`], never follows redirects (301/302 are verdicts, not hops)
//! and bounds every call with the configured timeout.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Anti-corruption layer over the Protection API wire protocol

use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::logger::Logger;
use crate::domain::verdict::{Verdict, VerdictError};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const DATADOME_USER_AGENT: &str = "DataDome";

/// Asks the Protection API to set the client ID cookie itself when the
/// session travels in the `X-DataDome-ClientID` header.
pub const X_SET_COOKIE_HEADER: &str = "x-datadome-x-set-cookie";

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("error when building the Protection API transport: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("error when performing DataDome request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("error when reading DataDome response: {0}")]
    Read(#[source] reqwest::Error),

    #[error("fails to get status code and response headers from Protection API response, bypass DataDome: {0}")]
    Inconsistent(#[source] VerdictError),

    #[error("{0}")]
    UnexpectedStatus(#[source] VerdictError),
}

impl From<VerdictError> for DecisionError {
    fn from(err: VerdictError) -> Self {
        if err.is_inconsistent() {
            DecisionError::Inconsistent(err)
        } else {
            DecisionError::UnexpectedStatus(err)
        }
    }
}

/// Shared, long-lived connection to the Protection API.
pub struct DecisionClient {
    http: reqwest::Client,
    endpoint: String,
    logger: Arc<dyn Logger>,
}

impl DecisionClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, DecisionError> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(DecisionError::Transport)?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            logger,
        })
    }

    /// Submit `payload` and interpret the response.
    ///
    /// `session_by_header` adds `X-DataDome-X-Set-Cookie: true` so the
    /// Protection API returns the client ID in a header-friendly form.
    pub async fn validate(
        &self,
        payload: String,
        session_by_header: bool,
    ) -> Result<Verdict, DecisionError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(USER_AGENT, DATADOME_USER_AGENT)
            .body(payload);

        if session_by_header {
            request = request.header(X_SET_COOKIE_HEADER, "true");
        }

        let response = request.send().await.map_err(DecisionError::Request)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(DecisionError::Read)?;

        Verdict::from_response(status, &headers, body.clone()).map_err(|err| {
            if err.is_inconsistent() {
                self.logger.debug(&format!(
                    "fail to get status code and response headers from Protection API response. reason: {}",
                    String::from_utf8_lossy(&body)
                ));
            }
            DecisionError::from(err)
        })
    }
}
