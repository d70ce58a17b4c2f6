// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Payload builder
//!
//! Assembles the Protection API payload for one request. Two steps may touch
//! the request itself: Referer restoration rewrites the URI and `Referer`
//! header, and the GraphQL probe swaps the body for a replaying one.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Request summary for the Protection API

use axum::body::Body;
use axum::http::{header, Request};
use thiserror::Error;

use crate::client::Settings;
use crate::domain::field_catalog::Field;
use crate::domain::graphql::GraphQLOperation;
use crate::domain::payload::Payload;
use crate::infrastructure::body_probe::{is_graphql_request, probe_query};
use crate::infrastructure::logger::Logger;
use crate::infrastructure::referrer::{is_matching_referrer, restore_referrer};
use crate::infrastructure::request_inspector::{
    client_id, client_ip, header_list, header_str, port, protocol, request_host, request_line,
    InspectError,
};

const API_CONNECTION_STATE: &str = "new";

/// Fields copied straight from a request header.
const HEADER_FIELDS: &[(Field, &str)] = &[
    (Field::Accept, "accept"),
    (Field::AcceptCharset, "accept-charset"),
    (Field::AcceptEncoding, "accept-encoding"),
    (Field::AcceptLanguage, "accept-language"),
    (Field::CacheControl, "cache-control"),
    (Field::Connection, "connection"),
    (Field::ContentType, "content-type"),
    (Field::From, "from"),
    (Field::Origin, "origin"),
    (Field::Pragma, "pragma"),
    (Field::Referer, "referer"),
    (Field::SecChDeviceMemory, "sec-ch-device-memory"),
    (Field::SecChUa, "sec-ch-ua"),
    (Field::SecChUaArch, "sec-ch-ua-arch"),
    (Field::SecChUaFullVersionList, "sec-ch-ua-full-version-list"),
    (Field::SecChUaMobile, "sec-ch-ua-mobile"),
    (Field::SecChUaModel, "sec-ch-ua-model"),
    (Field::SecChUaPlatform, "sec-ch-ua-platform"),
    (Field::SecFetchDest, "sec-fetch-dest"),
    (Field::SecFetchMode, "sec-fetch-mode"),
    (Field::SecFetchSite, "sec-fetch-site"),
    (Field::SecFetchUser, "sec-fetch-user"),
    (Field::TrueClientIp, "true-client-ip"),
    (Field::UserAgent, "user-agent"),
    (Field::Via, "via"),
    (Field::XForwardedForIp, "x-forwarded-for"),
    (Field::XRealIp, "x-real-ip"),
    (Field::XRequestedWith, "x-requested-with"),
];

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("fail to parse request IP: {0}")]
    Ip(#[from] InspectError),
}

/// Byte length of the first `name` header, `"0"` when absent.
fn header_len<B>(request: &Request<B>, name: &str) -> String {
    request
        .headers()
        .get(name)
        .map(|value| value.as_bytes().len())
        .unwrap_or(0)
        .to_string()
}

/// Build the payload for `request`.
///
/// Fails only when the client IP cannot be determined. Referer and GraphQL
/// problems are logged and the payload is built without them.
pub async fn build_payload(
    settings: &Settings,
    logger: &dyn Logger,
    request: &mut Request<Body>,
) -> Result<Payload, PayloadError> {
    let ip = client_ip(request)?;

    if settings.enable_referrer_restoration {
        restore_matching_referrer(logger, request);
    }

    let protocol = protocol(request);
    let host = request_host(request);
    let content_length = header_str(request, header::CONTENT_LENGTH.as_str());
    let post_param_len = if content_length.is_empty() {
        "0".to_string()
    } else {
        content_length.into_owned()
    };

    let mut payload = Payload::new();
    payload
        .set(Field::Key, &settings.server_side_key)
        .set(Field::RequestModuleName, &settings.module_name)
        .set(Field::ModuleVersion, &settings.module_version)
        .set(Field::Ip, &ip)
        .set(Field::ApiConnectionState, API_CONNECTION_STATE)
        .set(Field::AuthorizationLen, header_len(request, header::AUTHORIZATION.as_str()))
        .set(Field::ClientId, client_id(request))
        .set(Field::CookiesLen, header_len(request, header::COOKIE.as_str()))
        .set(Field::HeadersList, header_list(request))
        .set(Field::Host, &host)
        .set(Field::Method, request.method().as_str())
        .set(Field::Port, port(request, &protocol))
        .set(Field::PostParamLen, post_param_len)
        .set(Field::Protocol, &protocol)
        .set(Field::Request, request_line(request))
        .set(Field::ServerHostname, &host)
        .set(Field::ServerName, &host)
        .set(Field::TimeRequest, chrono::Utc::now().timestamp_micros().to_string());

    for (field, name) in HEADER_FIELDS {
        payload.set(*field, header_str(request, name));
    }

    if settings.enable_graphql_support && is_graphql_request(request) {
        if let Some(operation) = probe_graphql(settings, logger, request).await {
            payload
                .set(Field::GraphQLOperationType, operation.operation_type.as_str())
                .set(Field::GraphQLOperationName, &operation.name)
                .set(Field::GraphQLOperationCount, operation.count.to_string());
        }
    }

    Ok(payload)
}

fn restore_matching_referrer(logger: &dyn Logger, request: &mut Request<Body>) {
    match is_matching_referrer(request) {
        Ok(true) => {
            if let Err(e) = restore_referrer(request) {
                logger.warn(&format!("fail to restore the referrer: {}", e));
            }
        }
        Ok(false) => {}
        Err(e) => logger.warn(&format!("fail to check if the referrer matches: {}", e)),
    }
}

async fn probe_graphql(
    settings: &Settings,
    logger: &dyn Logger,
    request: &mut Request<Body>,
) -> Option<GraphQLOperation> {
    let body = std::mem::take(request.body_mut());
    let probed = probe_query(body, settings.maximum_body_size).await;
    *request.body_mut() = probed.body;

    if let Some(e) = probed.error {
        logger.warn(&format!("fail to retrieve GraphQL data: {}", e));
        return None;
    }

    let operation = GraphQLOperation::parse(&probed.candidate?);
    (!operation.is_empty()).then_some(operation)
}
