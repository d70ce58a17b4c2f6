// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Field Catalog
//!
//! The fixed set of fields accepted by the Protection API, each bound to a
//! signed truncation limit. `|limit|` is the maximum byte length; a positive
//! limit keeps the head of the value, a negative one keeps the tail. A limit
//! of `0` means the field is never truncated.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Single source of truth for payload field names and bounds

/// Identifier of a Protection API payload field.
///
/// The discriminant doubles as the row index in [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Accept,
    AcceptCharset,
    AcceptEncoding,
    AcceptLanguage,
    ApiConnectionState,
    AuthorizationLen,
    CacheControl,
    ClientId,
    Connection,
    ContentType,
    CookiesLen,
    From,
    HeadersList,
    Host,
    Ip,
    Key,
    Method,
    ModuleVersion,
    Origin,
    Port,
    PostParamLen,
    Pragma,
    Protocol,
    Referer,
    Request,
    RequestModuleName,
    SecChDeviceMemory,
    SecChUa,
    SecChUaArch,
    SecChUaFullVersionList,
    SecChUaMobile,
    SecChUaModel,
    SecChUaPlatform,
    SecFetchDest,
    SecFetchMode,
    SecFetchSite,
    SecFetchUser,
    ServerHostname,
    ServerName,
    TimeRequest,
    TrueClientIp,
    UserAgent,
    Via,
    XForwardedForIp,
    XRealIp,
    XRequestedWith,
    GraphQLOperationCount,
    GraphQLOperationName,
    GraphQLOperationType,
}

/// Which end of an over-long value survives truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Head,
    Tail,
}

/// One row of the catalog.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    /// Name used on the wire (form key).
    pub wire_name: &'static str,
    /// Signed byte limit, `0` for unbounded.
    pub limit: i32,
}

impl FieldSpec {
    pub fn anchor(&self) -> Anchor {
        if self.limit < 0 {
            Anchor::Tail
        } else {
            Anchor::Head
        }
    }

    pub fn max_len(&self) -> Option<usize> {
        match self.limit {
            0 => None,
            limit => Some(limit.unsigned_abs() as usize),
        }
    }
}

const fn row(field: Field, wire_name: &'static str, limit: i32) -> FieldSpec {
    FieldSpec {
        field,
        wire_name,
        limit,
    }
}

/// Rows are ordered by [`Field`] discriminant.
pub static CATALOG: [FieldSpec; 49] = [
    row(Field::Accept, "Accept", 512),
    row(Field::AcceptCharset, "AcceptCharset", 128),
    row(Field::AcceptEncoding, "AcceptEncoding", 128),
    row(Field::AcceptLanguage, "AcceptLanguage", 256),
    row(Field::ApiConnectionState, "APIConnectionState", 0),
    row(Field::AuthorizationLen, "AuthorizationLen", 0),
    row(Field::CacheControl, "CacheControl", 128),
    row(Field::ClientId, "ClientID", 128),
    row(Field::Connection, "Connection", 128),
    row(Field::ContentType, "ContentType", 64),
    row(Field::CookiesLen, "CookiesLen", 0),
    row(Field::From, "From", 128),
    row(Field::HeadersList, "HeadersList", 512),
    row(Field::Host, "Host", 512),
    row(Field::Ip, "IP", 0),
    row(Field::Key, "Key", 0),
    row(Field::Method, "Method", 0),
    row(Field::ModuleVersion, "ModuleVersion", 0),
    row(Field::Origin, "Origin", 512),
    row(Field::Port, "Port", 0),
    row(Field::PostParamLen, "PostParamLen", 0),
    row(Field::Pragma, "Pragma", 128),
    row(Field::Protocol, "Protocol", 0),
    row(Field::Referer, "Referer", 1024),
    row(Field::Request, "Request", 2048),
    row(Field::RequestModuleName, "RequestModuleName", 0),
    row(Field::SecChDeviceMemory, "SecCHDeviceMemory", 8),
    row(Field::SecChUa, "SecCHUA", 128),
    row(Field::SecChUaArch, "SecCHUAArch", 16),
    row(Field::SecChUaFullVersionList, "SecCHUAFullVersionList", 256),
    row(Field::SecChUaMobile, "SecCHUAMobile", 8),
    row(Field::SecChUaModel, "SecCHUAModel", 128),
    row(Field::SecChUaPlatform, "SecCHUAPlatform", 32),
    row(Field::SecFetchDest, "SecFetchDest", 32),
    row(Field::SecFetchMode, "SecFetchMode", 32),
    row(Field::SecFetchSite, "SecFetchSite", 64),
    row(Field::SecFetchUser, "SecFetchUser", 8),
    row(Field::ServerHostname, "ServerHostname", 512),
    row(Field::ServerName, "ServerName", 512),
    row(Field::TimeRequest, "TimeRequest", 0),
    row(Field::TrueClientIp, "TrueClientIP", 128),
    row(Field::UserAgent, "UserAgent", 768),
    row(Field::Via, "Via", 256),
    row(Field::XForwardedForIp, "XForwardedForIP", -512),
    row(Field::XRealIp, "X-Real-IP", 128),
    row(Field::XRequestedWith, "X-Requested-With", 128),
    row(Field::GraphQLOperationCount, "GraphQLOperationCount", 0),
    row(Field::GraphQLOperationName, "GraphQLOperationName", 128),
    row(Field::GraphQLOperationType, "GraphQLOperationType", 0),
];

impl Field {
    pub fn spec(self) -> &'static FieldSpec {
        &CATALOG[self as usize]
    }

    pub fn wire_name(self) -> &'static str {
        self.spec().wire_name
    }

    /// Truncate `value` to this field's limit.
    pub fn truncate(self, value: &str) -> &str {
        truncate(self.spec(), value)
    }
}

/// Cut `value` down to the row's byte limit, keeping the anchored end.
///
/// The cut lands on a UTF-8 boundary, so the result can be a few bytes
/// shorter than the limit when a multi-byte character straddles it.
pub fn truncate<'a>(spec: &FieldSpec, value: &'a str) -> &'a str {
    let Some(max) = spec.max_len() else {
        return value;
    };
    if value.len() <= max {
        return value;
    }

    match spec.anchor() {
        Anchor::Head => {
            let mut end = max;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            &value[..end]
        }
        Anchor::Tail => {
            let mut start = value.len() - max;
            while !value.is_char_boundary(start) {
                start += 1;
            }
            &value[start..]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_rows_follow_discriminants() {
        for (index, spec) in CATALOG.iter().enumerate() {
            assert_eq!(spec.field as usize, index, "row {} is out of place", spec.wire_name);
        }
    }

    #[test]
    fn test_head_truncation() {
        let value = "a".repeat(600);
        assert_eq!(Field::Accept.truncate(&value).len(), 512);
        assert_eq!(Field::SecChUaMobile.truncate("?0-too-long"), "?0-too-l");
    }

    #[test]
    fn test_tail_truncation_keeps_suffix() {
        let value = format!("{}{}", "1".repeat(100), "2".repeat(512));
        let truncated = Field::XForwardedForIp.truncate(&value);
        assert_eq!(truncated.len(), 512);
        assert_eq!(truncated, &value[value.len() - 512..]);
        assert_eq!(Field::XForwardedForIp.spec().anchor(), Anchor::Tail);
    }

    #[test]
    fn test_unbounded_fields_untouched() {
        let value = "k".repeat(5000);
        assert_eq!(Field::Key.truncate(&value), value);
        assert_eq!(Field::TimeRequest.spec().max_len(), None);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // '€' is three bytes wide, so byte 8 falls inside the third one.
        let value = "€€€";
        let truncated = Field::SecFetchUser.truncate(value);
        assert_eq!(truncated, "€€");
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(Field::XRealIp.wire_name(), "X-Real-IP");
        assert_eq!(Field::XRequestedWith.wire_name(), "X-Requested-With");
        assert_eq!(Field::ApiConnectionState.wire_name(), "APIConnectionState");
        assert_eq!(Field::SecChUaFullVersionList.wire_name(), "SecCHUAFullVersionList");
    }
}
