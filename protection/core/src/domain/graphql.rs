// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! GraphQL operation extraction
//!
//! Pure parsing of the `query` member captured from a JSON-framed GraphQL
//! request. Locating that member inside the body is the job of
//! [`crate::infrastructure::body_probe`].
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Operation type, name and count for the Protection API payload

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static OPERATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(query|mutation|subscription)\s*([A-Za-z_][A-Za-z0-9_]*)?\s*[({@]")
        .expect("operation pattern is valid")
});

static SHORTHAND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:query|mutation|subscription)?\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*[{]"#)
        .expect("shorthand pattern is valid")
});

/// GraphQL operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationType {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        }
    }

    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "mutation" => OperationType::Mutation,
            "subscription" => OperationType::Subscription,
            _ => OperationType::Query,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the probe learned about a GraphQL request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphQLOperation {
    pub operation_type: OperationType,
    pub name: String,
    pub count: usize,
}

impl GraphQLOperation {
    /// Parse the text that follows `"query":` in the request body.
    ///
    /// Explicit operations (`query Foo {`, `mutation Bar(`) are counted and
    /// the first one names the result. Without any, the shorthand `"{ ... }"`
    /// form is counted and the operation stays an anonymous query.
    pub fn parse(candidate: &str) -> Self {
        let mut operation = GraphQLOperation::default();

        let mut matches = OPERATION_PATTERN.captures_iter(candidate);
        if let Some(first) = matches.next() {
            if let Some(keyword) = first.get(1) {
                operation.operation_type = OperationType::from_keyword(keyword.as_str());
            }
            if let Some(name) = first.get(2) {
                operation.name = name.as_str().to_string();
            }
            operation.count = 1 + matches.count();
            return operation;
        }

        operation.count = SHORTHAND_PATTERN.find_iter(candidate).count();
        operation
    }

    /// An operation only reaches the payload when at least one was seen.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
