// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Protection API payload
//!
//! An ordered set of catalog fields, truncated on insertion and serialized as
//! `application/x-www-form-urlencoded`.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Wire body of the Protection API request

use url::form_urlencoded;

use super::field_catalog::Field;

/// Field values destined for the Protection API, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(Field, String)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `field`, truncated to the field's catalog limit.
    /// Setting a field twice replaces the earlier value in place.
    pub fn set(&mut self, field: Field, value: impl AsRef<str>) -> &mut Self {
        let value = field.truncate(value.as_ref()).to_string();
        match self.fields.iter_mut().find(|(existing, _)| *existing == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| *existing == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().map(|(field, value)| (*field, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Form-encode every non-empty field.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (field, value) in self.iter().filter(|(_, value)| !value.is_empty()) {
            serializer.append_pair(field.wire_name(), value);
        }
        serializer.finish()
    }
}
