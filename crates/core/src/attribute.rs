// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability attributes advertised to the control plane.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named (optionally valued) fact describing a node feature.
///
/// Boolean-style capabilities carry no value; informational ones (such as a
/// discovered plugin version) carry one. Names are unique within one
/// negotiation result — the builder enforces this on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Attribute {
    /// Name-only attribute (boolean-style capability).
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }

    /// Value-bearing attribute (informational capability).
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()) }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
#[path = "attribute_tests.rs"]
mod tests;
