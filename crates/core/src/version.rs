// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container engine remote-API version tokens.
//!
//! Versions are dotted `major.minor` pairs ("1.17", "1.24") with a total
//! order by numeric segments, so "1.9" sorts below "1.17". The token is
//! opaque to the control plane; ordering only matters for version floors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A container engine remote-API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ApiVersion {
    major: u32,
    minor: u32,
}

/// Error parsing a version token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid api version {0:?}: expected dotted major.minor")]
pub struct VersionParseError(pub String);

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) =
            s.trim().split_once('.').ok_or_else(|| VersionParseError(s.to_string()))?;
        let major = major.parse().map_err(|_| VersionParseError(s.to_string()))?;
        let minor = minor.parse().map_err(|_| VersionParseError(s.to_string()))?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = VersionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(v: ApiVersion) -> String {
        v.to_string()
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
