// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker engine client — remote API over the local Unix socket.
//!
//! # Module layout
//!
//! - [`http`] — Unix-socket HTTP client with Content-Length framing
//! - [`settings`] — network-settings payload (legacy and modern schema)
//!
//! # Version negotiation
//!
//! `/version` reports the newest API version the engine speaks plus the
//! oldest it still accepts; the supported set is the full minor range
//! between them. For requests this client issues itself, the spoken version
//! is capped to the newest version that is both engine-supported and
//! validated by this build ([`KNOWN_API_VERSIONS`]).

pub(crate) mod http;
pub mod settings;

use crate::client::{EngineClient, EngineError, PluginFilter};
use async_trait::async_trait;
use dockhand_core::ApiVersion;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Remote-API versions this agent build has been validated against.
pub const KNOWN_API_VERSIONS: &[ApiVersion] = &[
    ApiVersion::new(1, 17),
    ApiVersion::new(1, 18),
    ApiVersion::new(1, 19),
    ApiVersion::new(1, 20),
    ApiVersion::new(1, 21),
    ApiVersion::new(1, 22),
    ApiVersion::new(1, 23),
    ApiVersion::new(1, 24),
    ApiVersion::new(1, 25),
];

/// Engine client over the local Docker Unix socket.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    socket_path: PathBuf,
}

/// `/version` payload fields this client consumes.
#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "ApiVersion")]
    api_version: ApiVersion,
    /// Absent on engines predating version negotiation.
    #[serde(rename = "MinAPIVersion", default)]
    min_api_version: Option<ApiVersion>,
}

#[derive(Debug, Deserialize)]
struct PluginInfo {
    #[serde(rename = "Name")]
    name: String,
}

impl DockerEngine {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into() }
    }

    async fn version_info(&self) -> Result<VersionInfo, EngineError> {
        let response = http::get(&self.socket_path, "/version").await?;
        if response.status != 200 {
            return Err(EngineError::Protocol(format!(
                "version query returned HTTP {}",
                response.status
            )));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| EngineError::Protocol(format!("version payload: {}", e)))
    }

    /// Versions the engine speaks, oldest first.
    fn supported_range(info: &VersionInfo) -> Vec<ApiVersion> {
        let newest = info.api_version;
        let oldest = info.min_api_version.unwrap_or(newest);
        if oldest.major() != newest.major() || oldest > newest {
            return vec![newest];
        }
        (oldest.minor()..=newest.minor()).map(|m| ApiVersion::new(newest.major(), m)).collect()
    }

    /// Newest version that is both engine-supported and build-validated.
    fn negotiated_version(supported: &[ApiVersion]) -> Option<ApiVersion> {
        supported.iter().filter(|v| KNOWN_API_VERSIONS.contains(v)).max().copied()
    }
}

#[async_trait]
impl EngineClient for DockerEngine {
    async fn supported_versions(&self) -> Result<Vec<ApiVersion>, EngineError> {
        let info = self.version_info().await?;
        debug!(
            api = %info.api_version,
            min_api = ?info.min_api_version.map(|v| v.to_string()),
            "engine reported api version range"
        );
        Ok(Self::supported_range(&info))
    }

    fn known_versions(&self) -> Vec<ApiVersion> {
        KNOWN_API_VERSIONS.to_vec()
    }

    async fn list_plugins(&self, filter: PluginFilter) -> Result<Vec<String>, EngineError> {
        let info = self.version_info().await?;
        let supported = Self::supported_range(&info);

        let mut filters = serde_json::Map::new();
        filters.insert("capability".into(), serde_json::json!([filter.capability]));
        if filter.enabled_only {
            filters.insert("enable".into(), serde_json::json!(["true"]));
        }
        let query = format!(
            "filters={}",
            percent_encode(&serde_json::Value::Object(filters).to_string())
        );

        let path = match Self::negotiated_version(&supported) {
            Some(v) => format!("/v{}/plugins?{}", v, query),
            None => format!("/plugins?{}", query),
        };

        let response = http::get(&self.socket_path, &path).await?;
        if response.status != 200 {
            return Err(EngineError::Protocol(format!(
                "plugin listing returned HTTP {}",
                response.status
            )));
        }
        let plugins: Vec<PluginInfo> = serde_json::from_str(&response.body)
            .map_err(|e| EngineError::Protocol(format!("plugin payload: {}", e)))?;

        // Managed plugin names carry an implicit :latest tag.
        Ok(plugins
            .into_iter()
            .map(|p| p.name.strip_suffix(":latest").map(str::to_string).unwrap_or(p.name))
            .collect())
    }
}

/// Percent-encode the characters a JSON filter value can contain.
fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 3);
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{:02X}", b));
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
