// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network (CNI) plugin client.
//!
//! Task networking is wired up by CNI plugin binaries installed next to the
//! agent. The only call capability negotiation needs is the plugin's
//! version report, obtained by executing the binary with
//! `CNI_COMMAND=VERSION` and parsing its JSON reply.

use crate::client::EngineError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// Client for installed network plugin binaries.
#[async_trait]
pub trait NetworkPluginClient: Send + Sync + 'static {
    /// Version string reported by the named plugin.
    async fn version(&self, plugin: &str) -> Result<String, EngineError>;
}

/// Executes CNI plugin binaries from a plugin directory.
#[derive(Debug, Clone)]
pub struct CniBinaryClient {
    plugin_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct VersionReply {
    #[serde(rename = "cniVersion")]
    cni_version: String,
}

impl CniBinaryClient {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self { plugin_dir: plugin_dir.into() }
    }
}

#[async_trait]
impl NetworkPluginClient for CniBinaryClient {
    async fn version(&self, plugin: &str) -> Result<String, EngineError> {
        let binary = self.plugin_dir.join(plugin);
        let output = tokio::process::Command::new(&binary)
            .env("CNI_COMMAND", "VERSION")
            .output()
            .await
            .map_err(|e| {
                EngineError::NetworkPlugin(format!("exec {} failed: {}", binary.display(), e))
            })?;
        if !output.status.success() {
            return Err(EngineError::NetworkPlugin(format!(
                "{} exited with {}",
                plugin, output.status
            )));
        }
        let reply: VersionReply = serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::NetworkPlugin(format!("{} version reply: {}", plugin, e)))?;
        Ok(reply.cni_version)
    }
}
