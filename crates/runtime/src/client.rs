// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine client seam.
//!
//! The capability engine never talks to the engine socket directly; it goes
//! through [`EngineClient`] so negotiation logic stays testable against
//! fakes and indifferent to the transport.

use async_trait::async_trait;
use dockhand_core::ApiVersion;
use thiserror::Error;

/// Errors from engine and plugin collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine transport error: {0}")]
    Transport(String),
    #[error("unexpected engine response: {0}")]
    Protocol(String),
    #[error("plugin registry error: {0}")]
    Registry(String),
    #[error("network plugin error: {0}")]
    NetworkPlugin(String),
}

/// Filter for engine-managed plugin listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginFilter {
    /// Only list plugins currently enabled in the engine.
    pub enabled_only: bool,
    /// Plugin capability to match ("volumedriver", "networkdriver", ...).
    pub capability: String,
}

impl PluginFilter {
    /// Filter matching enabled volume-driver plugins.
    pub fn volume_drivers() -> Self {
        Self { enabled_only: true, capability: "volumedriver".to_string() }
    }
}

/// Client for the container engine's remote API.
#[async_trait]
pub trait EngineClient: Send + Sync + 'static {
    /// Remote-API versions the running engine speaks.
    ///
    /// Fetched fresh per call; an empty list means no version-gated feature
    /// can be advertised. A transport failure here is the one engine error
    /// that is fatal to capability negotiation.
    async fn supported_versions(&self) -> Result<Vec<ApiVersion>, EngineError>;

    /// Remote-API versions this agent build recognizes. Build constant.
    fn known_versions(&self) -> Vec<ApiVersion>;

    /// Names of engine-managed plugins matching `filter`.
    async fn list_plugins(&self, filter: PluginFilter) -> Result<Vec<String>, EngineError>;
}
