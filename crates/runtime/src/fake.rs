// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake collaborators for tests.
//!
//! Configurable in-memory implementations of the three runtime seams.
//! Errors are stored as messages and materialized per call; calls are
//! recorded so tests can assert on gating (e.g. that the network plugin is
//! only queried when task networking is enabled).

use crate::client::{EngineClient, EngineError, PluginFilter};
use crate::netplugin::NetworkPluginClient;
use crate::plugins::PluginRegistry;
use async_trait::async_trait;
use dockhand_core::ApiVersion;
use parking_lot::Mutex;
use std::sync::Arc;

/// Fake [`EngineClient`] with configurable version and plugin responses.
#[derive(Debug, Default)]
pub struct FakeEngine {
    supported: Vec<ApiVersion>,
    known: Vec<ApiVersion>,
    plugins: Vec<String>,
    fail_supported: Option<String>,
    fail_plugins: Option<String>,
    plugin_calls: Arc<Mutex<Vec<PluginFilter>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supported(mut self, versions: Vec<ApiVersion>) -> Self {
        self.supported = versions;
        self
    }

    pub fn with_known(mut self, versions: Vec<ApiVersion>) -> Self {
        self.known = versions;
        self
    }

    pub fn with_plugins(mut self, names: Vec<String>) -> Self {
        self.plugins = names;
        self
    }

    pub fn failing_supported_versions(mut self, message: impl Into<String>) -> Self {
        self.fail_supported = Some(message.into());
        self
    }

    pub fn failing_plugin_listing(mut self, message: impl Into<String>) -> Self {
        self.fail_plugins = Some(message.into());
        self
    }

    /// Filters passed to `list_plugins`, in call order.
    pub fn plugin_calls(&self) -> Vec<PluginFilter> {
        self.plugin_calls.lock().clone()
    }
}

#[async_trait]
impl EngineClient for FakeEngine {
    async fn supported_versions(&self) -> Result<Vec<ApiVersion>, EngineError> {
        match &self.fail_supported {
            Some(msg) => Err(EngineError::Transport(msg.clone())),
            None => Ok(self.supported.clone()),
        }
    }

    fn known_versions(&self) -> Vec<ApiVersion> {
        self.known.clone()
    }

    async fn list_plugins(&self, filter: PluginFilter) -> Result<Vec<String>, EngineError> {
        self.plugin_calls.lock().push(filter);
        match &self.fail_plugins {
            Some(msg) => Err(EngineError::Protocol(msg.clone())),
            None => Ok(self.plugins.clone()),
        }
    }
}

/// Fake [`PluginRegistry`].
#[derive(Debug, Default)]
pub struct FakePluginRegistry {
    names: Vec<String>,
    fail: Option<String>,
    scans: Arc<Mutex<usize>>,
}

impl FakePluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    pub fn scan_count(&self) -> usize {
        *self.scans.lock()
    }
}

#[async_trait]
impl PluginRegistry for FakePluginRegistry {
    async fn scan(&self) -> Result<Vec<String>, EngineError> {
        *self.scans.lock() += 1;
        match &self.fail {
            Some(msg) => Err(EngineError::Registry(msg.clone())),
            None => Ok(self.names.clone()),
        }
    }
}

/// Fake [`NetworkPluginClient`].
#[derive(Debug, Default)]
pub struct FakeNetworkPlugin {
    version: Option<String>,
    fail: Option<String>,
    queried: Arc<Mutex<Vec<String>>>,
}

impl FakeNetworkPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// Plugin names queried, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().clone()
    }
}

#[async_trait]
impl NetworkPluginClient for FakeNetworkPlugin {
    async fn version(&self, plugin: &str) -> Result<String, EngineError> {
        self.queried.lock().push(plugin.to_string());
        match (&self.fail, &self.version) {
            (Some(msg), _) => Err(EngineError::NetworkPlugin(msg.clone())),
            (None, Some(v)) => Ok(v.clone()),
            (None, None) => Err(EngineError::NetworkPlugin("no version configured".into())),
        }
    }
}
