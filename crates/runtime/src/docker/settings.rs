// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-reported container network settings.
//!
//! The payload schema changed across engine versions: older engines report
//! a single flat IPv4 address (the container's primary network), newer ones
//! a map of named networks each carrying its own address. Both shapes are
//! kept here verbatim; the daemon's metadata deriver flattens them into
//! uniform [`dockhand_core::NetworkRecord`]s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-network endpoint settings in the modern schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
}

/// Container network settings as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Legacy flat address; empty when the engine only populates `networks`.
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    /// Modern per-network map; empty on older engines.
    #[serde(rename = "Networks", default)]
    pub networks: HashMap<String, EndpointSettings>,
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
