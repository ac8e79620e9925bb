// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uniform per-container network records served over the metadata endpoint.

use serde::{Deserialize, Serialize};

/// One network a container is attached to.
///
/// Derived from the engine's network settings regardless of which schema
/// (legacy flat address or modern per-network map) the engine reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Network name ("bridge", "host", a user-defined network, ...).
    pub network_mode: String,
    pub ipv4_addresses: Vec<String>,
}

impl NetworkRecord {
    pub fn new(network_mode: impl Into<String>, ipv4_addresses: Vec<String>) -> Self {
        Self { network_mode: network_mode.into(), ipv4_addresses }
    }
}
