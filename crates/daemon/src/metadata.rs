// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container network metadata derivation.
//!
//! Maps the engine's network settings — whichever schema the engine
//! reported — into the uniform records served to workloads. With the
//! modern per-network map populated, one record per named network; else a
//! single legacy record named after the host-config network mode.

use crate::state::{ContainerRecord, TaskStateStore};
use dockhand_core::NetworkRecord;
use serde::Serialize;
use thiserror::Error;

/// Errors looking up or deriving container metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("no container registered for endpoint '{0}'")]
    UnknownEndpoint(String),
    #[error("container '{0}' is not tracked")]
    ContainerNotFound(String),
    #[error("no network settings recorded for container '{0}'")]
    SettingsUnavailable(String),
}

/// Metadata served for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerMetadataResponse {
    pub container_id: String,
    pub name: String,
    pub networks: Vec<NetworkRecord>,
}

/// Derive uniform network records from a container's engine settings.
pub fn container_network_metadata(
    record: &ContainerRecord,
) -> Result<Vec<NetworkRecord>, MetadataError> {
    let settings = record
        .network_settings
        .as_ref()
        .ok_or_else(|| MetadataError::SettingsUnavailable(record.container_id.clone()))?;

    if !settings.networks.is_empty() {
        // Map iteration order is unspecified; sort for a stable response.
        let mut entries: Vec<_> = settings.networks.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        return Ok(entries
            .into_iter()
            .map(|(name, endpoint)| {
                NetworkRecord::new(name.clone(), vec![endpoint.ip_address.clone()])
            })
            .collect());
    }

    Ok(vec![NetworkRecord::new(record.network_mode.clone(), vec![settings.ip_address.clone()])])
}

/// Network records for a container ID, against the shared state store.
pub fn network_metadata_by_container_id(
    store: &TaskStateStore,
    container_id: &str,
) -> Result<Vec<NetworkRecord>, MetadataError> {
    let record = store
        .container_by_id(container_id)
        .ok_or_else(|| MetadataError::ContainerNotFound(container_id.to_string()))?;
    container_network_metadata(record)
}

/// Full metadata response for an endpoint ID, as served at `/v3/{id}`.
pub fn metadata_for_endpoint(
    store: &TaskStateStore,
    endpoint_id: &str,
) -> Result<ContainerMetadataResponse, MetadataError> {
    let record = store
        .container_by_endpoint(endpoint_id)
        .ok_or_else(|| MetadataError::UnknownEndpoint(endpoint_id.to_string()))?;
    Ok(ContainerMetadataResponse {
        container_id: record.container_id.clone(),
        name: record.name.clone(),
        networks: container_network_metadata(record)?,
    })
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
