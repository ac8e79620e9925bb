// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task state store: containers tracked by this agent.
//!
//! The store is shared between the engine-event side (which records
//! containers as they are created) and the metadata listener (which only
//! reads). Synchronization is external: callers hold the surrounding
//! `parking_lot::Mutex`.

use dockhand_core::EndpointId;
use dockhand_runtime::NetworkSettings;
use std::collections::HashMap;

/// One tracked container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    /// Engine-level container ID.
    pub container_id: String,
    pub name: String,
    /// Opaque ID workloads use to reach their own metadata.
    pub endpoint_id: EndpointId,
    /// Network mode from the container's host configuration ("bridge",
    /// "host", ...). The legacy network-settings schema names its single
    /// network after this.
    pub network_mode: String,
    /// Engine-reported network settings; absent until the engine has
    /// inspected the container.
    pub network_settings: Option<NetworkSettings>,
}

/// Container index, by engine ID and by metadata endpoint ID.
#[derive(Debug, Default)]
pub struct TaskStateStore {
    containers: HashMap<String, ContainerRecord>,
    endpoints: HashMap<EndpointId, String>,
}

impl TaskStateStore {
    /// Track a container. Re-recording an ID replaces the previous record
    /// and re-points its endpoint.
    pub fn record_container(&mut self, record: ContainerRecord) {
        self.endpoints.insert(record.endpoint_id.clone(), record.container_id.clone());
        self.containers.insert(record.container_id.clone(), record);
    }

    pub fn container_by_id(&self, container_id: &str) -> Option<&ContainerRecord> {
        self.containers.get(container_id)
    }

    pub fn container_by_endpoint(&self, endpoint_id: &str) -> Option<&ContainerRecord> {
        self.endpoints.get(endpoint_id).and_then(|id| self.containers.get(id))
    }

    /// Attach engine-reported network settings to a tracked container.
    /// Returns false when the container is unknown.
    pub fn set_network_settings(&mut self, container_id: &str, settings: NetworkSettings) -> bool {
        match self.containers.get_mut(container_id) {
            Some(record) => {
                record.network_settings = Some(settings);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
