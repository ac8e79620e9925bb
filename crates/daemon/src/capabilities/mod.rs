// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability negotiation against the local container engine.
//!
//! One negotiation cycle reconciles three sources — the engine's reported
//! version range, the operator's configuration overrides, and best-effort
//! plugin discovery — into the ordered attribute list the node advertises
//! at registration.
//!
//! # Failure contract
//!
//! Exactly two paths abort the whole cycle with no attributes: a transport
//! failure while listing engine versions, and an explicitly-enabled
//! resource-limit flag whose version floor is unmet. Every other sub-step
//! degrades independently (logged, attribute omitted) and negotiation
//! still succeeds.

mod discovery;
mod versions;

pub use discovery::BUILTIN_VOLUME_DRIVER;
pub use versions::EngineVersionSet;

use crate::config::AgentConfig;
use dockhand_core::{ApiVersion, Attribute};
use dockhand_runtime::{EngineClient, EngineError, NetworkPluginClient, PluginRegistry};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix for every capability attribute name.
pub const ATTRIBUTE_PREFIX: &str = "node.capability.";

const CAP_PRIVILEGED: &str = "privileged-container";
const CAP_REMOTE_API: &str = "remote-api.";
const CAP_LOGGING_DRIVER: &str = "logging-driver.";
const CAP_SELINUX: &str = "selinux";
const CAP_APPARMOR: &str = "apparmor";
const CAP_TASK_NETWORKING: &str = "task-networking";
const CAP_TASK_NETWORKING_BLOCK_IMDS: &str = "task-networking-block-instance-metadata";
const CAP_NETWORK_PLUGIN_VERSION: &str = "network-plugin-version";
const CAP_TASK_ROLE: &str = "task-role";
const CAP_TASK_ROLE_NETWORK_HOST: &str = "task-role-network-host";
const CAP_TASK_CPU_MEM_LIMIT: &str = "task-cpu-mem-limit";
const CAP_CONTAINER_HEALTH_CHECK: &str = "container-health-check";
const CAP_VOLUME_DRIVER: &str = "volume-driver.";

/// Build-level capabilities: agent features that exist regardless of what
/// the engine negotiates.
const EXECUTION_ROLE_CAPS: &[&str] = &[
    "execution-role-registry-pull",
    "execution-role-log-driver",
    "private-registry-auth",
    "registry-endpoint",
    "secrets-env.secrets-manager",
    "secrets-env.parameter-store",
    "secrets-log-driver.secrets-manager",
    "secrets-log-driver.parameter-store",
    "env-files.object-store",
    "container-ordering",
    "full-task-sync",
];

/// Engine version floor for per-task credentials roles.
pub const TASK_ROLE_FLOOR: ApiVersion = ApiVersion::new(1, 19);
/// Engine version floor for task-level CPU/memory limits.
pub const RESOURCE_LIMIT_FLOOR: ApiVersion = ApiVersion::new(1, 22);
/// Engine version floor for container health checks.
pub const HEALTH_CHECK_FLOOR: ApiVersion = ApiVersion::new(1, 24);

/// Fatal negotiation errors. Everything else degrades.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("listing engine api versions: {0}")]
    VersionDiscovery(#[source] EngineError),
    #[error("task resource limits explicitly enabled but engine support is below {floor}")]
    ResourceLimitUnsupported { floor: ApiVersion },
}

/// Attribute accumulator enforcing name uniqueness and append order.
#[derive(Default)]
struct AttributeList {
    attrs: Vec<Attribute>,
}

impl AttributeList {
    fn push(&mut self, attr: Attribute) {
        if !self.attrs.iter().any(|a| a.name == attr.name) {
            self.attrs.push(attr);
        }
    }

    fn push_named(&mut self, suffix: impl AsRef<str>) {
        self.push(Attribute::named(format!("{}{}", ATTRIBUTE_PREFIX, suffix.as_ref())));
    }

    fn push_valued(&mut self, suffix: &str, value: impl Into<String>) {
        self.push(Attribute::with_value(format!("{}{}", ATTRIBUTE_PREFIX, suffix), value));
    }
}

/// Computes the node's capability attributes.
///
/// Holds the three collaborator seams; configuration is passed per call so
/// the caller decides how the shared config object is locked.
pub struct CapabilityProbe {
    engine: Arc<dyn EngineClient>,
    registry: Arc<dyn PluginRegistry>,
    network_plugin: Arc<dyn NetworkPluginClient>,
}

impl CapabilityProbe {
    pub fn new(
        engine: Arc<dyn EngineClient>,
        registry: Arc<dyn PluginRegistry>,
        network_plugin: Arc<dyn NetworkPluginClient>,
    ) -> Self {
        Self { engine, registry, network_plugin }
    }

    /// Run one negotiation cycle.
    ///
    /// Returns the full ordered attribute list, or an error and no
    /// attributes. May mutate `config`: an unset resource-limit flag whose
    /// version floor is unmet is durably downgraded to explicitly-disabled.
    pub async fn negotiate(
        &self,
        config: &mut AgentConfig,
    ) -> Result<Vec<Attribute>, CapabilityError> {
        let supported = self
            .engine
            .supported_versions()
            .await
            .map_err(CapabilityError::VersionDiscovery)?;
        let versions = EngineVersionSet::new(supported, self.engine.known_versions());

        let unvalidated = versions.unvalidated();
        if !unvalidated.is_empty() {
            debug!(
                versions = ?unvalidated.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                "engine supports api versions newer than this build has validated"
            );
        }

        let mut list = AttributeList::default();

        if !config.privileged_disabled.enabled() {
            list.push_named(CAP_PRIVILEGED);
        }

        for version in versions.supported() {
            list.push_named(format!("{}{}", CAP_REMOTE_API, version));
        }

        for driver in &config.available_logging_drivers {
            if versions.supports(driver.required_engine_version()) {
                list.push_named(format!("{}{}", CAP_LOGGING_DRIVER, driver));
            }
        }

        if config.selinux_capable.enabled() {
            list.push_named(CAP_SELINUX);
        }
        if config.apparmor_capable.enabled() {
            list.push_named(CAP_APPARMOR);
        }

        if config.task_networking {
            list.push_named(CAP_TASK_NETWORKING);
            if config.block_instance_metadata {
                list.push_named(CAP_TASK_NETWORKING_BLOCK_IMDS);
            }
            match self.network_plugin.version(&config.network_plugin).await {
                Ok(version) => list.push_valued(CAP_NETWORK_PLUGIN_VERSION, version),
                Err(e) => warn!(
                    plugin = %config.network_plugin,
                    error = %e,
                    "network plugin version query failed, omitting version attribute"
                ),
            }
        }

        let role_floor_met = versions.has_at_least(TASK_ROLE_FLOOR);
        if config.task_role {
            if role_floor_met {
                list.push_named(CAP_TASK_ROLE);
            } else {
                warn!(floor = %TASK_ROLE_FLOOR, "task roles configured but engine is too old");
            }
        }
        if config.task_role_network_host {
            if role_floor_met {
                list.push_named(CAP_TASK_ROLE_NETWORK_HOST);
            } else {
                warn!(
                    floor = %TASK_ROLE_FLOOR,
                    "host-network task roles configured but engine is too old"
                );
            }
        }

        for capability in EXECUTION_ROLE_CAPS {
            list.push_named(capability);
        }

        let limits_enabled = config
            .task_cpu_mem_limit
            .enable_only_if(versions.has_at_least(RESOURCE_LIMIT_FLOOR))
            .map_err(|_| CapabilityError::ResourceLimitUnsupported {
                floor: RESOURCE_LIMIT_FLOOR,
            })?;
        if limits_enabled {
            list.push_named(CAP_TASK_CPU_MEM_LIMIT);
        }

        if versions.has_at_least(HEALTH_CHECK_FLOOR) && !config.disable_health_check.enabled() {
            list.push_named(CAP_CONTAINER_HEALTH_CHECK);
        }

        for driver in
            discovery::volume_driver_names(self.engine.as_ref(), self.registry.as_ref()).await
        {
            list.push_named(format!("{}{}", CAP_VOLUME_DRIVER, driver));
        }

        Ok(list.attrs)
    }
}

#[cfg(test)]
#[path = "../capabilities_tests.rs"]
mod tests;
