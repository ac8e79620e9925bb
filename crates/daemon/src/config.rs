// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration.
//!
//! Loaded once at process start from an optional TOML file, then overlaid
//! with `DOCKHAND_*` environment overrides. The capability engine holds
//! mutating access to exactly one field class: tri-state flags whose
//! prerequisite engine version turns out to be unavailable are force-set to
//! explicitly-disabled during negotiation, so later reads in the process
//! see the corrected value.

use dockhand_core::{ApiVersion, BooleanDefaultFalse, BooleanDefaultTrue, TriState};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Port the task metadata endpoint listens on.
pub const DEFAULT_METADATA_PORT: u16 = 51679;

/// Default network plugin queried for task networking.
pub const DEFAULT_NETWORK_PLUGIN: &str = "dockhand-net";

/// Errors loading the agent configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Container log drivers the control plane can schedule against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingDriver {
    JsonFile,
    Syslog,
    Journald,
    Gelf,
    Fluentd,
    Splunk,
}

dockhand_core::simple_display! {
    LoggingDriver {
        JsonFile => "json-file",
        Syslog => "syslog",
        Journald => "journald",
        Gelf => "gelf",
        Fluentd => "fluentd",
        Splunk => "splunk",
    }
}

impl LoggingDriver {
    /// Engine remote-API version that introduced this driver.
    ///
    /// A driver is advertised only when this exact version is present in
    /// the engine's supported set.
    pub fn required_engine_version(&self) -> ApiVersion {
        match self {
            LoggingDriver::JsonFile => ApiVersion::new(1, 18),
            LoggingDriver::Syslog => ApiVersion::new(1, 18),
            LoggingDriver::Journald => ApiVersion::new(1, 18),
            LoggingDriver::Gelf => ApiVersion::new(1, 20),
            LoggingDriver::Fluentd => ApiVersion::new(1, 21),
            LoggingDriver::Splunk => ApiVersion::new(1, 24),
        }
    }
}

/// Agent configuration, shared across the daemon.
///
/// The negotiation call takes `&mut AgentConfig`; any other concurrent
/// reader must go through the same lock the caller holds (single-writer
/// contract for the durable-downgrade flags).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Log drivers the operator allows tasks to use.
    pub available_logging_drivers: Vec<LoggingDriver>,
    /// Refuse privileged containers on this node.
    pub privileged_disabled: BooleanDefaultFalse,
    pub selinux_capable: BooleanDefaultFalse,
    pub apparmor_capable: BooleanDefaultFalse,
    /// Attach tasks to their own network interfaces.
    pub task_networking: bool,
    /// Block the instance metadata service from task-networked containers.
    pub block_instance_metadata: bool,
    /// Vend per-task credentials roles.
    pub task_role: bool,
    /// Vend per-task credentials roles for host-networked tasks.
    pub task_role_network_host: bool,
    /// Enforce task-level CPU/memory limits. Unset resolves to enabled.
    pub task_cpu_mem_limit: BooleanDefaultTrue,
    pub disable_health_check: BooleanDefaultFalse,
    /// Container engine Unix socket.
    pub engine_socket: PathBuf,
    /// Directory holding network plugin binaries.
    pub network_plugin_dir: PathBuf,
    /// Network plugin queried for its version during negotiation.
    pub network_plugin: String,
    pub metadata_port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            available_logging_drivers: vec![LoggingDriver::JsonFile],
            privileged_disabled: BooleanDefaultFalse::default(),
            selinux_capable: BooleanDefaultFalse::default(),
            apparmor_capable: BooleanDefaultFalse::default(),
            task_networking: false,
            block_instance_metadata: false,
            task_role: false,
            task_role_network_host: false,
            task_cpu_mem_limit: BooleanDefaultTrue::default(),
            disable_health_check: BooleanDefaultFalse::default(),
            engine_socket: PathBuf::from("/var/run/docker.sock"),
            network_plugin_dir: PathBuf::from("/usr/lib/dockhand/net-plugins"),
            network_plugin: DEFAULT_NETWORK_PLUGIN.to_string(),
            metadata_port: DEFAULT_METADATA_PORT,
        }
    }
}

impl AgentConfig {
    /// Load configuration: TOML file (if present) overlaid with
    /// `DOCKHAND_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = crate::env::config_path();
        let mut config =
            if path.exists() { Self::from_file(&path)? } else { Self::default() };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Apply environment-style overrides via an injected lookup.
    ///
    /// Unparseable values are ignored in favor of the current setting.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(socket) = get("DOCKHAND_ENGINE_SOCKET") {
            self.engine_socket = PathBuf::from(socket);
        }
        if let Some(port) = get("DOCKHAND_METADATA_PORT").and_then(|v| v.parse().ok()) {
            self.metadata_port = port;
        }
        if let Some(v) = get("DOCKHAND_TASK_NETWORKING").and_then(|v| parse_bool(&v)) {
            self.task_networking = v;
        }
        if let Some(v) = get("DOCKHAND_BLOCK_INSTANCE_METADATA").and_then(|v| parse_bool(&v)) {
            self.block_instance_metadata = v;
        }
        if let Some(v) = get("DOCKHAND_TASK_ROLE").and_then(|v| parse_bool(&v)) {
            self.task_role = v;
        }
        if let Some(v) = get("DOCKHAND_TASK_ROLE_NETWORK_HOST").and_then(|v| parse_bool(&v)) {
            self.task_role_network_host = v;
        }
        if let Some(state) = tri_state(&get, "DOCKHAND_PRIVILEGED_DISABLED") {
            self.privileged_disabled.state = state;
        }
        if let Some(state) = tri_state(&get, "DOCKHAND_SELINUX_CAPABLE") {
            self.selinux_capable.state = state;
        }
        if let Some(state) = tri_state(&get, "DOCKHAND_APPARMOR_CAPABLE") {
            self.apparmor_capable.state = state;
        }
        if let Some(state) = tri_state(&get, "DOCKHAND_TASK_CPU_MEM_LIMIT") {
            self.task_cpu_mem_limit.state = state;
        }
        if let Some(state) = tri_state(&get, "DOCKHAND_DISABLE_HEALTH_CHECK") {
            self.disable_health_check.state = state;
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// An env-provided boolean is an explicit operator choice, never NotSet.
fn tri_state(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<TriState> {
    get(name).and_then(|v| parse_bool(&v)).map(|v| {
        if v {
            TriState::ExplicitlyEnabled
        } else {
            TriState::ExplicitlyDisabled
        }
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
