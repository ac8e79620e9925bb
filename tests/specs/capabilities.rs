//! Capability negotiation specs
//!
//! Drive a full negotiation cycle through the public API with fake
//! collaborators and check the advertised attribute payload end to end.

use std::sync::Arc;

use dockhand_core::{ApiVersion, TriState};
use dockhand_daemon::capabilities::{CapabilityProbe, ATTRIBUTE_PREFIX};
use dockhand_daemon::config::{AgentConfig, LoggingDriver};
use dockhand_runtime::{
    EngineClient, FakeEngine, FakeNetworkPlugin, FakePluginRegistry, NetworkPluginClient,
};

fn vers(list: &[&str]) -> Vec<ApiVersion> {
    list.iter().map(|v| v.parse().unwrap()).collect()
}

#[tokio::test]
async fn negotiation_produces_a_registration_ready_payload() {
    let supported = vers(&["1.18", "1.19", "1.20", "1.21", "1.22", "1.23", "1.24"]);
    let engine = Arc::new(
        FakeEngine::new()
            .with_supported(supported.clone())
            .with_known(supported)
            .with_plugins(vec!["acme/blockvol".to_string()]),
    );
    let probe = CapabilityProbe::new(
        Arc::clone(&engine) as Arc<dyn EngineClient>,
        Arc::new(FakePluginRegistry::new().with_names(vec!["zfsvol".to_string()])),
        Arc::new(FakeNetworkPlugin::new().with_version("2025.09.0"))
            as Arc<dyn NetworkPluginClient>,
    );

    let mut config = AgentConfig {
        available_logging_drivers: vec![LoggingDriver::JsonFile, LoggingDriver::Fluentd],
        task_networking: true,
        block_instance_metadata: true,
        task_role: true,
        ..AgentConfig::default()
    };

    let attributes = probe.negotiate(&mut config).await.unwrap();
    let payload = serde_json::to_value(&attributes).unwrap();
    let entries = payload.as_array().unwrap();

    // every attribute is prefixed and uniquely named
    let mut names: Vec<&str> =
        entries.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert!(names.iter().all(|n| n.starts_with(ATTRIBUTE_PREFIX)));
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total, "attribute names must be unique");

    for expected in [
        "node.capability.privileged-container",
        "node.capability.remote-api.1.24",
        "node.capability.logging-driver.json-file",
        "node.capability.logging-driver.fluentd",
        "node.capability.task-networking",
        "node.capability.task-networking-block-instance-metadata",
        "node.capability.task-role",
        "node.capability.task-cpu-mem-limit",
        "node.capability.container-health-check",
        "node.capability.volume-driver.local",
        "node.capability.volume-driver.zfsvol",
        "node.capability.volume-driver.acme/blockvol",
    ] {
        assert!(names.contains(&expected), "missing {}", expected);
    }

    // name-only attributes serialize without a value field
    let privileged = entries
        .iter()
        .find(|e| e["name"] == "node.capability.privileged-container")
        .unwrap();
    assert!(privileged.get("value").is_none());

    let plugin_version = entries
        .iter()
        .find(|e| e["name"] == "node.capability.network-plugin-version")
        .unwrap();
    assert_eq!(plugin_version["value"], "2025.09.0");
}

#[tokio::test]
async fn durable_downgrade_is_visible_to_later_negotiations() {
    let engine = Arc::new(FakeEngine::new().with_supported(vers(&["1.19"])));
    let probe = CapabilityProbe::new(
        Arc::clone(&engine) as Arc<dyn EngineClient>,
        Arc::new(FakePluginRegistry::new()),
        Arc::new(FakeNetworkPlugin::new()),
    );

    let mut config = AgentConfig::default();
    assert_eq!(config.task_cpu_mem_limit.state, TriState::NotSet);

    probe.negotiate(&mut config).await.unwrap();
    assert_eq!(config.task_cpu_mem_limit.state, TriState::ExplicitlyDisabled);

    // the second cycle reads the corrected flag and still succeeds
    let attributes = probe.negotiate(&mut config).await.unwrap();
    assert!(!attributes
        .iter()
        .any(|a| a.name == "node.capability.task-cpu-mem-limit"));
}
