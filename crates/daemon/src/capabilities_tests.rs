// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::LoggingDriver;
use dockhand_core::TriState;
use dockhand_runtime::{FakeEngine, FakeNetworkPlugin, FakePluginRegistry};

fn vers(list: &[&str]) -> Vec<ApiVersion> {
    list.iter().map(|v| v.parse().unwrap()).collect()
}

fn probe(
    engine: FakeEngine,
    registry: FakePluginRegistry,
    network_plugin: FakeNetworkPlugin,
) -> (CapabilityProbe, Arc<FakeEngine>, Arc<FakeNetworkPlugin>) {
    let engine = Arc::new(engine);
    let network_plugin = Arc::new(network_plugin);
    let probe = CapabilityProbe::new(
        Arc::clone(&engine) as Arc<dyn EngineClient>,
        Arc::new(registry),
        Arc::clone(&network_plugin) as Arc<dyn NetworkPluginClient>,
    );
    (probe, engine, network_plugin)
}

fn names(attrs: &[Attribute]) -> Vec<String> {
    attrs.iter().map(|a| a.name.clone()).collect()
}

fn has(attrs: &[Attribute], suffix: &str) -> bool {
    attrs.iter().any(|a| a.name == format!("{}{}", ATTRIBUTE_PREFIX, suffix))
}

fn value_of<'a>(attrs: &'a [Attribute], suffix: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name == format!("{}{}", ATTRIBUTE_PREFIX, suffix))
        .and_then(|a| a.value.as_deref())
}

#[tokio::test]
async fn advertises_full_capability_set() {
    let engine = FakeEngine::new()
        .with_supported(vers(&["1.17", "1.18"]))
        .with_known(vers(&["1.17", "1.18", "1.19"]));
    let (probe, _, network_plugin) = probe(
        engine,
        FakePluginRegistry::new(),
        FakeNetworkPlugin::new().with_version("v1"),
    );

    let mut config = AgentConfig {
        available_logging_drivers: vec![
            LoggingDriver::JsonFile,
            LoggingDriver::Syslog,
            LoggingDriver::Journald,
            LoggingDriver::Gelf,
            LoggingDriver::Fluentd,
        ],
        privileged_disabled: dockhand_core::BooleanDefaultFalse::new(
            TriState::ExplicitlyDisabled,
        ),
        selinux_capable: dockhand_core::BooleanDefaultFalse::new(TriState::ExplicitlyEnabled),
        apparmor_capable: dockhand_core::BooleanDefaultFalse::new(TriState::ExplicitlyEnabled),
        task_networking: true,
        block_instance_metadata: true,
        ..AgentConfig::default()
    };

    let attrs = probe.negotiate(&mut config).await.unwrap();

    for expected in [
        "privileged-container",
        "remote-api.1.17",
        "remote-api.1.18",
        "logging-driver.json-file",
        "logging-driver.syslog",
        "logging-driver.journald",
        "selinux",
        "apparmor",
        "task-networking",
        "task-networking-block-instance-metadata",
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
        "volume-driver.local",
    ] {
        assert!(has(&attrs, expected), "missing {}; got {:?}", expected, names(&attrs));
    }
    assert_eq!(value_of(&attrs, "network-plugin-version"), Some("v1"));
    assert_eq!(network_plugin.queried(), vec!["dockhand-net"]);

    // the engine never reported 1.19, even though the build knows it
    assert!(!has(&attrs, "remote-api.1.19"));
    // gelf/fluentd need engine versions this engine does not support
    assert!(!has(&attrs, "logging-driver.gelf"));
    assert!(!has(&attrs, "logging-driver.fluentd"));
    // floors unmet at 1.18
    assert!(!has(&attrs, "task-cpu-mem-limit"));
    assert!(!has(&attrs, "container-health-check"));
}

#[tokio::test]
async fn remote_api_attributes_follow_supported_exactly() {
    let engine = FakeEngine::new()
        .with_supported(vers(&["1.17", "1.18"]))
        .with_known(vers(&["1.17", "1.18", "1.19"]));
    let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());

    let attrs = probe.negotiate(&mut AgentConfig::default()).await.unwrap();
    let remote: Vec<String> = names(&attrs)
        .into_iter()
        .filter(|n| n.starts_with("node.capability.remote-api."))
        .collect();
    assert_eq!(
        remote,
        vec!["node.capability.remote-api.1.17", "node.capability.remote-api.1.18"]
    );
}

#[tokio::test]
async fn block_metadata_attribute_requires_task_networking() {
    let engine = FakeEngine::new().with_supported(vers(&["1.17", "1.18"]));
    let (probe, _, network_plugin) =
        probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new().with_version("v1"));

    let mut config = AgentConfig {
        task_networking: false,
        block_instance_metadata: true,
        ..AgentConfig::default()
    };
    let attrs = probe.negotiate(&mut config).await.unwrap();

    assert!(!has(&attrs, "task-networking"));
    assert!(!has(&attrs, "task-networking-block-instance-metadata"));
    // the plugin is never consulted when task networking is off
    assert!(network_plugin.queried().is_empty());
}

#[tokio::test]
async fn network_plugin_failure_degrades_to_omission() {
    let engine = FakeEngine::new().with_supported(vers(&["1.17"]));
    let (probe, _, _) = probe(
        engine,
        FakePluginRegistry::new(),
        FakeNetworkPlugin::new().failing("exec failed"),
    );

    let mut config = AgentConfig { task_networking: true, ..AgentConfig::default() };
    let attrs = probe.negotiate(&mut config).await.unwrap();

    assert!(has(&attrs, "task-networking"));
    assert!(!has(&attrs, "network-plugin-version"));
}

#[tokio::test]
async fn task_role_needs_version_floor() {
    for (supported, expected) in [(&["1.19"], true), (&["1.18"], false)] {
        let engine = FakeEngine::new().with_supported(vers(supported));
        let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
        let mut config = AgentConfig { task_role: true, ..AgentConfig::default() };
        let attrs = probe.negotiate(&mut config).await.unwrap();
        assert_eq!(has(&attrs, "task-role"), expected, "supported={:?}", supported);
    }
}

#[tokio::test]
async fn task_role_network_host_needs_version_floor() {
    for (supported, expected) in [(&["1.19"], true), (&["1.18"], false)] {
        let engine = FakeEngine::new().with_supported(vers(supported));
        let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
        let mut config = AgentConfig { task_role_network_host: true, ..AgentConfig::default() };
        let attrs = probe.negotiate(&mut config).await.unwrap();
        assert_eq!(has(&attrs, "task-role-network-host"), expected);
    }
}

#[tokio::test]
async fn resource_limit_explicit_enable_with_met_floor() {
    let engine = FakeEngine::new().with_supported(vers(&["1.22"]));
    let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
    let mut config = AgentConfig {
        task_cpu_mem_limit: dockhand_core::BooleanDefaultTrue::new(TriState::ExplicitlyEnabled),
        ..AgentConfig::default()
    };

    let attrs = probe.negotiate(&mut config).await.unwrap();
    assert!(has(&attrs, "task-cpu-mem-limit"));
    assert!(config.task_cpu_mem_limit.enabled());
    assert_eq!(config.task_cpu_mem_limit.state, TriState::ExplicitlyEnabled);
}

#[tokio::test]
async fn resource_limit_unset_with_unmet_floor_downgrades_durably() {
    let engine = FakeEngine::new().with_supported(vers(&["1.19"]));
    let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
    let mut config = AgentConfig::default();
    assert!(config.task_cpu_mem_limit.enabled());

    let attrs = probe.negotiate(&mut config).await.unwrap();
    assert!(!has(&attrs, "task-cpu-mem-limit"));
    // the shared flag now reads false for every later consumer
    assert!(!config.task_cpu_mem_limit.enabled());
    assert_eq!(config.task_cpu_mem_limit.state, TriState::ExplicitlyDisabled);
}

#[tokio::test]
async fn resource_limit_explicit_enable_with_unmet_floor_is_fatal() {
    let engine = FakeEngine::new().with_supported(vers(&["1.19"]));
    let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
    let mut config = AgentConfig {
        task_cpu_mem_limit: dockhand_core::BooleanDefaultTrue::new(TriState::ExplicitlyEnabled),
        ..AgentConfig::default()
    };

    let result = probe.negotiate(&mut config).await;
    assert!(matches!(
        result,
        Err(CapabilityError::ResourceLimitUnsupported { floor }) if floor == RESOURCE_LIMIT_FLOOR
    ));
    // the operator's setting is left exactly as written
    assert_eq!(config.task_cpu_mem_limit.state, TriState::ExplicitlyEnabled);
}

#[tokio::test]
async fn version_listing_failure_is_fatal() {
    let engine = FakeEngine::new().failing_supported_versions("engine unreachable");
    let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());

    let result = probe.negotiate(&mut AgentConfig::default()).await;
    assert!(matches!(result, Err(CapabilityError::VersionDiscovery(_))));
}

#[tokio::test]
async fn registry_scan_failure_degrades_to_builtin_driver() {
    let engine = FakeEngine::new().with_supported(vers(&["1.19"]));
    let (probe, _, _) = probe(
        engine,
        FakePluginRegistry::new().failing("scan failed"),
        FakeNetworkPlugin::new(),
    );

    let attrs = probe.negotiate(&mut AgentConfig::default()).await.unwrap();
    let drivers: Vec<String> = names(&attrs)
        .into_iter()
        .filter(|n| n.starts_with("node.capability.volume-driver."))
        .collect();
    assert_eq!(drivers, vec!["node.capability.volume-driver.local"]);
}

#[tokio::test]
async fn engine_plugin_listing_failure_degrades_to_builtin_driver() {
    let engine = FakeEngine::new()
        .with_supported(vers(&["1.19"]))
        .failing_plugin_listing("listing failed");
    let (probe, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());

    let attrs = probe.negotiate(&mut AgentConfig::default()).await.unwrap();
    let drivers: Vec<String> = names(&attrs)
        .into_iter()
        .filter(|n| n.starts_with("node.capability.volume-driver."))
        .collect();
    assert_eq!(drivers, vec!["node.capability.volume-driver.local"]);
}

#[tokio::test]
async fn discovered_volume_drivers_are_advertised_and_deduped() {
    let engine = FakeEngine::new()
        .with_supported(vers(&["1.19"]))
        .with_plugins(vec!["acme/blockvol".to_string(), "zfsvol".to_string()]);
    let (probe, _, _) = probe(
        engine,
        FakePluginRegistry::new()
            .with_names(vec!["zfsvol".to_string(), "local".to_string()]),
        FakeNetworkPlugin::new(),
    );

    let attrs = probe.negotiate(&mut AgentConfig::default()).await.unwrap();
    let drivers: Vec<String> = names(&attrs)
        .into_iter()
        .filter(|n| n.starts_with("node.capability.volume-driver."))
        .collect();
    assert_eq!(
        drivers,
        vec![
            "node.capability.volume-driver.local",
            "node.capability.volume-driver.zfsvol",
            "node.capability.volume-driver.acme/blockvol",
        ]
    );
}

#[tokio::test]
async fn health_check_follows_floor_and_disable_flag() {
    // floor met, flag unset
    let engine = FakeEngine::new().with_supported(vers(&["1.24"]));
    let (p, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
    let attrs = p.negotiate(&mut AgentConfig::default()).await.unwrap();
    assert!(has(&attrs, "container-health-check"));

    // floor met, explicitly disabled
    let engine = FakeEngine::new().with_supported(vers(&["1.24"]));
    let (p, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
    let mut config = AgentConfig {
        disable_health_check: dockhand_core::BooleanDefaultFalse::new(
            TriState::ExplicitlyEnabled,
        ),
        ..AgentConfig::default()
    };
    let attrs = p.negotiate(&mut config).await.unwrap();
    assert!(!has(&attrs, "container-health-check"));

    // floor unmet
    let engine = FakeEngine::new().with_supported(vers(&["1.23"]));
    let (p, _, _) = probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
    let attrs = p.negotiate(&mut AgentConfig::default()).await.unwrap();
    assert!(!has(&attrs, "container-health-check"));
}

#[tokio::test]
async fn negotiation_is_idempotent_for_unchanged_inputs() {
    let engine = Arc::new(
        FakeEngine::new().with_supported(vers(&["1.22", "1.24"])).with_known(vers(&["1.22"])),
    );
    let probe = CapabilityProbe::new(
        Arc::clone(&engine) as Arc<dyn EngineClient>,
        Arc::new(FakePluginRegistry::new()),
        Arc::new(FakeNetworkPlugin::new().with_version("v2")),
    );

    let mut config = AgentConfig { task_networking: true, ..AgentConfig::default() };
    let first = probe.negotiate(&mut config).await.unwrap();
    let second = probe.negotiate(&mut config).await.unwrap();

    // deterministic append order, not just set equality
    assert_eq!(names(&first), names(&second));

    let mut sorted_first = names(&first);
    let mut sorted_second = names(&second);
    sorted_first.sort();
    sorted_second.sort();
    assert_eq!(sorted_first, sorted_second);
}

proptest::proptest! {
    #[test]
    fn one_remote_api_attribute_per_unique_supported_version(
        raw in proptest::collection::vec((1u32..3, 0u32..30), 0..12)
    ) {
        let supported: Vec<ApiVersion> =
            raw.iter().map(|(maj, min)| ApiVersion::new(*maj, *min)).collect();
        let mut unique = supported.clone();
        unique.sort();
        unique.dedup();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| proptest::test_runner::TestCaseError::fail(e.to_string()))?;
        let attrs = runtime.block_on(async {
            let engine = FakeEngine::new().with_supported(supported.clone());
            let (probe, _, _) =
                probe(engine, FakePluginRegistry::new(), FakeNetworkPlugin::new());
            probe.negotiate(&mut AgentConfig::default()).await
        });
        let attrs = attrs.map_err(|e| proptest::test_runner::TestCaseError::fail(e.to_string()))?;

        let remote: Vec<String> = attrs
            .iter()
            .filter(|a| a.name.starts_with("node.capability.remote-api."))
            .map(|a| a.name.clone())
            .collect();
        proptest::prop_assert_eq!(remote.len(), unique.len());
        for v in &unique {
            let name = format!("node.capability.remote-api.{}", v);
            proptest::prop_assert!(remote.contains(&name));
        }
    }
}
