// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort volume plugin discovery.
//!
//! Two independent sources: the legacy host plugin registry and the
//! engine's managed plugin listing. The calls run concurrently and each
//! failure degrades that source to nothing — absence of the plugin
//! subsystem must never block node registration. The built-in `local`
//! driver is always reported first.

use dockhand_runtime::{EngineClient, PluginFilter, PluginRegistry};
use tracing::warn;

/// Volume driver every engine ships with.
pub const BUILTIN_VOLUME_DRIVER: &str = "local";

/// Discover installed volume driver names, builtin first, duplicates
/// dropped. Never fails: discovery errors are logged and skipped.
pub(crate) async fn volume_driver_names(
    engine: &dyn EngineClient,
    registry: &dyn PluginRegistry,
) -> Vec<String> {
    let (scanned, managed) =
        tokio::join!(registry.scan(), engine.list_plugins(PluginFilter::volume_drivers()));

    let mut names = vec![BUILTIN_VOLUME_DRIVER.to_string()];

    match scanned {
        Ok(list) => extend_unique(&mut names, list),
        Err(e) => warn!(error = %e, "host plugin scan failed, advertising builtin driver only"),
    }
    match managed {
        Ok(list) => extend_unique(&mut names, list),
        Err(e) => {
            warn!(error = %e, "engine plugin listing failed, advertising builtin driver only")
        }
    }

    names
}

fn extend_unique(names: &mut Vec<String>, discovered: Vec<String>) {
    for name in discovered {
        if !names.contains(&name) {
            names.push(name);
        }
    }
}
