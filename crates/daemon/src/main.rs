// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! dockhandd — node agent daemon.
//!
//! Startup order: tracing, config, instance lock, one capability
//! negotiation cycle against the local engine (the attribute list is what
//! node registration advertises to the control plane), then the metadata
//! listener until shutdown.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use dockhand_daemon::capabilities::CapabilityProbe;
use dockhand_daemon::config::AgentConfig;
use dockhand_daemon::env;
use dockhand_daemon::lifecycle::{self, LifecycleError};
use dockhand_daemon::listener::MetadataListener;
use dockhand_daemon::state::TaskStateStore;
use dockhand_runtime::{CniBinaryClient, DockerEngine, HostPluginRegistry};

#[tokio::main]
async fn main() {
    lifecycle::init_tracing();
    if let Err(e) = run().await {
        tracing::error!(error = %e, "dockhandd failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LifecycleError> {
    info!(version = env::AGENT_VERSION, "starting dockhandd");

    let mut config = AgentConfig::load()?;

    let state_dir = env::state_dir()?;
    std::fs::create_dir_all(&state_dir)?;
    let _lock = lifecycle::acquire_lock(&state_dir.join("dockhandd.lock"))?;

    let probe = CapabilityProbe::new(
        Arc::new(DockerEngine::new(&config.engine_socket)),
        Arc::new(HostPluginRegistry::new()),
        Arc::new(CniBinaryClient::new(&config.network_plugin_dir)),
    );

    let attributes = probe.negotiate(&mut config).await?;
    info!(count = attributes.len(), "negotiated node capabilities");
    for attribute in &attributes {
        debug!(capability = %attribute, "advertising");
    }

    let state = Arc::new(Mutex::new(TaskStateStore::default()));
    let listener = MetadataListener::bind(config.metadata_port, Arc::clone(&state)).await?;
    info!(addr = %listener.local_addr()?, "metadata endpoint listening");

    let shutdown = CancellationToken::new();
    let listener_task = tokio::spawn(listener.run(shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    shutdown.cancel();
    let _ = listener_task.await;

    Ok(())
}
