// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup plumbing: tracing init and the instance lock.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::capabilities::CapabilityError;
use crate::config::ConfigError;

/// Errors bringing the daemon up.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot determine state directory (HOME unset)")]
    NoStateDir,
    #[error("another dockhandd instance holds the lock")]
    AlreadyRunning(#[source] std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("capability negotiation failed: {0}")]
    Negotiation(#[from] CapabilityError),
}

/// Initialize tracing from `RUST_LOG`, defaulting to info.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Acquire the daemon instance lock and write our PID into it.
///
/// The lock is held for the lifetime of the returned file handle. Uses
/// OpenOptions without truncation so a failed acquisition never wipes the
/// running daemon's PID.
pub fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::AlreadyRunning)?;

    // Truncate now that we hold the lock
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
