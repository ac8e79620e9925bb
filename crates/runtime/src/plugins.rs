// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy host plugin registry.
//!
//! Pre-managed-plugin volume drivers register themselves by dropping a
//! socket or spec file into one of the conventional plugin directories.
//! Scanning is best-effort: a missing directory just means no plugins of
//! that kind are installed.

use crate::client::EngineError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Directories scanned for legacy plugin registrations.
const PLUGIN_DIRS: &[&str] =
    &["/run/docker/plugins", "/etc/docker/plugins", "/usr/lib/docker/plugins"];

/// Extensions a plugin registration file may carry.
const PLUGIN_EXTENSIONS: &[&str] = &["sock", "spec", "json"];

/// Registry of optional host-installed plugins.
#[async_trait]
pub trait PluginRegistry: Send + Sync + 'static {
    /// Enumerate installed plugin names.
    async fn scan(&self) -> Result<Vec<String>, EngineError>;
}

/// Plugin registry scanning the conventional host directories.
#[derive(Debug, Clone)]
pub struct HostPluginRegistry {
    dirs: Vec<PathBuf>,
}

impl Default for HostPluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HostPluginRegistry {
    pub fn new() -> Self {
        Self { dirs: PLUGIN_DIRS.iter().map(PathBuf::from).collect() }
    }

    /// Scan a custom directory list (tests, non-standard installs).
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

#[async_trait]
impl PluginRegistry for HostPluginRegistry {
    async fn scan(&self) -> Result<Vec<String>, EngineError> {
        let mut names = Vec::new();
        for dir in &self.dirs {
            if !dir.exists() {
                continue;
            }
            let entries = std::fs::read_dir(dir)
                .map_err(|e| EngineError::Registry(format!("{}: {}", dir.display(), e)))?;
            for entry in entries {
                let entry =
                    entry.map_err(|e| EngineError::Registry(format!("{}: {}", dir.display(), e)))?;
                let path = entry.path();
                let matches_ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| PLUGIN_EXTENSIONS.contains(&e));
                if !matches_ext {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !names.iter().any(|n| n == stem) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        // Directory iteration order is filesystem-dependent
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
#[path = "plugins_tests.rs"]
mod tests;
