// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only view of the on-disk configuration tree.
//!
//! Worlds live under `<root>/Events/<event>/<user>/`. The VPN peer config at
//! `…/peer/peer_<user>.conf` is the persistent marker that a world has been
//! created at least once; the rest of the tree is written only by the
//! composer CLI through the blocking ops.

use std::io;
use std::path::{Path, PathBuf};

use crl_core::{Name, WorldKey};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/Events`
    pub fn events_dir(&self) -> PathBuf {
        self.root.join("Events")
    }

    /// `<root>/Events/<event>/<user>`
    pub fn world_dir(&self, key: &WorldKey) -> PathBuf {
        self.events_dir().join(key.event.as_str()).join(key.user.as_str())
    }

    /// `<root>/Events/<event>/<user>/peer/peer_<user>.conf`
    pub fn peer_config_path(&self, key: &WorldKey) -> PathBuf {
        self.world_dir(key).join("peer").join(format!("peer_{}.conf", key.user))
    }

    pub fn has_peer_config(&self, key: &WorldKey) -> bool {
        self.peer_config_path(key).exists()
    }

    /// Contents of the world's VPN peer config; `Ok(None)` when absent.
    pub fn read_peer_config(&self, key: &WorldKey) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.peer_config_path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Names of the event directories, dotfiles skipped.
    pub fn list_events(&self) -> Vec<String> {
        list_subdirs(&self.events_dir())
    }

    /// Names of the world directories within an event, dotfiles skipped.
    pub fn list_worlds(&self, event: &str) -> Vec<String> {
        list_subdirs(&self.events_dir().join(event))
    }

    /// Every world on disk whose event and user directories carry valid
    /// (already case-folded) names.
    pub fn worlds(&self) -> Vec<WorldKey> {
        let mut keys = Vec::new();
        for event in self.list_events() {
            let Some(event_name) = folded_name(&event) else {
                debug!("skipping event directory with unusable name: {event}");
                continue;
            };
            for user in self.list_worlds(&event) {
                let Some(user_name) = folded_name(&user) else {
                    debug!("skipping world directory with unusable name: {event}/{user}");
                    continue;
                };
                keys.push(WorldKey::new(event_name.clone(), user_name));
            }
        }
        keys
    }
}

/// Parse a directory name, accepting it only when it is already in folded
/// form (a name with uppercase letters would not round-trip to its path).
fn folded_name(raw: &str) -> Option<Name> {
    Name::parse(raw).ok().filter(|name| name.as_str() == raw)
}

fn list_subdirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
