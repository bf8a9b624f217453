// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The world-composer seam.
//!
//! Creating, starting, stopping and deleting a world's stack is owned by the
//! external composer CLI; the daemon only needs a success/failure verdict.
//! `Ok(false)` means the command ran and reported failure; `Err` means it
//! could not be run at all. Both are routed into the state machine as a
//! `fail` signal by the blocking-op executor.

use std::path::PathBuf;
use std::process::Command;

use crl_core::Name;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Blocking world operations. Implementations may take seconds to minutes;
/// callers must run them through the blocking-op executor.
pub trait WorldOps: Send + Sync + 'static {
    fn create(&self, event: &Name, user: &Name) -> Result<bool, OpsError>;
    fn start(&self, event: &Name, user: &Name) -> Result<bool, OpsError>;
    fn stop(&self, event: &Name, user: &Name) -> Result<bool, OpsError>;
    fn delete(&self, event: &Name, user: &Name) -> Result<bool, OpsError>;
}

/// Production implementation shelling out to the composer CLI as
/// `<program> <verb> --config-dir <root> <event> <user>`.
pub struct ComposerCli {
    program: PathBuf,
    config_dir: PathBuf,
}

impl ComposerCli {
    pub fn new(program: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), config_dir: config_dir.into() }
    }

    fn run(&self, verb: &str, event: &Name, user: &Name) -> Result<bool, OpsError> {
        let output = Command::new(&self.program)
            .arg(verb)
            .arg("--config-dir")
            .arg(&self.config_dir)
            .arg(event.as_str())
            .arg(user.as_str())
            .output()
            .map_err(|source| OpsError::Spawn {
                command: format!("{} {verb} {event} {user}", self.program.display()),
                source,
            })?;

        if !output.status.success() {
            warn!(
                "composer {verb} failed for event={event} user={user}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output.status.success())
    }
}

impl WorldOps for ComposerCli {
    fn create(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("create", event, user)
    }

    fn start(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("start", event, user)
    }

    fn stop(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("stop", event, user)
    }

    fn delete(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("delete", event, user)
    }
}

#[cfg(test)]
#[path = "world_ops_tests.rs"]
mod tests;
