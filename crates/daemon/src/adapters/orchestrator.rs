// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record-returning wrappers over the container-orchestrator CLI.
//!
//! Three capabilities: list the running tasks of a stack, inspect a single
//! object, and list services by name filter. All calls shell out to the
//! orchestrator binary with `--format=json` and parse its line-oriented
//! output into plain records. A non-zero exit is how the CLI reports "no
//! such object" and maps to an empty result; only a broken invocation or
//! unparseable output surfaces as an error.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crl_core::service_short_name;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` produced unparseable output: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One running task of a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Bare service name (stack prefix and replica suffix stripped).
    pub service: String,
    pub id: String,
    pub desired_state: String,
    pub current_state: String,
    pub error: String,
    /// No error, desired state `Running`, current state starts with `Running`.
    pub up: bool,
}

/// Service summary from a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
}

/// A service's virtual IP on one attached network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkVip {
    /// Full network name as the orchestrator reports it.
    pub network: String,
    /// CIDR-form address, e.g. `10.0.3.2/24`.
    pub addr: String,
}

/// The orchestrator seam. Implementations are blocking.
pub trait Orchestrator: Send + Sync + 'static {
    /// Running tasks of `stack`; empty when the stack does not exist.
    fn list_stack_tasks(&self, stack: &str) -> Result<Vec<TaskRecord>, AdapterError>;

    /// Raw descriptor of one object; `None` when it does not exist.
    fn inspect(&self, id_or_name: &str) -> Result<Option<Value>, AdapterError>;

    /// Services whose name matches `name_filter`.
    fn list_services(&self, name_filter: &str) -> Result<Vec<ServiceRecord>, AdapterError>;

    /// Virtual IPs of a service per attached network, with network IDs
    /// resolved to names. Entries without both a network and an address are
    /// dropped, as are networks that no longer resolve.
    fn service_vips(&self, id_or_name: &str) -> Result<Vec<NetworkVip>, AdapterError> {
        let Some(service) = self.inspect(id_or_name)? else {
            return Ok(Vec::new());
        };
        let entries = service
            .pointer("/Endpoint/VirtualIPs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut vips = Vec::new();
        for entry in entries {
            let network_id = entry.get("NetworkID").and_then(Value::as_str).unwrap_or_default();
            let addr = entry.get("Addr").and_then(Value::as_str).unwrap_or_default();
            if network_id.is_empty() || addr.is_empty() {
                continue;
            }
            let Some(network) = self.inspect(network_id)? else {
                continue;
            };
            let Some(name) = network.get("Name").and_then(Value::as_str) else {
                continue;
            };
            vips.push(NetworkVip { network: name.to_string(), addr: addr.to_string() });
        }
        Ok(vips)
    }
}

/// `docker stack ps` task line, as emitted with `--format=json`.
#[derive(Debug, Deserialize)]
struct TaskLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(default, rename = "DesiredState")]
    desired_state: String,
    #[serde(default, rename = "CurrentState")]
    current_state: String,
    #[serde(default, rename = "Error")]
    error: String,
}

/// `docker service ls` line, as emitted with `--format=json`.
#[derive(Debug, Deserialize)]
struct ServiceLine {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

/// Production adapter shelling out to the docker CLI.
pub struct DockerCli {
    program: PathBuf,
}

impl DockerCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    fn run(&self, args: &[&str]) -> Result<Output, AdapterError> {
        Command::new(&self.program).args(args).output().map_err(|source| AdapterError::Spawn {
            command: self.command_line(args),
            source,
        })
    }

    fn command_line(&self, args: &[&str]) -> String {
        format!("{} {}", self.program.display(), args.join(" "))
    }

    fn parse_line<T: for<'de> Deserialize<'de>>(
        &self,
        args: &[&str],
        line: &str,
    ) -> Result<T, AdapterError> {
        serde_json::from_str(line).map_err(|source| AdapterError::Parse {
            command: self.command_line(args),
            source,
        })
    }
}

impl Orchestrator for DockerCli {
    fn list_stack_tasks(&self, stack: &str) -> Result<Vec<TaskRecord>, AdapterError> {
        let args =
            ["stack", "ps", "--format=json", "--filter", "desired-state=running", stack];
        let output = self.run(&args)?;
        if !output.status.success() {
            // "nothing found in stack": the stack does not exist
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut tasks = Vec::new();
        for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
            let task: TaskLine = self.parse_line(&args, line)?;
            let up = task.error.is_empty()
                && task.desired_state == "Running"
                && task.current_state.starts_with("Running");
            tasks.push(TaskRecord {
                service: service_short_name(stack, &task.name),
                id: task.id,
                desired_state: task.desired_state,
                current_state: task.current_state,
                error: task.error,
                up,
            });
        }
        Ok(tasks)
    }

    fn inspect(&self, id_or_name: &str) -> Result<Option<Value>, AdapterError> {
        let args = ["inspect", "--format=json", id_or_name];
        let output = self.run(&args)?;
        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(line) = stdout.lines().find(|line| !line.trim().is_empty()) else {
            return Ok(None);
        };
        let parsed: Value = self.parse_line(&args, line)?;
        // `inspect` always yields an array of descriptors
        Ok(parsed.as_array().and_then(|descriptors| descriptors.first()).cloned())
    }

    fn list_services(&self, name_filter: &str) -> Result<Vec<ServiceRecord>, AdapterError> {
        let filter = format!("name={name_filter}");
        let args = ["service", "ls", "--format=json", "--filter", filter.as_str()];
        let output = self.run(&args)?;
        if !output.status.success() {
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut services = Vec::new();
        for line in stdout.lines().filter(|line| !line.trim().is_empty()) {
            let service: ServiceLine = self.parse_line(&args, line)?;
            services.push(ServiceRecord { id: service.id, name: service.name });
        }
        Ok(services)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
