// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator stack naming conventions.
//!
//! Worlds deploy as the stack `crl-<event>-<user>`, events as `crl-<event>`.
//! The orchestrator names a task `<stack>_<service>.<replica>`; callers deal
//! in the bare service name.

use crate::name::Name;
use crate::world::WorldKey;

/// Stack name for a world: `crl-<event>-<user>`.
pub fn world_stack_name(key: &WorldKey) -> String {
    format!("crl-{}-{}", key.event, key.user)
}

/// Stack name for an event-level stack: `crl-<event>`.
pub fn event_stack_name(event: &Name) -> String {
    format!("crl-{event}")
}

/// Reduce an orchestrator task name to its bare service name.
///
/// Strips the `<stack>_` prefix and the trailing `.<replica>` suffix, so
/// `crl-demo-alice_wireguard.1` becomes `wireguard`. Names without the
/// prefix or suffix pass through unchanged apart from what is present.
pub fn service_short_name(stack: &str, task_name: &str) -> String {
    let prefix = format!("{stack}_");
    let stripped = task_name.strip_prefix(&prefix).unwrap_or(task_name);
    match stripped.rsplit_once('.') {
        Some((service, _replica)) => service.to_string(),
        None => stripped.to_string(),
    }
}

#[cfg(test)]
#[path = "stack_tests.rs"]
mod tests;
