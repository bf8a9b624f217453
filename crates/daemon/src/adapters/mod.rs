// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters over the daemon's external collaborators: the container
//! orchestrator and the world-composer CLI. Everything in here is blocking
//! and must be driven through `tokio::task::spawn_blocking`.

pub mod orchestrator;
pub mod world_ops;

pub use orchestrator::{
    AdapterError, DockerCli, NetworkVip, Orchestrator, ServiceRecord, TaskRecord,
};
pub use world_ops::{ComposerCli, OpsError, WorldOps};
