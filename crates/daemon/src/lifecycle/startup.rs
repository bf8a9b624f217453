// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use super::{Config, LifecycleError};
use crate::adapters::{ComposerCli, DockerCli, Orchestrator, WorldOps};
use crate::engine::{spawn_workers, Engine};
use crate::env;
use crate::store::Store;

/// Result of daemon startup: the engine for request handling and the bound
/// listener, returned separately so the caller decides how to serve.
pub struct StartupResult {
    pub engine: Arc<Engine>,
    pub listener: TcpListener,
}

/// Start the daemon.
///
/// Order matters: the queue workers consume before anything can enqueue,
/// startup reconciliation runs in the background, and the TCP listener is
/// bound last so no request arrives before the engine can serve it.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    let store = Store::new(&config.config_dir);
    let ops: Arc<dyn WorldOps> = Arc::new(ComposerCli::new(env::ops_bin(), &config.config_dir));
    let orchestrator: Arc<dyn Orchestrator> = Arc::new(DockerCli::new(env::docker_bin()));

    let (engine, queues) = Engine::new(store, ops, orchestrator);
    spawn_workers(Arc::clone(&engine), queues);
    spawn_initial_reconciliation(Arc::clone(&engine));

    let addr = config.listen_socket();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| LifecycleError::BindFailed(addr, source))?;
    info!("crld listening at http://{addr} config_dir={}", config.config_dir.display());

    Ok(StartupResult { engine, listener })
}

fn spawn_initial_reconciliation(engine: Arc<Engine>) {
    tokio::spawn(async move {
        reconcile_all(&engine).await;
    });
}

/// Hydrate initial state: run an integrity check for every world found on
/// disk, concurrently. Creates induced by the checks land in the already
/// running queue workers.
pub(crate) async fn reconcile_all(engine: &Engine) {
    let worlds = engine.store().worlds();
    let count = worlds.len();
    let checks = worlds.iter().map(|key| engine.check_integrity(key));
    futures_util::future::join_all(checks).await;
    info!("startup reconciliation finished for {count} world(s)");
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
