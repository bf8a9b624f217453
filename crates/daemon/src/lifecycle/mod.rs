// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: configuration, startup, shutdown.

mod startup;
pub use startup::{startup, StartupResult};

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Daemon configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the REST surface listens on.
    pub listen_addr: IpAddr,
    /// Port the REST surface listens on.
    pub port: u16,
    /// Base path where events and worlds are stored.
    pub config_dir: PathBuf,
}

impl Config {
    pub fn listen_socket(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {0}: {1}")]
    BindFailed(SocketAddr, #[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
