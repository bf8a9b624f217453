// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Log severity threshold (default `info`). `RUST_LOG` takes precedence
/// when set, following the usual env-filter convention.
pub fn log_level() -> String {
    std::env::var("CRLD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Path of the world-composer CLI used for create/start/stop/delete.
pub fn ops_bin() -> PathBuf {
    std::env::var("CRLD_OPS_BIN").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("crl"))
}

/// Path of the container-orchestrator CLI.
pub fn docker_bin() -> PathBuf {
    std::env::var("CRLD_DOCKER_BIN").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("docker"))
}
