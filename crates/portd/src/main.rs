// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! portd — the port allocation service, served over a local domain socket.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tokio::net::UnixListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "portd", about = "Free TCP port allocator")]
struct Args {
    /// Path of the Unix domain socket to serve on
    #[arg(long, default_value = "/var/run/portd/portd.sock")]
    socket_path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args.socket_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("portd failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(socket_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // A stale socket file from a previous run blocks the bind.
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }

    let listener = UnixListener::bind(socket_path)?;
    info!("portd listening on {}", socket_path.display());
    axum::serve(listener, crl_portd::router()).await?;
    Ok(())
}
