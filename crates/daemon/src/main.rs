// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! crld — the world lifecycle daemon.

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crl_daemon::lifecycle::{startup, Config};
use crl_daemon::{env, listener};

#[derive(Debug, Parser)]
#[command(name = "crld", about = "Cyber Range Lite world lifecycle daemon")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    listen_addr: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Base path where the config (blueprints/stored-events/events) is stored
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    let config = Config {
        listen_addr: args.listen_addr,
        port: args.port,
        config_dir: args.config_dir,
    };

    match run(&config).await {
        Ok(()) => {
            info!("crld shut down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("crld failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = startup(config).await?;

    let shutdown = CancellationToken::new();
    let signal_guard = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            signal_guard.cancel();
        }
    });

    axum::serve(result.listener, listener::router(result.engine))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env::log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
