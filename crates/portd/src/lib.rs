// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! crl-portd: the port allocation service.
//!
//! One endpoint, no state. Each request binds a TCP socket to port 0 so the
//! kernel hands out an ephemeral port, retrying until the port is outside
//! the caller's blacklist. Kernel assignment keeps concurrent allocations
//! from colliding with each other; the blacklist keeps them from colliding
//! with ports already recorded for other worlds but not yet bound.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::HashSet;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::error;

/// Build the allocator's router: `GET /?blacklist=<n>&blacklist=<n>…`.
pub fn router() -> Router {
    Router::new().route("/", get(allocate))
}

/// Plain-text port number outside the blacklist. Repeated `blacklist` keys
/// accumulate; values that are not port numbers are ignored.
async fn allocate(Query(params): Query<Vec<(String, String)>>) -> Response {
    let blacklist: HashSet<u16> = params
        .iter()
        .filter(|(k, _)| k == "blacklist")
        .filter_map(|(_, v)| v.parse().ok())
        .collect();

    match free_port(&blacklist).await {
        Ok(port) => port.to_string().into_response(),
        Err(e) => {
            error!("port allocation failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bind to port 0 on all interfaces until the kernel-assigned port is not
/// blacklisted, then release the socket and return the port.
pub async fn free_port(blacklist: &HashSet<u16>) -> std::io::Result<u16> {
    loop {
        let listener = TcpListener::bind(("0.0.0.0", 0)).await?;
        let port = listener.local_addr()?.port();
        if !blacklist.contains(&port) {
            return Ok(port);
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
