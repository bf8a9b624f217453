// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The REST control surface.
//!
//! Every handler follows the same order: validate the path parameters
//! (415 on a bad name), run the integrity check, fire the signals the
//! endpoint calls for, then build the response from the now-current state
//! and the config store. Lifecycle failures never surface as HTTP errors;
//! clients observe them by polling status.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::error;

use crate::engine::Engine;
use crl_core::{Name, WorldKey, WorldSignal, WorldState};

/// Build the daemon's router.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/{event}/create/{user}", post(world_create))
        .route("/{event}/reset/{user}", post(world_reset))
        .route("/{event}/status/{user}", get(world_status))
        .route("/{event}/config/{user}", get(world_config))
        .route("/{event}/wireguard/{user}/config", get(world_config))
        .route("/{event}/wireguard/{user}/network", get(wireguard_network))
        .with_state(engine)
}

/// Status body: the state name, plus health while running.
#[derive(Debug, Serialize)]
struct StatusBody {
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<String>,
}

/// Validate both path parameters; a failure is 415, not 400, so that bad
/// names are distinguishable from missing worlds.
fn parse_key(event: &str, user: &str) -> Result<WorldKey, StatusCode> {
    match (Name::parse(event), Name::parse(user)) {
        (Ok(event), Ok(user)) => Ok(WorldKey::new(event, user)),
        _ => Err(StatusCode::UNSUPPORTED_MEDIA_TYPE),
    }
}

async fn world_create(
    State(engine): State<Arc<Engine>>,
    Path((event, user)): Path<(String, String)>,
) -> Response {
    let key = match parse_key(&event, &user) {
        Ok(key) => key,
        Err(code) => return code.into_response(),
    };
    engine.check_integrity(&key).await;

    if engine.state_of(&key) == WorldState::NotFound {
        engine.signal(&key, WorldSignal::Create).await;
    }
    if engine.state_of(&key) == WorldState::Stopped {
        engine.signal(&key, WorldSignal::Start).await;
    }

    peer_config_response(&engine, &key)
}

async fn world_reset(
    State(engine): State<Arc<Engine>>,
    Path((event, user)): Path<(String, String)>,
) -> Response {
    let key = match parse_key(&event, &user) {
        Ok(key) => key,
        Err(code) => return code.into_response(),
    };
    engine.check_integrity(&key).await;

    if engine.state_of(&key) == WorldState::Running {
        engine.signal(&key, WorldSignal::Stop).await;
    }
    if engine.state_of(&key) == WorldState::Stopped {
        engine.signal(&key, WorldSignal::Start).await;
    }

    status_response(&engine, &key).await
}

async fn world_status(
    State(engine): State<Arc<Engine>>,
    Path((event, user)): Path<(String, String)>,
) -> Response {
    let key = match parse_key(&event, &user) {
        Ok(key) => key,
        Err(code) => return code.into_response(),
    };
    engine.check_integrity(&key).await;

    status_response(&engine, &key).await
}

async fn world_config(
    State(engine): State<Arc<Engine>>,
    Path((event, user)): Path<(String, String)>,
) -> Response {
    let key = match parse_key(&event, &user) {
        Ok(key) => key,
        Err(code) => return code.into_response(),
    };
    engine.check_integrity(&key).await;

    peer_config_response(&engine, &key)
}

async fn wireguard_network(
    State(engine): State<Arc<Engine>>,
    Path((event, user)): Path<(String, String)>,
) -> Response {
    let key = match parse_key(&event, &user) {
        Ok(key) => key,
        Err(code) => return code.into_response(),
    };
    engine.check_integrity(&key).await;

    match engine.wireguard_network(&key).await {
        Some(networks) => Json(networks).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// State-plus-health body from whatever is current at reply time.
async fn status_response(engine: &Engine, key: &WorldKey) -> Response {
    let state = engine.state_of(key);
    let health = if state == WorldState::Running {
        engine.world_health(key).await.map(|health| health.to_string())
    } else {
        None
    };
    Json(StatusBody { state: state.to_string(), health }).into_response()
}

/// Peer config text, 404 when the world has none, 500 when it exists but
/// cannot be read.
fn peer_config_response(engine: &Engine, key: &WorldKey) -> Response {
    match engine.store().read_peer_config(key) {
        Ok(Some(config)) => config.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("event={} user={} failed to read peer config: {e}", key.event, key.user);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
