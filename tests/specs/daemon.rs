// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end specs for the world lifecycle daemon.

use crate::prelude::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[test]
fn fresh_create_returns_peer_config_and_world_runs() {
    let range = Range::start();

    let (status, body) = range.post("/demo/create/alice");
    assert_eq!(status, 200);
    assert_eq!(body, STUB_PEER_CONFIG);

    let (status, body) = range.get("/demo/status/alice");
    assert_eq!(status, 200);
    // Health is omitted: the orchestrator is unreachable in specs.
    assert_eq!(json_body(&body), json!({"state": "running"}));
}

#[test]
fn status_of_missing_world_is_notfound() {
    let range = Range::start();

    let (status, body) = range.get("/demo/status/bob1");
    assert_eq!(status, 200);
    assert_eq!(json_body(&body), json!({"state": "notfound"}));
}

#[test]
fn create_is_idempotent_and_returns_the_same_config() {
    let range = Range::start();

    let (_, first) = range.post("/demo/create/alice");
    let (status, second) = range.post("/demo/create/alice");
    assert_eq!(status, 200);
    assert_eq!(first, second);

    let (_, body) = range.get("/demo/status/alice");
    assert_eq!(json_body(&body)["state"], "running");
}

#[test]
fn reset_returns_a_status_body() {
    let range = Range::start();
    range.post("/demo/create/alice");

    let (status, body) = range.post("/demo/reset/alice");
    assert_eq!(status, 200);
    assert_eq!(json_body(&body), json!({"state": "running"}));
}

#[test]
fn invalid_names_are_rejected_with_415() {
    let range = Range::start();

    for path in [
        "/abc/status/alice",
        "/demo/status/ab",
        "/demo/status/a23456789012345678901234567890123",
        "/de-mo/status/alice",
        "/demo/create/al_ce",
    ] {
        let (status, _) = range.get(path);
        assert_eq!(status, 415, "expected 415 for {path}");
    }
}

#[test]
fn uppercase_names_fold_to_lowercase() {
    let range = Range::start();

    let (status, _) = range.post("/Demo/create/Alice");
    assert_eq!(status, 200);

    let (_, body) = range.get("/demo/status/alice");
    assert_eq!(json_body(&body)["state"], "running");
}

#[test]
fn config_endpoints_serve_the_peer_config() {
    let range = Range::start();
    range.post("/demo/create/alice");

    let (status, body) = range.get("/demo/config/alice");
    assert_eq!(status, 200);
    assert_eq!(body, STUB_PEER_CONFIG);

    let (status, body) = range.get("/demo/wireguard/alice/config");
    assert_eq!(status, 200);
    assert_eq!(body, STUB_PEER_CONFIG);
}

#[test]
fn config_of_missing_world_is_404() {
    let range = Range::start();

    let (status, _) = range.get("/demo/config/alice");
    assert_eq!(status, 404);
}

#[test]
fn network_without_orchestrator_is_404() {
    let range = Range::start();
    range.post("/demo/create/alice");

    let (status, _) = range.get("/demo/wireguard/alice/network");
    assert_eq!(status, 404);
}

#[test]
fn failed_create_leaves_no_world_behind() {
    let range = Range::start();
    range.marker("fail_create");

    let (status, _) = range.post("/demo/create/alice");
    assert_eq!(status, 404);

    let (_, body) = range.get("/demo/status/alice");
    assert_eq!(json_body(&body), json!({"state": "notfound"}));
}

#[test]
fn seeded_world_serves_its_config_again() {
    let range = Range::start();
    range.seed_world("demo", "alice");

    // With the orchestrator unreachable the integrity check tears the
    // stale entry down to notfound, and create rebuilds the world.
    let (status, body) = range.post("/demo/create/alice");
    assert_eq!(status, 200);
    assert_eq!(body, STUB_PEER_CONFIG);

    let (_, body) = range.get("/demo/status/alice");
    assert_eq!(json_body(&body)["state"], "running");
}

#[test]
fn slow_create_does_not_block_unrelated_requests() {
    let range = Range::start();
    range.marker("slow_create");

    let port = range.port;
    let create = std::thread::spawn(move || {
        let mut stream = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        use std::io::{Read, Write};
        write!(
            stream,
            "POST /demo/create/user1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        parse_response(&raw)
    });

    // Give the create a moment to enter its queue worker.
    std::thread::sleep(Duration::from_millis(300));

    let started = Instant::now();
    let (status, body) = range.get("/demo/status/user2");
    assert!(started.elapsed() < Duration::from_secs(2), "status must not wait on the create");
    assert_eq!(status, 200);
    assert_eq!(json_body(&body), json!({"state": "notfound"}));

    let (status, _) = create.join().unwrap();
    assert_eq!(status, 200);
}
