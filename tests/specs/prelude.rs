// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the end-to-end specs.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

pub const SPEC_WAIT_MAX: Duration = Duration::from_secs(10);

/// Path of a workspace binary next to the test executable.
pub fn target_bin(name: &str) -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // deps/
    path.pop(); // debug/
    path.join(name)
}

/// Poll `probe` until it returns true or the deadline passes.
pub fn wait_for(max: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + max;
    while Instant::now() < deadline {
        if probe() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    false
}

/// Stand-in composer CLI. Marker files in the config root script its
/// behavior: `fail_create` makes create exit non-zero, `slow_create` makes
/// it sleep before writing the world.
const STUB_COMPOSER: &str = r#"#!/bin/sh
verb="$1"; shift
if [ "$1" = "--config-dir" ]; then dir="$2"; shift 2; fi
event="$1"; user="$2"
world="$dir/Events/$event/$user"
case "$verb" in
  create)
    [ -e "$dir/fail_create" ] && exit 1
    [ -e "$dir/slow_create" ] && sleep 3
    mkdir -p "$world/peer"
    printf '[Interface]\nPrivateKey = stub\n' > "$world/peer/peer_$user.conf"
    ;;
  delete) rm -rf "$world" ;;
  start|stop) ;;
  *) exit 1 ;;
esac
exit 0
"#;

pub const STUB_PEER_CONFIG: &str = "[Interface]\nPrivateKey = stub\n";

/// A crld instance over a temp config root.
pub struct Range {
    pub root: TempDir,
    pub port: u16,
    daemon: Child,
}

impl Range {
    pub fn start() -> Self {
        let root = TempDir::new().unwrap();

        let stub = root.path().join("bin").join("crl");
        std::fs::create_dir_all(stub.parent().unwrap()).unwrap();
        std::fs::write(&stub, STUB_COMPOSER).unwrap();
        let mut perms = std::fs::metadata(&stub).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&stub, perms).unwrap();

        let port = pick_free_port();
        let daemon = Command::new(target_bin("crld"))
            .args(["--listen-addr", "127.0.0.1"])
            .args(["--port", &port.to_string()])
            .arg("--config-dir")
            .arg(root.path())
            .env("CRLD_OPS_BIN", &stub)
            .env("CRLD_DOCKER_BIN", "/nonexistent/orchestrator")
            .env("CRLD_LOG_LEVEL", "debug")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let range = Self { root, port, daemon };
        assert!(
            wait_for(SPEC_WAIT_MAX, || TcpStream::connect(("127.0.0.1", range.port)).is_ok()),
            "crld did not start listening"
        );
        range
    }

    /// Drop a marker file the stub composer reacts to.
    pub fn marker(&self, name: &str) {
        std::fs::write(self.root.path().join(name), "").unwrap();
    }

    /// Seed a world directory with a peer config, as if created earlier.
    pub fn seed_world(&self, event: &str, user: &str) {
        let peer = self.root.path().join("Events").join(event).join(user).join("peer");
        std::fs::create_dir_all(&peer).unwrap();
        std::fs::write(peer.join(format!("peer_{user}.conf")), STUB_PEER_CONFIG).unwrap();
    }

    pub fn get(&self, path: &str) -> (u16, String) {
        self.request("GET", path)
    }

    pub fn post(&self, path: &str) -> (u16, String) {
        self.request("POST", path)
    }

    fn request(&self, method: &str, path: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).unwrap();
        stream.set_read_timeout(Some(SPEC_WAIT_MAX)).unwrap();
        write!(
            stream,
            "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        parse_response(&raw)
    }
}

impl Drop for Range {
    fn drop(&mut self) {
        let _ = self.daemon.kill();
        let _ = self.daemon.wait();
    }
}

/// Split a raw HTTP/1.1 response into status code and body.
pub fn parse_response(raw: &str) -> (u16, String) {
    let status: u16 = raw
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("malformed response: {raw:?}"));
    let body = raw.split_once("\r\n\r\n").map(|(_, body)| body.to_string()).unwrap_or_default();
    (status, body)
}

/// Ask the kernel for a free TCP port.
fn pick_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}
