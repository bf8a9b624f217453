// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end specs for the port allocation service.

use crate::prelude::*;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::process::{Child, Command, Stdio};
use tempfile::TempDir;

struct Portd {
    // NOTE(lifetime): holds the socket directory until the service dies
    #[allow(dead_code)]
    dir: TempDir,
    socket: std::path::PathBuf,
    child: Child,
}

impl Portd {
    fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("portd.sock");
        let child = Command::new(target_bin("portd"))
            .arg("--socket-path")
            .arg(&socket)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let probe = socket.clone();
        assert!(
            wait_for(SPEC_WAIT_MAX, || UnixStream::connect(&probe).is_ok()),
            "portd did not start listening"
        );
        Self { dir, socket, child }
    }

    fn get(&self, path_and_query: &str) -> (u16, String) {
        let mut stream = UnixStream::connect(&self.socket).unwrap();
        stream.set_read_timeout(Some(SPEC_WAIT_MAX)).unwrap();
        write!(
            stream,
            "GET {path_and_query} HTTP/1.1\r\nHost: portd\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).unwrap();
        parse_response(&raw)
    }
}

impl Drop for Portd {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn allocates_a_port_outside_the_blacklist() {
    let portd = Portd::start();

    let (status, body) = portd.get("/?blacklist=1&blacklist=2&blacklist=3");
    assert_eq!(status, 200);
    let port: u32 = body.trim().parse().unwrap();
    assert!(port > 0);
    assert!(![1, 2, 3].contains(&port));
}

#[test]
fn allocates_without_a_blacklist() {
    let portd = Portd::start();

    let (status, body) = portd.get("/");
    assert_eq!(status, 200);
    assert!(body.trim().parse::<u32>().unwrap() > 0);
}

#[test]
fn allocated_ports_are_immediately_bindable() {
    let portd = Portd::start();

    let (_, body) = portd.get("/");
    let port: u16 = body.trim().parse().unwrap();
    std::net::TcpListener::bind(("127.0.0.1", port)).unwrap();
}
