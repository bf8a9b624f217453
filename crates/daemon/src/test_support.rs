// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted collaborators and an engine harness for unit tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::adapters::{
    AdapterError, OpsError, Orchestrator, ServiceRecord, TaskRecord, WorldOps,
};
use crate::engine::{spawn_workers, Engine};
use crate::store::Store;
use crl_core::{Name, WorldKey};

pub(crate) fn key(event: &str, user: &str) -> WorldKey {
    WorldKey::new(Name::parse(event).unwrap(), Name::parse(user).unwrap())
}

pub(crate) const PEER_CONFIG: &str = "[Interface]\nPrivateKey = test\n";

/// Scripted world ops: configurable per-verb results, optional on-disk side
/// effects mirroring the composer CLI, and concurrency accounting.
pub(crate) struct FakeOps {
    results: Mutex<HashMap<&'static str, bool>>,
    panics: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    /// When set, `create` writes the world's peer config under this root
    /// and `delete` removes the world directory.
    store_root: Option<PathBuf>,
}

impl FakeOps {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::build(None, Duration::ZERO))
    }

    /// Ops that materialize worlds under `root`, like the real composer.
    pub fn with_store(root: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::build(Some(root.into()), Duration::ZERO))
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(None, delay))
    }

    fn build(store_root: Option<PathBuf>, delay: Duration) -> Self {
        Self {
            results: Mutex::new(HashMap::new()),
            panics: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            store_root,
        }
    }

    pub fn fail_on(self: &Arc<Self>, verb: &'static str) -> Arc<Self> {
        self.results.lock().insert(verb, false);
        Arc::clone(self)
    }

    pub fn panic_on(self: &Arc<Self>, verb: &'static str) -> Arc<Self> {
        self.panics.lock().insert(verb);
        Arc::clone(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn run(&self, verb: &'static str, event: &Name, user: &Name) -> Result<bool, OpsError> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.calls.lock().push(format!("{verb} {event}/{user}"));
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panics.lock().contains(verb) {
            panic!("scripted panic in {verb}");
        }

        let ok = self.results.lock().get(verb).copied().unwrap_or(true);
        if ok {
            if let Some(root) = &self.store_root {
                let world = root.join("Events").join(event.as_str()).join(user.as_str());
                match verb {
                    "create" => {
                        let peer = world.join("peer");
                        std::fs::create_dir_all(&peer).unwrap();
                        std::fs::write(
                            peer.join(format!("peer_{user}.conf")),
                            PEER_CONFIG,
                        )
                        .unwrap();
                    }
                    "delete" => {
                        let _ = std::fs::remove_dir_all(&world);
                    }
                    _ => {}
                }
            }
        }
        Ok(ok)
    }
}

impl WorldOps for FakeOps {
    fn create(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("create", event, user)
    }

    fn start(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("start", event, user)
    }

    fn stop(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("stop", event, user)
    }

    fn delete(&self, event: &Name, user: &Name) -> Result<bool, OpsError> {
        self.run("delete", event, user)
    }
}

/// Scripted orchestrator: canned task lists, service summaries and inspect
/// descriptors. `tasks: None` models an unreachable orchestrator.
pub(crate) struct FakeOrchestrator {
    tasks: Mutex<Option<Vec<TaskRecord>>>,
    services: Mutex<Vec<ServiceRecord>>,
    objects: Mutex<HashMap<String, Value>>,
}

impl FakeOrchestrator {
    /// No stacks deployed; every listing is empty.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            tasks: Mutex::new(Some(Vec::new())),
            services: Mutex::new(Vec::new()),
            objects: Mutex::new(HashMap::new()),
        })
    }

    /// Orchestrator that cannot be queried at all.
    pub fn unreachable() -> Arc<Self> {
        let fake = Self::empty();
        *fake.tasks.lock() = None;
        fake
    }

    pub fn with_tasks(tasks: Vec<TaskRecord>) -> Arc<Self> {
        let fake = Self::empty();
        *fake.tasks.lock() = Some(tasks);
        fake
    }

    pub fn set_services(self: &Arc<Self>, services: Vec<ServiceRecord>) -> Arc<Self> {
        *self.services.lock() = services;
        Arc::clone(self)
    }

    pub fn set_object(self: &Arc<Self>, id: &str, descriptor: Value) -> Arc<Self> {
        self.objects.lock().insert(id.to_string(), descriptor);
        Arc::clone(self)
    }

    fn fail() -> AdapterError {
        AdapterError::Spawn {
            command: "scripted".to_string(),
            source: std::io::Error::other("orchestrator unreachable"),
        }
    }
}

impl Orchestrator for FakeOrchestrator {
    fn list_stack_tasks(&self, _stack: &str) -> Result<Vec<TaskRecord>, AdapterError> {
        self.tasks.lock().clone().ok_or_else(Self::fail)
    }

    fn inspect(&self, id_or_name: &str) -> Result<Option<Value>, AdapterError> {
        Ok(self.objects.lock().get(id_or_name).cloned())
    }

    fn list_services(&self, name_filter: &str) -> Result<Vec<ServiceRecord>, AdapterError> {
        Ok(self
            .services
            .lock()
            .iter()
            .filter(|service| service.name.contains(name_filter))
            .cloned()
            .collect())
    }
}

/// A running task record with the given bare service name.
pub(crate) fn task(service: &str, up: bool) -> TaskRecord {
    TaskRecord {
        service: service.to_string(),
        id: format!("task-{service}"),
        desired_state: "Running".to_string(),
        current_state: if up { "Running 1 minute ago" } else { "Failed 1 minute ago" }
            .to_string(),
        error: String::new(),
        up,
    }
}

/// Engine wired to scripted collaborators over a temp config root, with
/// both queue workers running.
pub(crate) struct TestEngine {
    pub engine: Arc<Engine>,
    pub ops: Arc<FakeOps>,
    #[allow(dead_code)]
    pub orchestrator: Arc<FakeOrchestrator>,
    // NOTE(lifetime): held so the config root outlives the engine
    #[allow(dead_code)]
    pub temp: tempfile::TempDir,
}

impl TestEngine {
    /// Must be called from within a tokio runtime (the workers are spawned).
    pub fn with(ops: Arc<FakeOps>, orchestrator: Arc<FakeOrchestrator>) -> Self {
        Self::with_root(ops, orchestrator, tempfile::tempdir().unwrap())
    }

    /// Engine whose scripted composer materializes worlds in the engine's
    /// own config root.
    pub fn with_composer(orchestrator: Arc<FakeOrchestrator>) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let ops = FakeOps::with_store(temp.path());
        Self::with_root(ops, orchestrator, temp)
    }

    fn with_root(
        ops: Arc<FakeOps>,
        orchestrator: Arc<FakeOrchestrator>,
        temp: tempfile::TempDir,
    ) -> Self {
        let store = Store::new(temp.path());
        let (engine, queues) = Engine::new(
            store,
            Arc::clone(&ops) as Arc<dyn WorldOps>,
            Arc::clone(&orchestrator) as Arc<dyn Orchestrator>,
        );
        spawn_workers(Arc::clone(&engine), queues);
        Self { engine, ops, orchestrator, temp }
    }

    pub fn write_peer_config(&self, key: &WorldKey) {
        let path = self.engine.store().peer_config_path(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, PEER_CONFIG).unwrap();
    }
}
