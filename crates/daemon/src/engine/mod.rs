// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The world lifecycle engine.
//!
//! All state lives in one map of `(event, user) → WorldState`, mutated only
//! through the [`Engine::signal`] funnel. Holding one mutex across every
//! read-decide-commit step is the single serialization point that stands in
//! for the original cooperative scheduler; slow work never runs under it.
//!
//! ```text
//!                               state diagram of a world:
//!                       |
//!                       v           check
//!             /-> [[ notfound ]] --------------\
//!             |         |      ^                |
//!        fail |  create |  fail \               v
//!             |         v        ========= [ checking ] -----------\
//!             \--- [ creating ] /               ^                  |
//!                       |      /       check    |     check        |
//!                  down |     / down   --------/ \-------------    | up
//!                       |    /       /                         \   |
//!                       v   v       /                   up      \  v
//!                  [ stopped ] =====--> [ starting ] -------> [ running ]
//!                       ^ ^                   |                    |
//!                       |  \---------------- /                     |
//!                       |       fail                               |
//!                        \------------- [ stopping ] <-------------/
//!                           down / fail                   stop
//! ```

mod blocking;
mod health;
mod queues;

pub use queues::spawn_workers;
pub(crate) use queues::QueueItem;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::adapters::{Orchestrator, WorldOps};
use crate::store::Store;
use blocking::OpKind;
use crl_core::{WorldKey, WorldSignal, WorldState};

/// Receiving halves of the create- and stop-queues, to be handed to
/// [`spawn_workers`] before any traffic reaches the engine.
pub struct QueueReceivers {
    pub(crate) create: mpsc::UnboundedReceiver<QueueItem>,
    pub(crate) stop: mpsc::UnboundedReceiver<QueueItem>,
}

/// Shared context of the daemon: the state map, its collaborators, and the
/// sending halves of the serializer queues.
pub struct Engine {
    state: Mutex<HashMap<WorldKey, WorldState>>,
    store: Store,
    ops: Arc<dyn WorldOps>,
    orchestrator: Arc<dyn Orchestrator>,
    create_tx: mpsc::UnboundedSender<QueueItem>,
    stop_tx: mpsc::UnboundedSender<QueueItem>,
}

/// Work a committed transition leaves behind, performed after the state
/// lock is released.
enum Followup {
    None,
    /// Suspend until the queue worker fulfils the completion handle.
    AwaitHandle(oneshot::Receiver<()>),
    /// Reconcile against the orchestrator and signal the outcome.
    RunCheck,
    /// Start the world's stack (ok → `up`, fail → `fail`).
    RunStart,
    /// Best-effort delete of a half-created world, then fall to `notfound`.
    CleanupFailedCreate,
}

impl Engine {
    pub fn new(
        store: Store,
        ops: Arc<dyn WorldOps>,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> (Arc<Self>, QueueReceivers) {
        let (create_tx, create_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            state: Mutex::new(HashMap::new()),
            store,
            ops,
            orchestrator,
            create_tx,
            stop_tx,
        });
        (engine, QueueReceivers { create: create_rx, stop: stop_rx })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Current state of a world. A world never seen before is `NotFound`.
    pub fn state_of(&self, key: &WorldKey) -> WorldState {
        *self.state.lock().entry(key.clone()).or_insert(WorldState::NotFound)
    }

    /// Dispatch a signal through the transition table.
    ///
    /// This is the only mutation path for the state map. The decision and
    /// the state write happen atomically under the map lock; queue pushes
    /// are committed under the same lock so that `creating` always has its
    /// matching queue item. Side effects (blocking ops, reconciliation,
    /// waiting on a completion handle) run after the lock is released and
    /// may re-enter `signal`.
    pub async fn signal(&self, key: &WorldKey, sig: WorldSignal) {
        self.dispatch(key, sig).await;
    }

    fn dispatch<'a>(&'a self, key: &'a WorldKey, sig: WorldSignal) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let followup = self.transition(key, sig);
            match followup {
                Followup::None => {}
                Followup::AwaitHandle(done) => {
                    // The worker fulfils the handle exactly once; a dropped
                    // sender only means the worker is gone entirely.
                    let _ = done.await;
                }
                Followup::RunCheck => self.run_check(key).await,
                Followup::RunStart => {
                    self.run_op(key, OpKind::Start, Some(WorldSignal::Up), Some(WorldSignal::Fail))
                        .await;
                }
                Followup::CleanupFailedCreate => {
                    // Delete lingering files before admitting the world does
                    // not exist; the delete outcome feeds no signal.
                    self.run_op(key, OpKind::Delete, None, None).await;
                    self.set_state(key, WorldState::NotFound, sig);
                }
            }
        })
    }

    /// Consult the transition table and commit the new state.
    fn transition(&self, key: &WorldKey, sig: WorldSignal) -> Followup {
        use WorldSignal::*;
        use WorldState::*;

        let mut map = self.state.lock();
        let current = *map.entry(key.clone()).or_insert(NotFound);
        match (current, sig) {
            (NotFound, Create) => {
                Self::commit(&mut map, key, Creating, sig);
                let (done_tx, done_rx) = oneshot::channel();
                match self.create_tx.send((key.clone(), done_tx)) {
                    Ok(()) => Followup::AwaitHandle(done_rx),
                    Err(_) => {
                        error!("event={} user={} create worker is gone", key.event, key.user);
                        Followup::None
                    }
                }
            }
            (NotFound, Check) | (Stopped, Check) | (Running, Check) => {
                Self::commit(&mut map, key, Checking, sig);
                Followup::RunCheck
            }

            (Creating, Down) => {
                Self::commit(&mut map, key, Stopped, sig);
                Followup::None
            }
            (Creating, Fail) => Followup::CleanupFailedCreate,

            (Checking, Up) => {
                Self::commit(&mut map, key, Running, sig);
                Followup::None
            }
            (Checking, Down) => {
                Self::commit(&mut map, key, Stopped, sig);
                Followup::None
            }
            (Checking, Fail) => {
                Self::commit(&mut map, key, NotFound, sig);
                Followup::None
            }

            (Stopped, Start) => {
                Self::commit(&mut map, key, Starting, sig);
                Followup::RunStart
            }

            (Starting, Up) => {
                Self::commit(&mut map, key, Running, sig);
                Followup::None
            }
            (Starting, Fail) => {
                Self::commit(&mut map, key, Stopped, sig);
                Followup::None
            }

            (Running, Stop) => {
                Self::commit(&mut map, key, Stopping, sig);
                let (done_tx, done_rx) = oneshot::channel();
                match self.stop_tx.send((key.clone(), done_tx)) {
                    Ok(()) => Followup::AwaitHandle(done_rx),
                    Err(_) => {
                        error!("event={} user={} stop worker is gone", key.event, key.user);
                        Followup::None
                    }
                }
            }

            (Stopping, Down) | (Stopping, Fail) => {
                Self::commit(&mut map, key, Stopped, sig);
                Followup::None
            }

            // No matching transition: keep the state and still log the line.
            (state, _) => {
                Self::commit(&mut map, key, state, sig);
                Followup::None
            }
        }
    }

    /// Write a new state while already holding the map lock.
    fn commit(
        map: &mut HashMap<WorldKey, WorldState>,
        key: &WorldKey,
        new_state: WorldState,
        sig: WorldSignal,
    ) {
        let old_state = map.insert(key.clone(), new_state).unwrap_or(WorldState::NotFound);
        log_transition(key, old_state, new_state, sig);
    }

    /// Write a new state from outside the table match (deferred commits).
    fn set_state(&self, key: &WorldKey, new_state: WorldState, sig: WorldSignal) {
        let mut map = self.state.lock();
        Self::commit(&mut map, key, new_state, sig);
    }

    /// Seed a state directly, bypassing the funnel.
    #[cfg(test)]
    pub(crate) fn force_state(&self, key: &WorldKey, state: WorldState) {
        self.state.lock().insert(key.clone(), state);
    }

    /// Align the state machine with the on-disk ground truth.
    ///
    /// The peer config is the persistent marker that a world has been
    /// created; when it disagrees with the tracked state in either
    /// direction, a `check` signal reconciles against the orchestrator.
    pub async fn check_integrity(&self, key: &WorldKey) {
        let current = self.state_of(key);
        let has_config = self.store.has_peer_config(key);
        debug!(
            "event={} user={} state={current} peer_config={has_config}",
            key.event, key.user
        );
        if has_config && current == WorldState::NotFound {
            self.signal(key, WorldSignal::Check).await;
        } else if !has_config && current != WorldState::NotFound {
            warn!(
                "event={} user={} tracked as {current} but peer config is missing",
                key.event, key.user
            );
            self.signal(key, WorldSignal::Check).await;
        }
    }
}

/// The canonical transition log line. Post-hoc auditing depends on this
/// exact format.
fn log_transition(key: &WorldKey, old: WorldState, new: WorldState, sig: WorldSignal) {
    info!("event={} user={} {old}->{new} ({sig})", key.event, key.user);
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
