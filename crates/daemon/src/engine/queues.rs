// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serializer queues for create and stop.
//!
//! Each queue has exactly one consumer, so at most one create and one stop
//! run at any moment across all worlds. Creates are serialized because port
//! allocation during composition is only race-free when no second create is
//! in flight; stops are serialized to bound peak orchestrator load.
//!
//! The completion handle carried by each item is fulfilled after the op
//! finishes, whether or not the enqueuing request is still listening.

use std::sync::Arc;

use crl_core::{WorldKey, WorldSignal};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use super::blocking::OpKind;
use super::{Engine, QueueReceivers};

/// A queued world plus the handle its requester is waiting on.
pub(crate) type QueueItem = (WorldKey, oneshot::Sender<()>);

/// Spawn the single-consumer workers for both queues. Must happen before
/// the HTTP listener accepts traffic; an enqueued create with no consumer
/// would suspend its requester forever.
pub fn spawn_workers(engine: Arc<Engine>, queues: QueueReceivers) {
    tokio::spawn(worker_create(Arc::clone(&engine), queues.create));
    tokio::spawn(worker_stop(engine, queues.stop));
}

/// Worker in charge of creating worlds in FIFO order.
async fn worker_create(engine: Arc<Engine>, mut queue: mpsc::UnboundedReceiver<QueueItem>) {
    info!("[worker_create] waiting for work...");

    while let Some((key, done)) = queue.recv().await {
        info!("[worker_create] starting processing event={} user={}", key.event, key.user);
        engine
            .run_op(&key, OpKind::Create, Some(WorldSignal::Down), Some(WorldSignal::Fail))
            .await;
        // The requester may have disconnected; the op ran regardless.
        let _ = done.send(());
        info!("[worker_create] done processing event={} user={}", key.event, key.user);
    }
}

/// Worker in charge of stopping worlds in FIFO order.
async fn worker_stop(engine: Arc<Engine>, mut queue: mpsc::UnboundedReceiver<QueueItem>) {
    info!("[worker_stop] waiting for work...");

    while let Some((key, done)) = queue.recv().await {
        info!("[worker_stop] starting processing event={} user={}", key.event, key.user);
        engine
            .run_op(&key, OpKind::Stop, Some(WorldSignal::Down), Some(WorldSignal::Fail))
            .await;
        let _ = done.send(());
        info!("[worker_stop] done processing event={} user={}", key.event, key.user);
    }
}
