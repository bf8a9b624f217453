// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking-op executor.
//!
//! World operations shell out to the composer CLI and may take minutes;
//! they run on the blocking pool and report back into the state machine as
//! signals. Nothing that happens inside an op ever reaches a caller as an
//! error: a falsy result or a panic becomes the `fail` signal.

use crl_core::{Name, WorldKey, WorldSignal};
use std::sync::Arc;
use tracing::{error, info};

use super::Engine;
use crate::adapters::{OpsError, WorldOps};

/// Which composer verb to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpKind {
    Create,
    Start,
    Stop,
    Delete,
}

crl_core::simple_display! {
    OpKind {
        Create => "create",
        Start => "start",
        Stop => "stop",
        Delete => "delete",
    }
}

impl OpKind {
    fn call(
        self,
        ops: &dyn WorldOps,
        event: &Name,
        user: &Name,
    ) -> Result<bool, OpsError> {
        match self {
            OpKind::Create => ops.create(event, user),
            OpKind::Start => ops.start(event, user),
            OpKind::Stop => ops.stop(event, user),
            OpKind::Delete => ops.delete(event, user),
        }
    }
}

impl Engine {
    /// Run a blocking world op and translate its outcome into a signal:
    /// success → `ok`, reported failure or error or panic → `fail`.
    pub(crate) async fn run_op(
        &self,
        key: &WorldKey,
        op: OpKind,
        ok: Option<WorldSignal>,
        fail: Option<WorldSignal>,
    ) {
        let ops = Arc::clone(&self.ops);
        let worker_key = key.clone();
        let joined =
            tokio::task::spawn_blocking(move || op.call(&*ops, &worker_key.event, &worker_key.user))
                .await;

        let followup = match joined {
            Ok(Ok(true)) => {
                info!("event={} user={} {op} op succeeded", key.event, key.user);
                ok
            }
            Ok(Ok(false)) => {
                info!("event={} user={} {op} op reported failure", key.event, key.user);
                fail
            }
            Ok(Err(e)) => {
                error!("event={} user={} {op} op error: {e}", key.event, key.user);
                fail
            }
            Err(join_err) => {
                error!("event={} user={} {op} op panicked: {join_err}", key.event, key.user);
                fail
            }
        };

        if let Some(sig) = followup {
            self.signal(key, sig).await;
        }
    }
}
