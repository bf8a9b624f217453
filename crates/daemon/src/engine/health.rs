// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health reconciliation against the orchestrator.
//!
//! A world's health is decided by its non-VPN services: the VPN gateway is
//! infrastructure and stays up even when every challenge service has died,
//! so counting it would mask a dead world.

use std::collections::BTreeMap;
use std::sync::Arc;

use crl_core::{world_stack_name, WorldHealth, WorldKey, WorldSignal};
use tracing::{debug, error};

use super::Engine;
use crate::adapters::{AdapterError, Orchestrator};

/// Service short-name of the VPN gateway, excluded from health.
const VPN_SERVICE: &str = "wireguard";

/// Name of the orchestrator's ingress network, excluded from network maps.
const INGRESS_NETWORK: &str = "ingress";

impl Engine {
    /// Resolve the `checking` state: probe the orchestrator and feed the
    /// outcome back as a terminal signal.
    pub(crate) async fn run_check(&self, key: &WorldKey) {
        match self.world_health(key).await {
            Some(WorldHealth::Down) => self.signal(key, WorldSignal::Down).await,
            Some(_) => self.signal(key, WorldSignal::Up).await,
            None => self.signal(key, WorldSignal::Fail).await,
        }
    }

    /// Health of a world's non-VPN services; `None` when the orchestrator
    /// could not be queried at all.
    pub async fn world_health(&self, key: &WorldKey) -> Option<WorldHealth> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let stack = world_stack_name(key);
        let joined =
            tokio::task::spawn_blocking(move || orchestrator.list_stack_tasks(&stack)).await;

        let tasks = match joined {
            Ok(Ok(tasks)) => tasks,
            Ok(Err(e)) => {
                debug!("event={} user={} health probe failed: {e}", key.event, key.user);
                return None;
            }
            Err(join_err) => {
                error!("event={} user={} health probe panicked: {join_err}", key.event, key.user);
                return None;
            }
        };

        let services: Vec<bool> =
            tasks.iter().filter(|task| task.service != VPN_SERVICE).map(|task| task.up).collect();
        debug!("event={} user={} services_up={services:?}", key.event, key.user);

        Some(if services.is_empty() {
            WorldHealth::Down
        } else if services.iter().all(|up| *up) {
            WorldHealth::Up
        } else if services.iter().any(|up| *up) {
            WorldHealth::Degraded
        } else {
            WorldHealth::Down
        })
    }

    /// The VPN service's virtual IP per attached network, keyed by network
    /// name with the stack prefix stripped and the ingress network left
    /// out. `None` when the service is absent or the map comes up empty.
    pub async fn wireguard_network(&self, key: &WorldKey) -> Option<BTreeMap<String, String>> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let stack = world_stack_name(key);
        type NetworkMap = BTreeMap<String, String>;
        let joined = tokio::task::spawn_blocking(move || -> Result<Option<NetworkMap>, AdapterError> {
            let services = orchestrator.list_services(&format!("{stack}_{VPN_SERVICE}"))?;
            let [service] = services.as_slice() else {
                return Ok(None);
            };
            let vips = orchestrator.service_vips(&service.id)?;

            let prefix = format!("{stack}_");
            let mut networks = BTreeMap::new();
            for vip in vips {
                if vip.network == INGRESS_NETWORK {
                    continue;
                }
                let name = vip.network.strip_prefix(&prefix).unwrap_or(&vip.network).to_string();
                let ip = vip.addr.split('/').next().unwrap_or(&vip.addr).to_string();
                networks.insert(name, ip);
            }
            Ok(Some(networks))
        })
        .await;

        match joined {
            Ok(Ok(Some(networks))) if !networks.is_empty() => Some(networks),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                debug!("event={} user={} network lookup failed: {e}", key.event, key.user);
                None
            }
            Err(join_err) => {
                error!(
                    "event={} user={} network lookup panicked: {join_err}",
                    key.event, key.user
                );
                None
            }
        }
    }
}
