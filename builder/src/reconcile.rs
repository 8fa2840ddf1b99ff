/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Result;
use async_trait::async_trait;
use slipway_core::cache::ProgressCache;
use slipway_core::consts::APP_CONTAINER_PREFIX;
use slipway_core::runtime::DockerRuntime;
use slipway_core::types::ServerState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ManagedContainer {
    pub name: String,
    pub running: bool,
}

/// Container-state operations reconciliation performs, behind a seam so
/// tests can drive a fake runtime with controllable container and network
/// state.
#[async_trait]
pub trait ContainerState {
    /// Persistent containers carrying the orchestrator's name prefix,
    /// including stopped ones.
    async fn managed_containers(&self) -> Result<Vec<ManagedContainer>>;
    /// Network name to network id for every network the container is
    /// attached to.
    async fn attached_networks(&self, container: &str) -> Result<HashMap<String, String>>;
    /// Look up the internal network, creating it when missing; returns its
    /// current id.
    async fn ensure_network(&self, network: &str) -> Result<String>;
    async fn disconnect(&self, network: &str, container: &str) -> Result<()>;
    async fn connect(&self, network: &str, container: &str) -> Result<()>;
    async fn start(&self, container: &str) -> Result<()>;
}

#[async_trait]
impl ContainerState for DockerRuntime {
    async fn managed_containers(&self) -> Result<Vec<ManagedContainer>> {
        let containers = self.list_app_containers().await?;

        Ok(containers
            .into_iter()
            .filter_map(|summary| {
                let name = summary
                    .names
                    .as_ref()
                    .and_then(|names| names.first())
                    .map(|name| name.trim_start_matches('/').to_string())?;

                // The daemon filter matches substrings, so re-check the prefix.
                if !name.starts_with(APP_CONTAINER_PREFIX) {
                    return None;
                }

                let running = summary.state.as_deref() == Some("running");
                Some(ManagedContainer { name, running })
            })
            .collect())
    }

    async fn attached_networks(&self, container: &str) -> Result<HashMap<String, String>> {
        self.container_networks(container).await
    }

    async fn ensure_network(&self, network: &str) -> Result<String> {
        DockerRuntime::ensure_network(self, network).await
    }

    async fn disconnect(&self, network: &str, container: &str) -> Result<()> {
        self.disconnect_network(network, container).await
    }

    async fn connect(&self, network: &str, container: &str) -> Result<()> {
        self.connect_network(network, container).await
    }

    async fn start(&self, container: &str) -> Result<()> {
        self.start_container(container).await
    }
}

/// Counts of what one reconciliation pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub already_running: usize,
    pub started: usize,
    pub healed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One-shot startup task: restore availability of persistent containers
/// after an orchestrator restart, without re-running any build.
pub async fn reconcile_startup(state: Arc<ServerState>) {
    let _sentry_guard = if state.cli.report_errors {
        state.cli.sentry_dsn.clone().map(sentry::init)
    } else {
        None
    };

    match reconcile(&state.runtime, &state.cli.docker_network, &state.progress).await {
        Ok(report) => {
            info!(
                already_running = report.already_running,
                started = report.started,
                healed = report.healed,
                failed = report.failed,
                skipped = report.skipped,
                "Startup reconciliation finished"
            );
        }
        Err(err) => {
            error!(error = %err, "Startup reconciliation failed");
        }
    }
}

/// Repair run/network state for every managed container. A failure on one
/// container is logged and skipped; the rest are still reconciled. Running
/// the pass twice in a row is a no-op the second time.
///
/// Container operations for a project are serialized against in-flight
/// deployments through the same per-project run guard the orchestrator
/// holds; a container whose project is being deployed right now is left to
/// that deployment.
pub async fn reconcile<R: ContainerState>(
    runtime: &R,
    network: &str,
    progress: &ProgressCache,
) -> Result<ReconcileReport> {
    let network_id = runtime.ensure_network(network).await?;
    let containers = runtime.managed_containers().await?;

    info!(count = containers.len(), network = %network, "Reconciling persistent containers");

    let mut report = ReconcileReport::default();

    for container in containers {
        if container.running {
            report.already_running += 1;
            continue;
        }

        let project = container
            .name
            .strip_prefix(APP_CONTAINER_PREFIX)
            .unwrap_or(&container.name);

        if !progress.try_begin(project) {
            info!(container = %container.name, "Deployment in flight, leaving container to it");
            report.skipped += 1;
            continue;
        }

        let outcome = heal_and_start(runtime, network, &network_id, &container.name).await;
        progress.end_run(project);

        match outcome {
            Ok(healed) => {
                report.started += 1;
                if healed {
                    report.healed += 1;
                }
            }
            Err(err) => {
                warn!(container = %container.name, error = %err, "Skipping container");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Repair a single stopped container: compare its attachments against the
/// current network by id, because a same-named network recreated across
/// daemon restarts gets a fresh id and the stale attachment must go. Then
/// start it. Returns whether the network was healed.
async fn heal_and_start<R: ContainerState>(
    runtime: &R,
    network: &str,
    network_id: &str,
    container: &str,
) -> Result<bool> {
    let attached = runtime.attached_networks(container).await?;

    let mut healed = false;
    if !attached.values().any(|id| id == network_id) {
        for stale in attached.keys() {
            runtime.disconnect(stale, container).await?;
        }
        runtime.connect(network, container).await?;
        healed = true;
    }

    runtime.start(container).await?;
    Ok(healed)
}
