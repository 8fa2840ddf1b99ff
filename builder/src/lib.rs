/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod deploy;
pub mod detect;
pub mod ports;
pub mod proxy;
pub mod reconcile;

mod tests;

use slipway_core::types::ServerState;
use std::sync::Arc;
use uuid::Uuid;

/// Spawn the startup reconciliation task. Runs concurrently so process
/// readiness never waits on container repair.
pub async fn start_builder(state: Arc<ServerState>) -> std::io::Result<()> {
    tokio::spawn(reconcile::reconcile_startup(Arc::clone(&state)));
    Ok(())
}

/// Acquire the per-project run guard and schedule a deployment as a
/// background unit of work. Rejected while a run for the same project name
/// is still in flight.
pub fn queue_deployment(
    state: Arc<ServerState>,
    git_url: String,
    project_name: String,
    user_id: Uuid,
) -> Result<(), deploy::DeployBusy> {
    if !state.progress.try_begin(&project_name) {
        return Err(deploy::DeployBusy {
            project: project_name,
        });
    }

    tokio::spawn(deploy::run_deployment(state, git_url, project_name, user_id));
    Ok(())
}
