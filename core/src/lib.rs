/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod cache;
pub mod consts;
pub mod database;
pub mod input;
pub mod runtime;
pub mod types;

use anyhow::{Context, Result};
use clap::Parser;
use database::connect_db;
use std::sync::Arc;
use types::*;

pub async fn init_state() -> Result<Arc<ServerState>> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);
    tracing::info!("Starting Slipway server on {}:{}", cli.ip, cli.port);

    let db = connect_db(&cli).await?;

    let runtime = runtime::DockerRuntime::connect(cli.docker_socket.as_deref())?;
    runtime
        .ping()
        .await
        .context("Could not reach the container daemon")?;

    Ok(Arc::new(ServerState {
        db,
        cli,
        runtime,
        progress: cache::ProgressCache::new(),
    }))
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
