/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use std::net::TcpListener;

/// Ask the OS for a currently-free host port by binding an ephemeral
/// listener and releasing it again. Best effort, not a reservation: the port
/// can in principle be taken between release and reuse. Server containers
/// are created serially per project, so the residual race is cross-project
/// only.
pub fn allocate_port() -> Result<u16> {
    let listener =
        TcpListener::bind(("127.0.0.1", 0)).context("Failed to bind ephemeral port")?;

    let port = listener
        .local_addr()
        .context("Failed to read allocated address")?
        .port();

    Ok(port)
}
