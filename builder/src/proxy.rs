/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Result;
use slipway_core::runtime::DockerRuntime;
use slipway_core::types::Cli;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Render the nginx virtual host for a project. The upstream is addressed by
/// container name through the embedded Docker DNS resolver with a short TTL,
/// so a replacement container with a new address is picked up without
/// rewriting the file.
pub fn render_vhost(project: &str, container: &str, port: u16, domain_suffix: &str) -> String {
    format!(
        r#"server {{
    listen 80;
    server_name {project}{domain_suffix};

    resolver 127.0.0.11 valid=10s;
    set $upstream http://{container}:{port};

    location / {{
        proxy_pass $upstream;
        proxy_http_version 1.1;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection "upgrade";
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }}
}}
"#
    )
}

/// Write the per-project route file into the proxy's config directory.
pub async fn write_route(
    cli: &Cli,
    project: &str,
    container: &str,
    port: u16,
) -> std::io::Result<PathBuf> {
    let path = PathBuf::from(&cli.proxy_config_path).join(format!("{}.conf", project));
    let vhost = render_vhost(project, container, port, &cli.domain_suffix);

    tokio::fs::write(&path, vhost).await?;
    info!(project = %project, path = %path.display(), "Wrote proxy route");

    Ok(path)
}

/// Signal the running proxy to pick up new routes. The proxy container name
/// varies across deployment topologies, so each known name is tried in turn.
/// When none resolves, the route file still applies at the next full proxy
/// restart.
pub async fn reload(runtime: &DockerRuntime, proxy_containers: &[String]) -> Result<()> {
    for name in proxy_containers {
        let cmd = vec!["nginx".to_string(), "-s".to_string(), "reload".to_string()];

        match runtime.exec(name, cmd).await {
            Ok(0) => {
                info!(proxy = %name, "Reloaded proxy configuration");
                return Ok(());
            }
            Ok(code) => {
                warn!(proxy = %name, code, "Proxy reload exited non-zero");
            }
            Err(err) => {
                debug!(proxy = %name, error = %err, "Proxy container not reachable");
            }
        }
    }

    anyhow::bail!("No proxy container accepted the reload signal")
}
