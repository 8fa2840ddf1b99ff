/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::{ContainerSummary, HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use bollard::network::{
    ConnectNetworkOptions, CreateNetworkOptions, DisconnectNetworkOptions, InspectNetworkOptions,
};
use futures_util::StreamExt;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::consts::{APP_CONTAINER_PREFIX, JOB_CONTAINER_PREFIX, RESTART_MAX_RETRIES};

/// Deterministic name of the persistent container backing a project, so it
/// can be located again after a process restart.
pub fn app_container_name(project: &str) -> String {
    format!("{}{}", APP_CONTAINER_PREFIX, project)
}

/// Name of the short-lived clone/build container for a project.
pub fn job_container_name(project: &str) -> String {
    format!("{}{}", JOB_CONTAINER_PREFIX, project)
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Thin capability wrapper over the local container daemon.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the container daemon. With no socket override this uses
    /// the local defaults, which handle the unix socket on Linux.
    pub fn connect(socket: Option<&str>) -> Result<Self> {
        let docker = match socket {
            Some(path) => Docker::connect_with_socket(path, 120, bollard::API_DEFAULT_VERSION)
                .context("Failed to connect to container daemon socket")?,
            None => Docker::connect_with_local_defaults()
                .context("Failed to connect to container daemon")?,
        };

        Ok(Self { docker })
    }

    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }

    /// Run a short-lived container to completion, forwarding each log line
    /// as it arrives, and return its exit code. The container is always
    /// force-removed afterwards, whatever the outcome.
    pub async fn run_to_completion<F>(
        &self,
        name: &str,
        image: &str,
        cmd: Vec<String>,
        binds: Vec<String>,
        on_line: F,
    ) -> Result<i64>
    where
        F: FnMut(String),
    {
        self.remove_container(name).await?;

        let result = self
            .run_to_completion_inner(name, image, cmd, binds, on_line)
            .await;

        if let Err(err) = self.remove_container(name).await {
            warn!(container = %name, error = %err, "Failed to remove finished container");
        }

        result
    }

    async fn run_to_completion_inner<F>(
        &self,
        name: &str,
        image: &str,
        cmd: Vec<String>,
        binds: Vec<String>,
        mut on_line: F,
    ) -> Result<i64>
    where
        F: FnMut(String),
    {
        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(cmd),
            host_config: Some(HostConfig {
                binds: Some(binds),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.to_string(),
                    platform: None,
                }),
                config,
            )
            .await
            .context("Failed to create container")?;

        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .context("Failed to start container")?;

        let mut logs = self.docker.logs(
            name,
            Some(LogsOptions::<String> {
                follow: true,
                stdout: true,
                stderr: true,
                ..Default::default()
            }),
        );

        let mut buffer = String::new();
        while let Some(chunk) = logs.next().await {
            match chunk {
                Ok(output) => {
                    buffer.push_str(&output.to_string());
                    while let Some(pos) = buffer.find('\n') {
                        let line = buffer[..pos].trim_end_matches('\r').to_string();
                        buffer = buffer[pos + 1..].to_string();
                        if !line.is_empty() {
                            on_line(line);
                        }
                    }
                }
                Err(err) => {
                    warn!(container = %name, error = %err, "Log stream ended with error");
                    break;
                }
            }
        }

        let trailing = buffer.trim_end_matches('\r');
        if !trailing.is_empty() {
            on_line(trailing.to_string());
        }

        let mut wait = self
            .docker
            .wait_container(name, None::<WaitContainerOptions<String>>);

        let status_code = match wait.next().await {
            Some(Ok(response)) => response.status_code,
            // The daemon reports a non-zero exit through the wait error body.
            Some(Err(DockerError::DockerContainerWaitError { code, .. })) => code,
            Some(Err(err)) => return Err(err).context("Failed to wait for container"),
            None => 0,
        };

        debug!(container = %name, status_code, "Container finished");
        Ok(status_code)
    }

    /// Start a long-lived server container: read-only project mount, the
    /// allocated port bound and exposed, attached to the internal network,
    /// with a bounded on-failure restart policy.
    pub async fn start_persistent(
        &self,
        name: &str,
        image: &str,
        cmd: Vec<String>,
        binds: Vec<String>,
        env: Vec<String>,
        port: u16,
        network: &str,
    ) -> Result<()> {
        // One live persistent container per project: replace any prior one.
        self.remove_container(name).await?;

        let port_key = format!("{}/tcp", port);

        let mut exposed_ports = HashMap::new();
        exposed_ports.insert(port_key.clone(), HashMap::new());

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key,
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(port.to_string()),
            }]),
        );

        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(cmd),
            env: Some(env),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                binds: Some(binds),
                port_bindings: Some(port_bindings),
                network_mode: Some(network.to_string()),
                restart_policy: Some(RestartPolicy {
                    name: Some(RestartPolicyNameEnum::ON_FAILURE),
                    maximum_retry_count: Some(RESTART_MAX_RETRIES),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.to_string(),
                    platform: None,
                }),
                config,
            )
            .await
            .context("Failed to create server container")?;

        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .context("Failed to start server container")?;

        Ok(())
    }

    /// Force-remove a container. Missing containers are not an error.
    pub async fn remove_container(&self, name: &str) -> Result<()> {
        match self
            .docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(err).context("Failed to remove container"),
        }
    }

    pub async fn start_container(&self, name: &str) -> Result<()> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .context("Failed to start container")?;
        Ok(())
    }

    pub async fn is_running(&self, name: &str) -> Result<bool> {
        let detail = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .context("Failed to inspect container")?;

        Ok(detail
            .state
            .and_then(|state| state.running)
            .unwrap_or(false))
    }

    /// All containers (including stopped ones) carrying this orchestrator's
    /// name prefix.
    pub async fn list_app_containers(&self) -> Result<Vec<ContainerSummary>> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec![APP_CONTAINER_PREFIX.to_string()]);

        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .context("Failed to list containers")?;

        Ok(containers)
    }

    /// Network name to network id, for every network a container is
    /// currently attached to.
    pub async fn container_networks(&self, name: &str) -> Result<HashMap<String, String>> {
        let detail = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .context("Failed to inspect container")?;

        let mut attached = HashMap::new();
        if let Some(networks) = detail.network_settings.and_then(|s| s.networks) {
            for (net_name, endpoint) in networks {
                if let Some(id) = endpoint.network_id {
                    attached.insert(net_name, id);
                }
            }
        }

        Ok(attached)
    }

    pub async fn network_id(&self, name: &str) -> Result<Option<String>> {
        match self
            .docker
            .inspect_network(name, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(network) => Ok(network.id),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).context("Failed to inspect network"),
        }
    }

    /// Look up the internal network, creating it when missing. Returns its
    /// current id.
    pub async fn ensure_network(&self, name: &str) -> Result<String> {
        if let Some(id) = self.network_id(name).await? {
            return Ok(id);
        }

        debug!(network = %name, "Creating internal network");
        self.docker
            .create_network(CreateNetworkOptions {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .context("Failed to create network")?;

        self.network_id(name)
            .await?
            .context("Network has no id after creation")
    }

    pub async fn connect_network(&self, network: &str, container: &str) -> Result<()> {
        self.docker
            .connect_network(
                network,
                ConnectNetworkOptions {
                    container: container.to_string(),
                    ..Default::default()
                },
            )
            .await
            .context("Failed to connect container to network")?;
        Ok(())
    }

    pub async fn disconnect_network(&self, network: &str, container: &str) -> Result<()> {
        self.docker
            .disconnect_network(
                network,
                DisconnectNetworkOptions {
                    container: container.to_string(),
                    force: true,
                },
            )
            .await
            .context("Failed to disconnect container from network")?;
        Ok(())
    }

    /// Exec a command inside a running container and return its exit code.
    pub async fn exec(&self, container: &str, cmd: Vec<String>) -> Result<i64> {
        let exec = self
            .docker
            .create_exec(
                container,
                CreateExecOptions {
                    cmd: Some(cmd),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .context("Failed to create exec")?;

        if let StartExecResults::Attached { mut output, .. } = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .context("Failed to start exec")?
        {
            while let Some(chunk) = output.next().await {
                if let Ok(msg) = chunk {
                    debug!(container = %container, output = %msg, "exec");
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .context("Failed to inspect exec")?;

        Ok(inspect.exit_code.unwrap_or(0))
    }
}
