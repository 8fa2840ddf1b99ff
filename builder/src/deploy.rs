/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use chrono::Utc;
use slipway_core::consts::{BUILD_MOUNT, BUILD_OUTPUT_DIRS, SERVE_MOUNT};
use slipway_core::runtime::{app_container_name, job_container_name};
use slipway_core::types::*;
use entity::project::ProjectStatus;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::detect::{BuildStrategy, Framework, detect_framework, has_manifest};
use super::ports::allocate_port;
use super::proxy;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Clone failed: repository unreachable or checkout error")]
    CloneFailure,
    #[error("Build failed with exit code {0}")]
    BuildFailure(i64),
    #[error("Could not start server container: {0}")]
    ContainerStart(#[source] anyhow::Error),
    #[error("No free host port available: {0}")]
    PortUnavailable(#[source] anyhow::Error),
    #[error("Container runtime error: {0}")]
    Runtime(#[source] anyhow::Error),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
#[error("A deployment for '{project}' is already in progress")]
pub struct DeployBusy {
    pub project: String,
}

/// Execute one deployment to its terminal state. Never returns a value to
/// its caller; all outcomes flow through the progress cache and the durable
/// project record. The caller holds the per-project run guard, released here
/// at the end of the run.
#[instrument(skip(state, git_url), fields(project = %project_name))]
pub async fn run_deployment(
    state: Arc<ServerState>,
    git_url: String,
    project_name: String,
    user_id: Uuid,
) {
    let _sentry_guard = if state.cli.report_errors {
        state.cli.sentry_dsn.clone().map(sentry::init)
    } else {
        None
    };

    info!("Starting deployment");
    state.progress.start_run(&project_name);
    state
        .progress
        .append_log(&project_name, format!("Starting deployment for {}", project_name));
    state
        .progress
        .set_status(&project_name, ProjectStatus::Building, None);

    // The durable record enters Building in one commit. Everything after
    // goes through the cache until the terminal transition.
    let project = match enter_building(&state, &git_url, &project_name, user_id).await {
        Ok(project) => project,
        Err(err) => {
            error!(error = %err, "Failed to transition project record to Building");
            state.progress.end_run(&project_name);
            return;
        }
    };

    match execute(&state, &git_url, &project.branch, &project_name).await {
        Ok(framework) => {
            let domain = state.domain_for(&project_name);
            state
                .progress
                .append_log(&project_name, "Build completed successfully");
            state
                .progress
                .append_log(&project_name, format!("Deploying to: {}", domain));
            state.progress.set_status(
                &project_name,
                ProjectStatus::Live,
                Some(domain.clone()),
            );

            finish(
                &state,
                project,
                ProjectStatus::Live,
                Some(domain),
                Some(framework.label().to_string()),
            )
            .await;
            info!("Deployment finished");
        }
        Err(err) => {
            error!(error = %err, "Deployment failed");
            state
                .progress
                .append_log(&project_name, format!("Deployment failed: {}", err));
            state
                .progress
                .set_status(&project_name, ProjectStatus::Failed, None);

            finish(&state, project, ProjectStatus::Failed, None, None).await;
        }
    }

    state.progress.end_run(&project_name);
}

/// Create or reuse the project record and commit status=Building.
async fn enter_building(
    state: &Arc<ServerState>,
    git_url: &str,
    project_name: &str,
    user_id: Uuid,
) -> Result<MProject, DeployError> {
    let now = Utc::now().naive_utc();

    let existing = EProject::find()
        .filter(CProject::Name.eq(project_name))
        .one(&state.db)
        .await?;

    let project = match existing {
        Some(existing) => {
            state
                .progress
                .append_log(project_name, format!("Updating existing project: {}", project_name));

            let mut aproject: AProject = existing.into();
            aproject.status = Set(ProjectStatus::Building);
            aproject.repository = Set(git_url.to_string());
            aproject.update(&state.db).await?
        }
        None => {
            state
                .progress
                .append_log(project_name, format!("Created new project: {}", project_name));

            let aproject = AProject {
                id: Set(Uuid::new_v4()),
                name: Set(project_name.to_string()),
                framework: Set(None),
                status: Set(ProjectStatus::Building),
                repository: Set(git_url.to_string()),
                branch: Set("main".to_string()),
                domain: Set(None),
                build_logs: Set(None),
                created_at: Set(now),
                last_deployed_at: Set(None),
                created_by: Set(user_id),
            };
            aproject.insert(&state.db).await?
        }
    };

    Ok(project)
}

/// Batched terminal commit: status, domain, framework label, the joined
/// build log, and the deploy timestamp in one write.
async fn finish(
    state: &Arc<ServerState>,
    project: MProject,
    status: ProjectStatus,
    domain: Option<String>,
    framework: Option<String>,
) {
    let project_name = project.name.clone();
    let mut aproject: AProject = project.into();

    aproject.status = Set(status);
    aproject.build_logs = Set(Some(state.progress.log_text(&project_name)));
    aproject.last_deployed_at = Set(Some(Utc::now().naive_utc()));

    if domain.is_some() {
        aproject.domain = Set(domain);
    }
    if framework.is_some() {
        aproject.framework = Set(framework);
    }

    if let Err(err) = aproject.update(&state.db).await {
        error!(project = %project_name, error = %err, "Failed to commit terminal project state");
    }
}

/// The work inside Building: prepare, clone, detect, dispatch.
async fn execute(
    state: &Arc<ServerState>,
    git_url: &str,
    branch: &str,
    project_name: &str,
) -> Result<Framework, DeployError> {
    let work_dir = PathBuf::from(&state.cli.projects_path).join(project_name);
    let host_dir = format!("{}/{}", state.cli.host_projects_path, project_name);

    prepare_workdir(&work_dir).await?;
    state.progress.append_log(project_name, "Cleaned build directory");

    clone_repository(state, git_url, branch, project_name, &host_dir).await?;

    let framework = detect_framework(&work_dir);
    state
        .progress
        .append_log(project_name, format!("Detected framework: {}", framework));

    match framework.strategy() {
        BuildStrategy::Static => {
            deploy_static(state, project_name, &work_dir, &host_dir).await?
        }
        BuildStrategy::Server => deploy_server(state, project_name, &host_dir).await?,
    }

    Ok(framework)
}

/// Remove any stale prior build tree and create a fresh directory.
async fn prepare_workdir(work_dir: &Path) -> std::io::Result<()> {
    if tokio::fs::try_exists(work_dir).await? {
        tokio::fs::remove_dir_all(work_dir).await?;
    }
    tokio::fs::create_dir_all(work_dir).await?;
    Ok(())
}

/// Shallow single-branch clone through an ephemeral container writing into
/// the bind-mounted project directory.
async fn clone_repository(
    state: &Arc<ServerState>,
    git_url: &str,
    branch: &str,
    project_name: &str,
    host_dir: &str,
) -> Result<(), DeployError> {
    state
        .progress
        .append_log(project_name, format!("Repository: {}", git_url));
    state.progress.append_log(project_name, "Cloning repository...");

    let script = format!(
        "apk add --no-cache git && git clone --depth 1 --single-branch --branch {} {} {}",
        branch, git_url, BUILD_MOUNT
    );
    let cmd = vec!["sh".to_string(), "-c".to_string(), script];
    let binds = vec![format!("{}:{}", host_dir, BUILD_MOUNT)];

    let exit_code = state
        .runtime
        .run_to_completion(
            &job_container_name(project_name),
            &state.cli.build_image,
            cmd,
            binds,
            |line| state.progress.append_log(project_name, line),
        )
        .await
        .map_err(DeployError::Runtime)?;

    if exit_code != 0 {
        return Err(DeployError::CloneFailure);
    }

    Ok(())
}

/// Run `npm install && npm run build` over the project directory in an
/// ephemeral container, streaming its output into the progress cache.
async fn run_build_container(
    state: &Arc<ServerState>,
    project_name: &str,
    host_dir: &str,
) -> Result<(), DeployError> {
    state.progress.append_log(project_name, "Installing dependencies and building...");

    let script = format!("cd {} && npm install && npm run build", BUILD_MOUNT);
    let cmd = vec!["sh".to_string(), "-c".to_string(), script];
    let binds = vec![format!("{}:{}", host_dir, BUILD_MOUNT)];

    let exit_code = state
        .runtime
        .run_to_completion(
            &job_container_name(project_name),
            &state.cli.build_image,
            cmd,
            binds,
            |line| state.progress.append_log(project_name, line),
        )
        .await
        .map_err(DeployError::Runtime)?;

    if exit_code != 0 {
        return Err(DeployError::BuildFailure(exit_code));
    }

    Ok(())
}

/// Static path: build once if there is a manifest, then leave the project
/// root holding exactly the servable files. No container stays running.
async fn deploy_static(
    state: &Arc<ServerState>,
    project_name: &str,
    work_dir: &Path,
    host_dir: &str,
) -> Result<(), DeployError> {
    if !has_manifest(work_dir) {
        state
            .progress
            .append_log(project_name, "Static content detected, no build step required");
        return Ok(());
    }

    run_build_container(state, project_name, host_dir).await?;

    match promote_build_output(work_dir).await? {
        Some(dir) => {
            state
                .progress
                .append_log(project_name, format!("Publishing {}/ as site root", dir));
        }
        None => {
            // Degraded, not fatal: serve the tree the build left behind.
            warn!(project = %project_name, "No build output directory found");
            state.progress.append_log(
                project_name,
                "No build output directory found, serving source tree as-is",
            );
        }
    }

    Ok(())
}

/// Move the contents of the first conventional output directory up to the
/// project root and delete everything else, so the root holds only the
/// deployable output. Returns the promoted directory name, or None when no
/// known output directory exists.
pub async fn promote_build_output(root: &Path) -> std::io::Result<Option<&'static str>> {
    let Some(output) = BUILD_OUTPUT_DIRS
        .iter()
        .find(|dir| root.join(dir).is_dir())
        .copied()
    else {
        return Ok(None);
    };

    let staging = root.join(".publish-staging");
    tokio::fs::rename(root.join(output), &staging).await?;

    let mut entries = tokio::fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.path() == staging {
            continue;
        }
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(entry.path()).await?;
        } else {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }

    let mut entries = tokio::fs::read_dir(&staging).await?;
    while let Some(entry) = entries.next_entry().await? {
        tokio::fs::rename(entry.path(), root.join(entry.file_name())).await?;
    }
    tokio::fs::remove_dir(&staging).await?;

    Ok(Some(output))
}

/// Server path: build once, then run a long-lived process behind a
/// per-project reverse-proxy route.
async fn deploy_server(
    state: &Arc<ServerState>,
    project_name: &str,
    host_dir: &str,
) -> Result<(), DeployError> {
    run_build_container(state, project_name, host_dir).await?;

    let container = app_container_name(project_name);

    // Replace any previous deployment of this project
    state
        .runtime
        .remove_container(&container)
        .await
        .map_err(DeployError::Runtime)?;

    state
        .runtime
        .ensure_network(&state.cli.docker_network)
        .await
        .map_err(DeployError::Runtime)?;

    let port = allocate_port().map_err(DeployError::PortUnavailable)?;

    state
        .progress
        .append_log(project_name, "Starting server container...");

    let script = format!("cd {} && npm start -- -p {}", SERVE_MOUNT, port);
    let cmd = vec!["sh".to_string(), "-c".to_string(), script];
    let binds = vec![format!("{}:{}:ro", host_dir, SERVE_MOUNT)];
    let env = vec![
        format!("PORT={}", port),
        "HOST=0.0.0.0".to_string(),
        "NODE_ENV=production".to_string(),
    ];

    state
        .runtime
        .start_persistent(
            &container,
            &state.cli.build_image,
            cmd,
            binds,
            env,
            port,
            &state.cli.docker_network,
        )
        .await
        .map_err(DeployError::ContainerStart)?;

    state
        .progress
        .append_log(project_name, format!("Server container listening on port {}", port));

    proxy::write_route(&state.cli, project_name, &container, port).await?;

    // Reload failure is non-fatal: the route file applies at the next full
    // proxy restart.
    if let Err(err) = proxy::reload(&state.runtime, &state.cli.proxy_containers).await {
        warn!(error = %err, "Proxy reload failed");
        state
            .progress
            .append_log(project_name, "Warning: proxy reload could not be delivered");
    }

    Ok(())
}
