/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use async_stream::stream;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::Utc;
use slipway_core::database::{get_project_by_name, get_user_project};
use slipway_core::input::{check_index_name, check_repository_url, validate_password};
use slipway_core::types::*;
use entity::project::ProjectStatus;
use futures_util::Stream;
use password_auth::{generate_hash, verify_password};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use super::auth;
use super::error::{WebError, WebResult};
use super::requests::*;

pub async fn handle_404() -> (StatusCode, Json<BaseResponse<String>>) {
    (
        StatusCode::NOT_FOUND,
        Json(BaseResponse {
            error: true,
            message: "Not found".to_string(),
        }),
    )
}

pub async fn get_health() -> Json<BaseResponse<String>> {
    Json(BaseResponse {
        error: false,
        message: "healthy".to_string(),
    })
}

pub async fn post_register(
    state: State<Arc<ServerState>>,
    Json(body): Json<MakeUserRequest>,
) -> WebResult<Json<BaseResponse<String>>> {
    if state.cli.disable_registration {
        return Err(WebError::registration_disabled());
    }

    check_index_name(&body.username)?;

    if !body.email.contains('@') {
        return Err(WebError::invalid_email());
    }

    validate_password(&body.password)?;

    let existing = EUser::find()
        .filter(CUser::Username.eq(body.username.clone()))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(WebError::already_exists("User"));
    }

    let now = Utc::now().naive_utc();
    let auser = AUser {
        id: Set(Uuid::new_v4()),
        username: Set(body.username),
        name: Set(body.name),
        email: Set(body.email),
        password: Set(generate_hash(&body.password)),
        last_login_at: Set(now),
        created_at: Set(now),
    };
    auser.insert(&state.db).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: "User created".to_string(),
    }))
}

pub async fn post_login(
    state: State<Arc<ServerState>>,
    Json(body): Json<MakeLoginRequest>,
) -> WebResult<Json<BaseResponse<String>>> {
    let user = EUser::find()
        .filter(CUser::Username.eq(body.loginname.clone()))
        .one(&state.db)
        .await?
        .ok_or_else(WebError::invalid_credentials)?;

    verify_password(&body.password, &user.password)
        .map_err(|_| WebError::invalid_credentials())?;

    let token = auth::encode_jwt(&state, user.id)?;
    auth::update_last_login(&state, user).await?;

    Ok(Json(BaseResponse {
        error: false,
        message: token,
    }))
}

pub async fn get_projects(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
) -> WebResult<Json<BaseResponse<Vec<ProjectResponse>>>> {
    let projects = EProject::find()
        .filter(CProject::CreatedBy.eq(user.id))
        .order_by_desc(CProject::CreatedAt)
        .all(&state.db)
        .await?;

    let projects = projects.into_iter().map(ProjectResponse::from).collect();

    Ok(Json(BaseResponse {
        error: false,
        message: projects,
    }))
}

pub async fn get_project(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Path(project_name): Path<String>,
) -> WebResult<Json<BaseResponse<ProjectResponse>>> {
    let project = get_user_project(Arc::clone(&state), user.id, &project_name)
        .await?
        .ok_or_else(|| WebError::not_found("Project"))?;

    Ok(Json(BaseResponse {
        error: false,
        message: ProjectResponse::from(project),
    }))
}

pub async fn get_project_logs(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Path(project_name): Path<String>,
) -> WebResult<Json<BaseResponse<String>>> {
    let project = get_user_project(Arc::clone(&state), user.id, &project_name)
        .await?
        .ok_or_else(|| WebError::not_found("Project"))?;

    Ok(Json(BaseResponse {
        error: false,
        message: project
            .build_logs
            .unwrap_or_else(|| "No logs available yet.".to_string()),
    }))
}

/// Accept a deployment and return immediately; the run executes as a
/// background unit of work.
pub async fn post_deploy(
    state: State<Arc<ServerState>>,
    Extension(user): Extension<MUser>,
    Json(body): Json<MakeDeployRequest>,
) -> WebResult<Json<DeployResponse>> {
    check_index_name(&body.project_name)?;
    check_repository_url(&body.git_url)?;

    // The unique name may only be reused by its owner
    if let Some(existing) = get_project_by_name(Arc::clone(&state), &body.project_name).await? {
        if existing.created_by != user.id {
            return Err(WebError::Conflict(
                "Project name already taken by another user".to_string(),
            ));
        }
    }

    builder::queue_deployment(
        Arc::clone(&state),
        body.git_url,
        body.project_name.clone(),
        user.id,
    )
    .map_err(|busy| WebError::Conflict(busy.to_string()))?;

    Ok(Json(DeployResponse {
        message: format!("Deployment started for {}", body.project_name),
        status: "Queued".to_string(),
        project: body.project_name,
    }))
}

/// Live deployment progress as a server-sent event stream. The token comes
/// in as a query parameter because EventSource cannot carry headers; a
/// bounded poll count ends the stream with a timeout event instead of
/// hanging, and disconnecting never cancels the underlying build.
pub async fn connect_deployment(
    state: State<Arc<ServerState>>,
    Path(project_name): Path<String>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, WebError> {
    let user = auth::authenticate_token(&state, &params.token)
        .await
        .map_err(|_| WebError::Unauthorized("Invalid or expired token".to_string()))?;

    // Other users' projects hide behind the same 404
    match get_project_by_name(Arc::clone(&state), &project_name).await? {
        Some(project) if project.created_by != user.id => {
            return Err(WebError::not_found("Project"));
        }
        Some(_) => {}
        // The record is committed on entry to Building, which can lag the
        // queued acknowledgement by a moment
        None if state.progress.is_running(&project_name) => {}
        None => return Err(WebError::not_found("Project")),
    }

    let state = Arc::clone(&state);
    let stream = stream! {
        yield Ok(stream_event(&StreamEvent::Connected {
            message: "Stream connected".to_string(),
        }));

        let mut position = 0;
        let mut last_status: Option<(ProjectStatus, Option<String>)> = None;
        let interval = std::time::Duration::from_secs(state.cli.stream_poll_interval);

        for _ in 0..state.cli.stream_max_polls {
            let (lines, next_position) = state.progress.logs_since(&project_name, position);
            position = next_position;
            for line in lines {
                yield Ok(stream_event(&StreamEvent::Log { message: line }));
            }

            let project = match get_user_project(Arc::clone(&state), user.id, &project_name).await {
                Ok(project) => project,
                Err(err) => {
                    yield Ok(stream_event(&StreamEvent::Error { message: err.to_string() }));
                    return;
                }
            };

            match project {
                Some(project) => {
                    let current = (project.status, project.domain.clone());
                    if last_status.as_ref() != Some(&current) {
                        last_status = Some(current);
                        yield Ok(stream_event(&StreamEvent::Status {
                            status: project.status,
                            domain: project.domain.clone(),
                        }));
                    }

                    if project.status.is_terminal() {
                        // Flush lines that landed between the poll and the
                        // terminal commit
                        let (lines, _) = state.progress.logs_since(&project_name, position);
                        for line in lines {
                            yield Ok(stream_event(&StreamEvent::Log { message: line }));
                        }

                        let url = project.domain.as_ref().map(|domain| format!("http://{}", domain));
                        yield Ok(stream_event(&StreamEvent::Complete {
                            status: project.status,
                            domain: project.domain,
                            url,
                        }));
                        return;
                    }
                }
                None => {
                    if !state.progress.is_running(&project_name) {
                        yield Ok(stream_event(&StreamEvent::Error {
                            message: "Project not found".to_string(),
                        }));
                        return;
                    }
                }
            }

            tokio::time::sleep(interval).await;
        }

        yield Ok(stream_event(&StreamEvent::Timeout {
            message: "Deployment timeout".to_string(),
        }));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn stream_event(payload: &StreamEvent) -> Event {
    Event::default().data(serde_json::to_string(payload).unwrap_or_default())
}
