/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod auth;
mod endpoint;
pub mod error;
pub mod requests;

mod tests;

use axum::http::HeaderValue;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post};
use axum::{Router, middleware};
use slipway_core::types::ServerState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub async fn serve_web(state: Arc<ServerState>) -> std::io::Result<()> {
    let server_url = format!("{}:{}", state.cli.ip, state.cli.port);

    let origin = state
        .cli
        .serve_url
        .parse::<HeaderValue>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_headers(vec![AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/api/project", get(endpoint::get_projects))
        .route("/api/project/{project}", get(endpoint::get_project))
        .route(
            "/api/project/{project}/logs",
            get(endpoint::get_project_logs),
        )
        .route("/api/deploy", post(endpoint::post_deploy))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::authorize,
        ))
        // The stream authenticates through a query token itself, because
        // EventSource cannot carry an Authorization header.
        .route(
            "/api/deploy/{project}/logs/stream",
            get(endpoint::connect_deployment),
        )
        .route("/api/user/login", post(endpoint::post_login))
        .route("/api/user/register", post(endpoint::post_register))
        .route("/api/health", get(endpoint::get_health))
        .fallback(endpoint::handle_404)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    axum::serve(listener, app).await
}
