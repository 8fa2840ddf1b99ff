/*
 * SPDX-FileCopyrightText: 2026 Slipway Contributors
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use slipway_core::input::load_secret;
use slipway_core::types::*;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::error::WebError;

#[derive(Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize,
    pub iat: usize,
    pub id: Uuid,
}

pub async fn authorize(
    state: State<Arc<ServerState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, WebError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| WebError::Unauthorized("Authorization header not found".to_string()))?
        .to_str()
        .map_err(|_| WebError::Unauthorized("Authorization header empty".to_string()))?;

    let mut header = auth_header.split_whitespace();
    let (bearer, token) = (header.next(), header.next());

    if bearer != Some("Bearer") {
        return Err(WebError::Unauthorized(
            "Invalid Authorization header".to_string(),
        ));
    }

    let token =
        token.ok_or_else(|| WebError::Unauthorized("Invalid Authorization header".to_string()))?;

    let current_user = authenticate_token(&state, token).await?;

    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Resolve a bearer token to its user. Also used by the log stream, which
/// receives the token out-of-band as a query parameter.
pub async fn authenticate_token(state: &Arc<ServerState>, token: &str) -> Result<MUser, WebError> {
    let token_data = decode_jwt(state, token)?;

    EUser::find_by_id(token_data.claims.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| WebError::Unauthorized("User not found".to_string()))
}

pub fn encode_jwt(state: &Arc<ServerState>, id: Uuid) -> Result<String, WebError> {
    let now = Utc::now();
    let exp = (now + Duration::hours(24)).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claims = Claims { iat, exp, id };
    let secret = load_secret(&state.cli.jwt_secret_file);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|_| WebError::failed_to_generate_token())
}

pub fn decode_jwt(state: &Arc<ServerState>, jwt: &str) -> Result<TokenData<Claims>, WebError> {
    let secret = load_secret(&state.cli.jwt_secret_file);

    decode(
        jwt,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| WebError::Unauthorized("Unable to decode token".to_string()))
}

pub async fn update_last_login(state: &Arc<ServerState>, user: MUser) -> Result<(), WebError> {
    let mut auser: AUser = user.into();
    auser.last_login_at = Set(Utc::now().naive_utc());
    auser.update(&state.db).await?;
    Ok(())
}
