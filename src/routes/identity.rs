use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Account, CreateUserRequest, User},
    routes::AppState,
    services::identity::VerifiedAccount,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    #[serde(default)]
    join_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    email: String,
    password: String,
}

/// Registers an inactive user; the response carries the activation code
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.identity.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn activate(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    request: Option<Json<ActivateRequest>>,
) -> AppResult<Json<VerifiedAccount>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let verified = state
        .identity
        .verify_account(&code, request.join_token.as_deref())
        .await?;
    Ok(Json(verified))
}

pub async fn verify_credentials(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialsRequest>,
) -> AppResult<Json<User>> {
    let user = state
        .identity
        .users
        .verify_credentials(&request.email, &request.password)
        .await?;
    Ok(Json(user))
}

pub async fn account_by_join_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> AppResult<Json<Account>> {
    let account = state.identity.accounts.get_account_by_join_token(&token).await?;
    Ok(Json(account))
}
