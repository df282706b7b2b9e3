use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::Actor,
    models::{CreateWatcherRequest, RenameWatcherRequest, Watcher, WatcherWithUserInfo},
    routes::AppState,
};

/// Watchers of the acting account, flagged with what the acting user may edit
pub async fn list(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> AppResult<Json<Vec<WatcherWithUserInfo>>> {
    let watchers = state
        .watchers
        .get_watchers_with_user_info(actor.account_id, actor.user_id)
        .await?;
    Ok(Json(watchers))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(request): Json<CreateWatcherRequest>,
) -> AppResult<(StatusCode, Json<Watcher>)> {
    let watcher = state
        .watchers
        .create_watcher_manual(actor.account_id, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(watcher)))
}

pub async fn rename(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(request): Json<RenameWatcherRequest>,
) -> AppResult<StatusCode> {
    state
        .watchers
        .update_watcher_name(actor.account_id, actor.user_id, id, &request.name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
