use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::{Actor, RequestId},
    models::{AddShowRequest, EditShowRequest, ShowForEdit, ShowRow, ShowStatus},
    routes::AppState,
    services::{grouping::ShowGroups, search::SearchShowsOptions},
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    platform: Option<i64>,
    page: Option<i64>,
}

impl SearchQuery {
    fn into_options(self) -> SearchShowsOptions {
        let mut options = SearchShowsOptions::default().with_page(self.page.unwrap_or(1));
        if let Some(q) = self.q {
            options = options.with_show_name(q);
        }
        if let Some(platform_id) = self.platform {
            options = options.with_platform(platform_id);
        }
        options
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchShowsResponse {
    shows: Vec<ShowRow>,
    page: i64,
    num_pages: i64,
    total: i64,
}

/// Handler for the paged show search
pub async fn search(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchShowsResponse>> {
    let result = state
        .shows
        .search_shows(actor.account_id, params.into_options())
        .await?;

    let num_pages = result.num_pages(state.shows.page_size());

    Ok(Json(SearchShowsResponse {
        page: result.page,
        total: result.total_count,
        num_pages,
        shows: result.items,
    }))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    actor: Actor,
    Json(request): Json<AddShowRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    tracing::info!(
        request_id = %request_id,
        account_id = actor.account_id,
        watcher_count = request.watcher_ids.len(),
        "Adding show"
    );

    let id = state.shows.add_show(actor.account_id, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn active_by_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> AppResult<Json<ShowGroups>> {
    let groups = state
        .shows
        .get_active_shows_grouped_by_status_and_watchers(actor.account_id)
        .await?;
    Ok(Json(groups))
}

pub async fn active_by_watcher(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> AppResult<Json<ShowGroups>> {
    let groups = state
        .shows
        .get_active_shows_grouped_by_watchers_and_status(actor.account_id)
        .await?;
    Ok(Json(groups))
}

pub async fn finished(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> AppResult<Json<Vec<ShowRow>>> {
    let shows = state.shows.get_finished_shows(actor.account_id).await?;
    Ok(Json(shows))
}

pub async fn get_show(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<Json<ShowForEdit>> {
    let show = state.shows.get_show_by_id(actor.account_id, id).await?;
    Ok(Json(show))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
    Json(mut request): Json<EditShowRequest>,
) -> AppResult<StatusCode> {
    request.id = id;
    state.shows.update_show(actor.account_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.shows.delete_show(actor.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<Json<ShowStatus>> {
    let status = state.shows.get_show_status(actor.account_id, id).await?;
    Ok(Json(status))
}

pub async fn start_watching(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.shows.start_watching(actor.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn finish_season(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.shows.finish_season(actor.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_season(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.shows.add_season(actor.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn want_to_watch(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.shows.back_to_want_to_watch(actor.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.shows.cancel_show(actor.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
