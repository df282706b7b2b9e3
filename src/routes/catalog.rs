use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{Actor, RequestId},
    models::OnlineShowSearchResult,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(default)]
    name: String,
}

/// Handler for the enriched catalog search
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    _actor: Actor,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<OnlineShowSearchResult>>> {
    let results = state.online_search.search(&params.q).await?;

    tracing::info!(
        request_id = %request_id,
        result_count = results.len(),
        "Catalog search completed"
    );

    Ok(Json(results))
}

pub async fn image(
    State(state): State<Arc<AppState>>,
    _actor: Actor,
    Query(params): Query<ImageQuery>,
) -> AppResult<Json<Value>> {
    let url = state.online_search.find_show_image_by_name(&params.name).await?;
    Ok(Json(json!({ "url": url })))
}
