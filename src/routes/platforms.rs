use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::AppResult, middleware::Actor, models::Platform, routes::AppState};

pub async fn list(
    State(state): State<Arc<AppState>>,
    _actor: Actor,
) -> AppResult<Json<Vec<Platform>>> {
    let platforms = state.platforms.get_platforms().await?;
    Ok(Json(platforms))
}
