use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    db::Database,
    error::AppResult,
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{
        catalog::TvMazeCatalog,
        identity::{AccountService, IdentityService, UserService},
        OnlineSearchService, PlatformService, ShowService, WatcherService,
    },
};

pub mod catalog;
pub mod identity;
pub mod platforms;
pub mod shows;
pub mod watchers;

/// Services shared by every handler
pub struct AppState {
    pub shows: ShowService,
    pub watchers: WatcherService,
    pub platforms: PlatformService,
    pub identity: IdentityService,
    pub online_search: OnlineSearchService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> AppResult<Self> {
        let db = Database::new(pool, config.query_timeout(), config.page_size);

        let platforms = PlatformService::new(db.clone());
        let watchers = WatcherService::new(db.clone());
        let catalog = TvMazeCatalog::new(config.tvmaze_base_url.clone(), config.query_timeout())?;

        Ok(Self {
            shows: ShowService::new(db.clone()),
            online_search: OnlineSearchService::new(
                Arc::new(catalog),
                Arc::new(platforms.clone()),
                config.query_timeout(),
            ),
            identity: IdentityService::new(
                UserService::new(db.clone()),
                AccountService::new(db),
                watchers.clone(),
            ),
            watchers,
            platforms,
        })
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(shows::search).post(shows::add))
        .route("/shows/active/by-status", get(shows::active_by_status))
        .route("/shows/active/by-watcher", get(shows::active_by_watcher))
        .route("/shows/finished", get(shows::finished))
        .route(
            "/shows/:id",
            get(shows::get_show).put(shows::update).delete(shows::delete),
        )
        .route("/shows/:id/status", get(shows::status))
        .route("/shows/:id/start-watching", post(shows::start_watching))
        .route("/shows/:id/finish-season", post(shows::finish_season))
        .route("/shows/:id/add-season", post(shows::add_season))
        .route("/shows/:id/want-to-watch", post(shows::want_to_watch))
        .route("/shows/:id/cancel", post(shows::cancel))
        .route("/catalog/search", get(catalog::search))
        .route("/catalog/image", get(catalog::image))
        .route("/watchers", get(watchers::list).post(watchers::create))
        .route("/watchers/:id", put(watchers::rename))
        .route("/platforms", get(platforms::list))
        .route("/users", post(identity::create_user))
        .route("/users/activate/:code", post(identity::activate))
        .route("/users/verify", post(identity::verify_credentials))
        .route("/accounts/join/:token", get(identity::account_by_join_token))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
