//! External show catalog abstraction
//!
//! The online search talks to a third-party catalog through [`ShowCatalog`] and maps the
//! catalog's platform names to local platforms through [`PlatformResolver`]. Each catalog
//! reports its own `name()`, which doubles as the alias source tag.

use crate::{
    error::AppResult,
    models::{Platform, TvMazeSearchResult, TvMazeSeason, TvMazeShow},
};

pub mod tvmaze;

pub use tvmaze::TvMazeCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ShowCatalog: Send + Sync {
    /// Free-text show search; no matches is an empty list
    async fn search_shows(&self, query: &str) -> AppResult<Vec<TvMazeSearchResult>>;

    /// Season list of one catalog show
    async fn fetch_seasons(&self, catalog_id: i64) -> AppResult<Vec<TvMazeSeason>>;

    /// Single best match for a literal show name, `None` when nothing matches
    async fn single_search(&self, name: &str) -> AppResult<Option<TvMazeShow>>;

    /// Catalog name for logging and alias lookups
    fn name(&self) -> &'static str;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlatformResolver: Send + Sync {
    /// Local platforms whose alias for `source` matches one of `names`, ignoring case
    async fn lookup_by_external_names(
        &self,
        names: &[String],
        source: &str,
    ) -> AppResult<Vec<Platform>>;
}
