use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::{
    error::{AppError, AppResult},
    models::{OnlineShowSearchResult, TvMazeShow},
    services::catalog::{PlatformResolver, ShowCatalog},
};

/// Ceiling on concurrent per-show enrichment lookups
pub const ENRICHMENT_WORKERS: usize = 3;

/// Searches the external catalog and enriches each hit with its season count and the
/// local platforms it streams on
#[derive(Clone)]
pub struct OnlineSearchService {
    catalog: Arc<dyn ShowCatalog>,
    platforms: Arc<dyn PlatformResolver>,
    timeout: Duration,
    workers: usize,
}

impl OnlineSearchService {
    pub fn new(
        catalog: Arc<dyn ShowCatalog>,
        platforms: Arc<dyn PlatformResolver>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            platforms,
            timeout,
            workers: ENRICHMENT_WORKERS,
        }
    }

    /// Enriched hits for `term`, heaviest first
    ///
    /// Hits with equal weight keep the catalog's order. The whole search, enrichment
    /// included, shares one timeout budget.
    pub async fn search(&self, term: &str) -> AppResult<Vec<OnlineShowSearchResult>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::InvalidInput("Search term cannot be empty".to_string()));
        }

        match tokio::time::timeout(self.timeout, self.search_and_enrich(term)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    catalog = self.catalog.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Online show search timed out"
                );
                Err(AppError::Timeout("online_search"))
            }
        }
    }

    /// Medium poster of the catalog's best match for `name`, or an empty string
    pub async fn find_show_image_by_name(&self, name: &str) -> AppResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Show name cannot be empty".to_string()));
        }

        let show = tokio::time::timeout(self.timeout, self.catalog.single_search(name))
            .await
            .map_err(|_| AppError::Timeout("find_show_image_by_name"))??;

        Ok(show
            .as_ref()
            .and_then(|s| s.medium_image())
            .unwrap_or_default()
            .to_string())
    }

    async fn search_and_enrich(&self, term: &str) -> AppResult<Vec<OnlineShowSearchResult>> {
        let hits = self.catalog.search_shows(term).await?;

        tracing::info!(
            catalog = self.catalog.name(),
            hit_count = hits.len(),
            "Enriching catalog search hits"
        );

        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let results = Arc::new(Mutex::new(Vec::with_capacity(hits.len())));
        let mut tasks = JoinSet::new();

        for (position, hit) in hits.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let results = Arc::clone(&results);
            let catalog = Arc::clone(&self.catalog);
            let platforms = Arc::clone(&self.platforms);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;

                let enriched = enrich(catalog.as_ref(), platforms.as_ref(), hit.show).await;
                results.lock().await.push((position, enriched));

                Ok::<(), AppError>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    tracing::error!(error = %e, "Enrichment task join error");
                    return Err(AppError::Internal(e.to_string()));
                }
            }
        }

        let mut collected = std::mem::take(&mut *results.lock().await);
        order_by_weight(&mut collected);

        Ok(collected.into_iter().map(|(_, result)| result).collect())
    }
}

/// Sorts by weight descending, then by catalog position
fn order_by_weight(results: &mut [(usize, OnlineShowSearchResult)]) {
    results.sort_by(|(pos_a, a), (pos_b, b)| b.weight.cmp(&a.weight).then(pos_a.cmp(pos_b)));
}

/// Builds one enriched hit; lookup failures leave gaps instead of failing the hit
async fn enrich(
    catalog: &dyn ShowCatalog,
    platforms: &dyn PlatformResolver,
    show: TvMazeShow,
) -> OnlineShowSearchResult {
    let num_seasons = match catalog.fetch_seasons(show.id).await {
        Ok(seasons) => seasons.len(),
        Err(e) => {
            tracing::error!(
                catalog_id = show.id,
                error = %e,
                "Failed to fetch seasons, reporting none"
            );
            0
        }
    };

    let raw_platform_names = show.raw_platform_names();
    let lookup_keys: Vec<String> = raw_platform_names.iter().map(|n| n.to_lowercase()).collect();

    let resolved = if lookup_keys.is_empty() {
        Vec::new()
    } else {
        match platforms
            .lookup_by_external_names(&lookup_keys, catalog.name())
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    catalog_id = show.id,
                    error = %e,
                    "Failed to resolve platforms"
                );
                Vec::new()
            }
        }
    };

    OnlineShowSearchResult {
        catalog_id: show.id,
        image_urls: show.image_urls(),
        imdb_link: show.imdb_link(),
        name: show.name,
        weight: show.weight,
        num_seasons,
        platforms: resolved,
        raw_platform_names,
    }
}
