/// TVMaze catalog client
///
/// API Flow:
/// 1. Search: /search/shows?q= → scored show summaries
/// 2. Seasons: /shows/{id}/seasons → season list, only the count is used
/// 3. Single search: /singlesearch/shows?q= → best match, 404 when nothing matches
use crate::{
    error::{AppError, AppResult},
    models::{TvMazeSearchResult, TvMazeSeason, TvMazeShow},
    services::catalog::ShowCatalog,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::error::Category;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct TvMazeCatalog {
    http_client: HttpClient,
    api_url: String,
}

impl TvMazeCatalog {
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> AppResult<(StatusCode, String)> {
        let url = format!("{}{}", self.api_url, path);

        let response = self.http_client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok((status, body))
    }
}

/// Decodes a search response body
///
/// The API answers some queries with a body that is valid JSON but not a result list.
/// That shape is a data mismatch and means no matches; malformed JSON is an error.
pub fn decode_search_results(body: &str) -> AppResult<Vec<TvMazeSearchResult>> {
    match serde_json::from_str::<Vec<TvMazeSearchResult>>(body) {
        Ok(results) => Ok(results),
        Err(e) if e.classify() == Category::Data => {
            tracing::debug!(error = %e, "TVMaze search returned no result list");
            Ok(Vec::new())
        }
        Err(e) => Err(AppError::ExternalApi(format!(
            "TVMaze search response could not be decoded: {}",
            e
        ))),
    }
}

fn api_failure(status: StatusCode, body: String) -> AppError {
    tracing::error!(status = %status, body = %body, "TVMaze API request failed");
    AppError::ExternalApi(format!("TVMaze API returned status {}: {}", status, body))
}

#[async_trait::async_trait]
impl ShowCatalog for TvMazeCatalog {
    async fn search_shows(&self, query: &str) -> AppResult<Vec<TvMazeSearchResult>> {
        let (status, body) = self.get_text("/search/shows", &[("q", query)]).await?;

        if !status.is_success() {
            return Err(api_failure(status, body));
        }

        let results = decode_search_results(&body)?;
        tracing::debug!(query = %query, count = results.len(), "TVMaze search completed");

        Ok(results)
    }

    async fn fetch_seasons(&self, catalog_id: i64) -> AppResult<Vec<TvMazeSeason>> {
        let path = format!("/shows/{}/seasons", catalog_id);
        let (status, body) = self.get_text(&path, &[]).await?;

        if !status.is_success() {
            return Err(api_failure(status, body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::ExternalApi(format!("TVMaze season list could not be decoded: {}", e)))
    }

    async fn single_search(&self, name: &str) -> AppResult<Option<TvMazeShow>> {
        let (status, body) = self.get_text("/singlesearch/shows", &[("q", name)]).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(api_failure(status, body));
        }

        let show = serde_json::from_str(&body)
            .map_err(|e| AppError::ExternalApi(format!("TVMaze show could not be decoded: {}", e)))?;

        Ok(Some(show))
    }

    fn name(&self) -> &'static str {
        "tvmaze"
    }
}
