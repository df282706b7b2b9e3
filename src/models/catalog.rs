use serde::{Deserialize, Serialize};

use super::Platform;

const IMDB_TITLE_URL: &str = "https://www.imdb.com/title/";

// ============================================================================
// TVMaze API Types
// ============================================================================

/// One hit from GET /search/shows
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeSearchResult {
    #[serde(default)]
    pub score: f64,
    pub show: TvMazeShow,
}

/// Show summary as returned by the search and singlesearch endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvMazeShow {
    pub id: i64,
    pub name: String,
    /// Provider relevance weight
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub network: Option<TvMazeNetwork>,
    #[serde(default)]
    pub web_channel: Option<TvMazeNetwork>,
    #[serde(default)]
    pub externals: TvMazeExternals,
    #[serde(default)]
    pub image: Option<TvMazeImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeNetwork {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TvMazeExternals {
    #[serde(default)]
    pub tvrage: Option<i64>,
    #[serde(default)]
    pub thetvdb: Option<i64>,
    #[serde(default)]
    pub imdb: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TvMazeImage {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
}

/// Entry of GET /shows/{id}/seasons; only the count is used
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeSeason {
    pub id: i64,
    pub number: i32,
}

impl TvMazeShow {
    /// Poster URLs in medium, original order, skipping absent or blank ones
    pub fn image_urls(&self) -> Vec<String> {
        let Some(image) = &self.image else {
            return Vec::new();
        };

        [&image.medium, &image.original]
            .into_iter()
            .flatten()
            .filter(|url| !url.is_empty())
            .cloned()
            .collect()
    }

    /// Provider platform names, web channel first, broadcast network second
    pub fn raw_platform_names(&self) -> Vec<String> {
        [&self.web_channel, &self.network]
            .into_iter()
            .flatten()
            .map(|n| n.name.clone())
            .collect()
    }

    pub fn imdb_link(&self) -> Option<String> {
        self.externals
            .imdb
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(|id| format!("{}{}", IMDB_TITLE_URL, id))
    }

    pub fn medium_image(&self) -> Option<&str> {
        self.image
            .as_ref()
            .and_then(|i| i.medium.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// Enriched catalog hit returned by the online search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineShowSearchResult {
    pub catalog_id: i64,
    pub name: String,
    pub weight: i64,
    pub num_seasons: usize,
    pub image_urls: Vec<String>,
    pub imdb_link: Option<String>,
    pub platforms: Vec<Platform>,
    pub raw_platform_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_HIT: &str = r#"{
        "score": 0.91,
        "show": {
            "id": 431,
            "url": "https://www.tvmaze.com/shows/431/friends",
            "name": "Friends",
            "type": "Scripted",
            "language": "English",
            "weight": 99,
            "network": {"id": 1, "name": "NBC", "country": {"name": "United States", "code": "US", "timezone": "America/New_York"}},
            "webChannel": null,
            "externals": {"tvrage": 3616, "thetvdb": 79168, "imdb": "tt0108778"},
            "image": {
                "medium": "https://static.tvmaze.com/medium/41.jpg",
                "original": "https://static.tvmaze.com/original/41.jpg"
            }
        }
    }"#;

    #[test]
    fn test_search_hit_deserialization() {
        let hit: TvMazeSearchResult = serde_json::from_str(SEARCH_HIT).unwrap();
        assert_eq!(hit.show.id, 431);
        assert_eq!(hit.show.name, "Friends");
        assert_eq!(hit.show.weight, 99);
        assert!(hit.show.web_channel.is_none());
        assert_eq!(hit.show.network.as_ref().unwrap().name, "NBC");
        assert_eq!(hit.show.externals.imdb.as_deref(), Some("tt0108778"));
    }

    #[test]
    fn test_image_urls_medium_then_original() {
        let hit: TvMazeSearchResult = serde_json::from_str(SEARCH_HIT).unwrap();
        assert_eq!(
            hit.show.image_urls(),
            vec![
                "https://static.tvmaze.com/medium/41.jpg".to_string(),
                "https://static.tvmaze.com/original/41.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_image_urls_missing_image() {
        let show = TvMazeShow {
            image: Some(TvMazeImage {
                medium: Some(String::new()),
                original: None,
            }),
            ..Default::default()
        };
        assert!(show.image_urls().is_empty());
        assert_eq!(show.medium_image(), None);
        assert!(TvMazeShow::default().image_urls().is_empty());
    }

    #[test]
    fn test_raw_platform_names_prefers_web_channel() {
        let show = TvMazeShow {
            network: Some(TvMazeNetwork {
                id: 1,
                name: "HBO".to_string(),
            }),
            web_channel: Some(TvMazeNetwork {
                id: 329,
                name: "Max".to_string(),
            }),
            ..Default::default()
        };
        assert_eq!(
            show.raw_platform_names(),
            vec!["Max".to_string(), "HBO".to_string()]
        );
    }

    #[test]
    fn test_imdb_link() {
        let hit: TvMazeSearchResult = serde_json::from_str(SEARCH_HIT).unwrap();
        assert_eq!(
            hit.show.imdb_link().as_deref(),
            Some("https://www.imdb.com/title/tt0108778")
        );

        let blank = TvMazeShow {
            externals: TvMazeExternals {
                imdb: Some(String::new()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(blank.imdb_link(), None);
    }

    #[test]
    fn test_season_list_deserialization() {
        let json = r#"[
            {"id": 1, "url": "https://www.tvmaze.com/seasons/1", "number": 1, "name": ""},
            {"id": 2, "url": "https://www.tvmaze.com/seasons/2", "number": 2, "name": ""}
        ]"#;
        let seasons: Vec<TvMazeSeason> = serde_json::from_str(json).unwrap();
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[1].number, 2);
    }
}
