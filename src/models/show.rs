use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Watch-state of a show within an account
///
/// Discriminants match the ids seeded into the `watch_status` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    WantToWatch = 1,
    Watching = 2,
    Finished = 3,
}

impl WatchStatus {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(WatchStatus::WantToWatch),
            2 => Some(WatchStatus::Watching),
            3 => Some(WatchStatus::Finished),
            _ => None,
        }
    }

    /// Display label, as stored in `watch_status.status`
    pub fn label(self) -> &'static str {
        match self {
            WatchStatus::WantToWatch => "Want to Watch",
            WatchStatus::Watching => "Watching",
            WatchStatus::Finished => "Finished",
        }
    }
}

/// The per-account state machine record of a show
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShowStatus {
    pub show_id: i64,
    pub account_id: i64,
    pub watch_status_id: i32,
    pub current_season: i32,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ShowStatus {
    pub fn watch_status(&self) -> Option<WatchStatus> {
        WatchStatus::from_id(self.watch_status_id)
    }
}

/// One row of the show/status/watcher relation
///
/// Watchers sharing a show are collapsed into `watcher_name`, alphabetically and
/// comma-joined.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShowRow {
    pub show_id: i64,
    pub show_name: String,
    pub num_seasons: i32,
    pub platform_name: Option<String>,
    pub platform_icon: Option<String>,
    pub cancelled: bool,
    pub date_cancelled: Option<DateTime<Utc>>,
    pub watch_status_id: i32,
    pub watch_status: String,
    pub current_season: i32,
    pub finished_at: Option<DateTime<Utc>>,
    pub watcher_name: String,
    pub poster_image: String,
}

/// Search row carrying the total match count of the filtered set
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchShowRow {
    #[sqlx(flatten)]
    pub show: ShowRow,
    pub total_count: i64,
}

/// Dashboard item inside a two-level show grouping
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowGroupItem {
    pub show_id: i64,
    pub show_name: String,
    pub num_seasons: i32,
    pub platform_name: String,
    pub platform_icon: String,
    pub cancelled: bool,
    pub date_cancelled: Option<DateTime<Utc>>,
    pub watch_status: String,
    pub current_season: i32,
    pub finished_at: Option<DateTime<Utc>>,
    pub watcher_name: String,
    pub poster_image: String,
}

impl From<ShowRow> for ShowGroupItem {
    fn from(row: ShowRow) -> Self {
        Self {
            show_id: row.show_id,
            show_name: row.show_name,
            num_seasons: row.num_seasons,
            platform_name: row.platform_name.unwrap_or_default(),
            platform_icon: row.platform_icon.unwrap_or_default(),
            cancelled: row.cancelled,
            date_cancelled: row.date_cancelled,
            watch_status: row.watch_status,
            current_season: row.current_season,
            finished_at: row.finished_at,
            watcher_name: row.watcher_name,
            poster_image: row.poster_image,
        }
    }
}

/// Show as loaded for the edit page
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShowForEdit {
    pub id: i64,
    pub name: String,
    pub num_seasons: i32,
    pub platform_id: Option<i64>,
    pub watcher_ids: Vec<i64>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled: bool,
    pub date_cancelled: Option<DateTime<Utc>>,
    pub poster_image: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddShowRequest {
    pub name: String,
    pub total_seasons: i32,
    #[serde(default)]
    pub platform_id: Option<i64>,
    #[serde(default)]
    pub watcher_ids: Vec<i64>,
    #[serde(default)]
    pub poster_image: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditShowRequest {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub total_seasons: i32,
    #[serde(default)]
    pub platform_id: Option<i64>,
    #[serde(default)]
    pub watcher_ids: Vec<i64>,
    #[serde(default)]
    pub poster_image: String,
}
