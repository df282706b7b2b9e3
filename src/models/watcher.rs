use serde::{Deserialize, Serialize};

/// A household member whose progress is tracked per show
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Watcher {
    pub id: i64,
    pub account_id: i64,
    /// Linked login, `None` for a manual watcher
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub name: String,
}

impl Watcher {
    pub fn is_manual(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Watcher listing for the manage-watchers page
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatcherWithUserInfo {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_email: Option<String>,
    pub name: String,
    /// The watcher is linked to the account owner
    pub is_owner: bool,
    /// Whether the requesting user may rename this watcher
    #[sqlx(default)]
    pub can_edit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWatcherRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameWatcherRequest {
    pub name: String,
}
