use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A streaming platform known to this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub icon: String,
}
