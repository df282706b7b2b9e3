use crate::{
    db::Database,
    error::AppResult,
    models::Platform,
    services::catalog::PlatformResolver,
};

#[derive(Clone, Debug)]
pub struct PlatformService {
    db: Database,
}

impl PlatformService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_platforms(&self) -> AppResult<Vec<Platform>> {
        self.db
            .timed("get_platforms", async {
                let platforms = sqlx::query_as::<_, Platform>(
                    "SELECT id, created_at, updated_at, name, icon
                     FROM platforms
                     ORDER BY name ASC",
                )
                .fetch_all(&self.db.pool)
                .await?;
                Ok(platforms)
            })
            .await
    }
}

/// Lower-cased, de-duplicated lookup keys in first-seen order
fn normalize_names(names: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let key = name.trim().to_lowercase();
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

#[async_trait::async_trait]
impl PlatformResolver for PlatformService {
    async fn lookup_by_external_names(
        &self,
        names: &[String],
        source: &str,
    ) -> AppResult<Vec<Platform>> {
        let keys = normalize_names(names);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        self.db
            .timed("lookup_platforms_by_external_names", async {
                let platforms = sqlx::query_as::<_, Platform>(
                    "SELECT DISTINCT p.id, p.created_at, p.updated_at, p.name, p.icon
                     FROM platforms AS p
                         INNER JOIN platform_aliases AS pa ON pa.platform_id = p.id
                     WHERE pa.source = $1 AND LOWER(pa.external_name) = ANY($2)
                     ORDER BY p.name ASC",
                )
                .bind(source)
                .bind(&keys)
                .fetch_all(&self.db.pool)
                .await?;

                tracing::debug!(
                    source = %source,
                    requested = keys.len(),
                    matched = platforms.len(),
                    "Resolved external platform names"
                );

                Ok(platforms)
            })
            .await
    }
}
