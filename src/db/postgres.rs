use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, acquire_timeout: Duration) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Pool handle shared by the database-backed services
///
/// Carries the per-operation timeout budget and the page size used by searches.
#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
    query_timeout: Duration,
    page_size: i64,
}

impl Database {
    pub fn new(pool: PgPool, query_timeout: Duration, page_size: i64) -> Self {
        Self {
            pool,
            query_timeout,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Runs one logical operation under the query timeout budget
    ///
    /// Database errors surfacing from `fut` are tagged with `operation`; an elapsed
    /// budget drops the in-flight future (rolling back any open transaction).
    pub async fn timed<T, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(Err(AppError::Database(source))) => {
                tracing::error!(operation, error = %source, "Database operation failed");
                Err(AppError::Query { operation, source })
            }
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Database operation timed out"
                );
                Err(AppError::Timeout(operation))
            }
        }
    }
}

/// Row offset for a 1-based page number; pages below 1 are treated as page 1
///
/// Offsets past `i64::MAX` saturate, which still selects an empty page.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size.max(0))
}
