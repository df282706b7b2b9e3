use sqlx::{postgres::PgExecutor, Postgres, Transaction};

use crate::{
    db::Database,
    error::{AppError, AppResult},
    models::{
        AddShowRequest, EditShowRequest, SearchShowRow, ShowForEdit, ShowRow, ShowStatus,
        WatchStatus,
    },
    services::{
        grouping::{self, ShowGroups},
        search::{self, SearchPage, SearchShowsOptions, SHOW_ROW_GROUP_BY, SHOW_ROW_SELECT},
    },
};

/// Watch-state engine and show reads for one account at a time
///
/// Every mutation is scoped by account and runs as a single conditional statement or
/// inside one transaction; zero affected rows on the primary statement is an error.
#[derive(Clone, Debug)]
pub struct ShowService {
    db: Database,
}

impl ShowService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn page_size(&self) -> i64 {
        self.db.page_size()
    }

    /// Creates the show, its Want-to-Watch status record and the watcher links
    pub async fn add_show(&self, account_id: i64, request: AddShowRequest) -> AppResult<i64> {
        validate_show_fields(&request.name, request.total_seasons)?;

        self.db
            .timed("add_show", async {
                let mut tx = self.db.pool.begin().await?;

                let show_id: i64 = sqlx::query_scalar(
                    "INSERT INTO shows (account_id, name, num_seasons, platform_id, poster_image)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id",
                )
                .bind(account_id)
                .bind(request.name.trim())
                .bind(request.total_seasons)
                .bind(request.platform_id)
                .bind(&request.poster_image)
                .fetch_one(&mut *tx)
                .await?;

                let show_status_id: i64 = sqlx::query_scalar(
                    "INSERT INTO show_status (show_id, account_id, watch_status_id, current_season)
                     VALUES ($1, $2, $3, 0)
                     RETURNING id",
                )
                .bind(show_id)
                .bind(account_id)
                .bind(WatchStatus::WantToWatch.id())
                .fetch_one(&mut *tx)
                .await?;

                for watcher_id in &request.watcher_ids {
                    link_watcher(&mut tx, account_id, show_status_id, *watcher_id).await?;
                }

                tx.commit().await?;

                tracing::info!(
                    account_id,
                    show_id,
                    watchers = request.watcher_ids.len(),
                    "Show added"
                );

                Ok(show_id)
            })
            .await
    }

    /// Moves the show to Watching; a show that was never started begins at season 1
    pub async fn start_watching(&self, account_id: i64, show_id: i64) -> AppResult<()> {
        self.db
            .timed("start_watching", async {
                let result = sqlx::query(
                    "UPDATE show_status AS ss
                     SET watch_status_id = $3,
                         current_season = CASE WHEN ss.current_season = 0 THEN 1 ELSE ss.current_season END,
                         finished_at = NULL
                     FROM shows AS s
                     WHERE ss.show_id = s.id
                         AND ss.show_id = $1
                         AND ss.account_id = $2
                         AND NOT s.cancelled",
                )
                .bind(show_id)
                .bind(account_id)
                .bind(WatchStatus::Watching.id())
                .execute(&self.db.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(missing_show_error(&self.db.pool, account_id, show_id).await?);
                }

                tracing::debug!(account_id, show_id, "Started watching");
                Ok(())
            })
            .await
    }

    /// Finishes the current season in one conditional update
    ///
    /// On the last season the show becomes Finished and keeps its season; otherwise the
    /// season advances. The store evaluates the condition against the locked row, so
    /// concurrent finishers cannot double-advance.
    pub async fn finish_season(&self, account_id: i64, show_id: i64) -> AppResult<()> {
        self.db
            .timed("finish_season", async {
                let result = sqlx::query(
                    "UPDATE show_status AS ss
                     SET current_season = CASE
                             WHEN ss.current_season >= s.num_seasons THEN ss.current_season
                             ELSE ss.current_season + 1
                         END,
                         watch_status_id = CASE
                             WHEN ss.current_season >= s.num_seasons THEN $3
                             ELSE ss.watch_status_id
                         END,
                         finished_at = CASE
                             WHEN ss.current_season >= s.num_seasons THEN COALESCE(ss.finished_at, NOW())
                             ELSE ss.finished_at
                         END
                     FROM shows AS s
                     WHERE ss.show_id = s.id
                         AND ss.show_id = $1
                         AND ss.account_id = $2
                         AND NOT s.cancelled",
                )
                .bind(show_id)
                .bind(account_id)
                .bind(WatchStatus::Finished.id())
                .execute(&self.db.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(missing_show_error(&self.db.pool, account_id, show_id).await?);
                }

                tracing::debug!(account_id, show_id, "Season finished");
                Ok(())
            })
            .await
    }

    /// Records a newly released season and puts the show back in the cycle
    ///
    /// Both the season counter and the show's season total grow by one.
    pub async fn add_season(&self, account_id: i64, show_id: i64) -> AppResult<()> {
        self.db
            .timed("add_season", async {
                let mut tx = self.db.pool.begin().await?;

                let result = sqlx::query(
                    "UPDATE show_status AS ss
                     SET finished_at = NULL,
                         watch_status_id = $3,
                         current_season = ss.current_season + 1
                     FROM shows AS s
                     WHERE ss.show_id = s.id
                         AND ss.show_id = $1
                         AND ss.account_id = $2
                         AND NOT s.cancelled",
                )
                .bind(show_id)
                .bind(account_id)
                .bind(WatchStatus::WantToWatch.id())
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(missing_show_error(&mut *tx, account_id, show_id).await?);
                }

                let result = sqlx::query(
                    "UPDATE shows
                     SET num_seasons = num_seasons + 1, updated_at = NOW()
                     WHERE id = $1 AND account_id = $2",
                )
                .bind(show_id)
                .bind(account_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::ShowNotFound);
                }

                tx.commit().await?;

                tracing::info!(account_id, show_id, "Season added");
                Ok(())
            })
            .await
    }

    pub async fn back_to_want_to_watch(&self, account_id: i64, show_id: i64) -> AppResult<()> {
        self.db
            .timed("back_to_want_to_watch", async {
                let result = sqlx::query(
                    "UPDATE show_status AS ss
                     SET watch_status_id = $3, finished_at = NULL
                     FROM shows AS s
                     WHERE ss.show_id = s.id
                         AND ss.show_id = $1
                         AND ss.account_id = $2
                         AND NOT s.cancelled",
                )
                .bind(show_id)
                .bind(account_id)
                .bind(WatchStatus::WantToWatch.id())
                .execute(&self.db.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(missing_show_error(&self.db.pool, account_id, show_id).await?);
                }

                Ok(())
            })
            .await
    }

    /// Marks the show cancelled; the status record is left as it is
    ///
    /// Re-cancelling succeeds and keeps the first cancellation date.
    pub async fn cancel_show(&self, account_id: i64, show_id: i64) -> AppResult<()> {
        self.db
            .timed("cancel_show", async {
                let result = sqlx::query(
                    "UPDATE shows
                     SET cancelled = true,
                         date_cancelled = COALESCE(date_cancelled, NOW()),
                         updated_at = NOW()
                     WHERE id = $1 AND account_id = $2",
                )
                .bind(show_id)
                .bind(account_id)
                .execute(&self.db.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::ShowNotFound);
                }

                tracing::info!(account_id, show_id, "Show cancelled");
                Ok(())
            })
            .await
    }

    /// Updates the show and, when watchers are given, replaces its watcher links
    pub async fn update_show(&self, account_id: i64, request: EditShowRequest) -> AppResult<()> {
        validate_show_fields(&request.name, request.total_seasons)?;

        self.db
            .timed("update_show", async {
                let mut tx = self.db.pool.begin().await?;

                let result = sqlx::query(
                    "UPDATE shows
                     SET name = $1, num_seasons = $2, platform_id = $3, poster_image = $4,
                         updated_at = NOW()
                     WHERE id = $5 AND account_id = $6 AND NOT cancelled",
                )
                .bind(request.name.trim())
                .bind(request.total_seasons)
                .bind(request.platform_id)
                .bind(&request.poster_image)
                .bind(request.id)
                .bind(account_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(missing_show_error(&mut *tx, account_id, request.id).await?);
                }

                if !request.watcher_ids.is_empty() {
                    let show_status_id: i64 = sqlx::query_scalar(
                        "SELECT id FROM show_status WHERE show_id = $1 AND account_id = $2",
                    )
                    .bind(request.id)
                    .bind(account_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(AppError::ShowNotFound)?;

                    sqlx::query("DELETE FROM watchers_to_show_statuses WHERE show_status_id = $1")
                        .bind(show_status_id)
                        .execute(&mut *tx)
                        .await?;

                    for watcher_id in &request.watcher_ids {
                        link_watcher(&mut tx, account_id, show_status_id, *watcher_id).await?;
                    }
                }

                tx.commit().await?;

                tracing::info!(account_id, show_id = request.id, "Show updated");
                Ok(())
            })
            .await
    }

    /// Deletes a show that was never started
    ///
    /// The season check and the three deletes run in one transaction, with the status
    /// row locked for its duration.
    pub async fn delete_show(&self, account_id: i64, show_id: i64) -> AppResult<()> {
        self.db
            .timed("delete_show", async {
                let mut tx = self.db.pool.begin().await?;

                let (show_status_id, current_season): (i64, i32) = sqlx::query_as(
                    "SELECT id, current_season
                     FROM show_status
                     WHERE show_id = $1 AND account_id = $2
                     FOR UPDATE",
                )
                .bind(show_id)
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(AppError::ShowNotFound)?;

                if current_season > 0 {
                    return Err(AppError::ShowHasWatchedSeasons);
                }

                sqlx::query("DELETE FROM watchers_to_show_statuses WHERE show_status_id = $1")
                    .bind(show_status_id)
                    .execute(&mut *tx)
                    .await?;

                sqlx::query("DELETE FROM show_status WHERE id = $1")
                    .bind(show_status_id)
                    .execute(&mut *tx)
                    .await?;

                let result = sqlx::query("DELETE FROM shows WHERE id = $1 AND account_id = $2")
                    .bind(show_id)
                    .bind(account_id)
                    .execute(&mut *tx)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::ShowNotFound);
                }

                tx.commit().await?;

                tracing::info!(account_id, show_id, "Show deleted");
                Ok(())
            })
            .await
    }

    pub async fn get_show_by_id(&self, account_id: i64, show_id: i64) -> AppResult<ShowForEdit> {
        self.db
            .timed("get_show_by_id", async {
                sqlx::query_as::<_, ShowForEdit>(
                    "SELECT
                         s.id,
                         s.name,
                         s.num_seasons,
                         s.platform_id,
                         COALESCE(
                             array_agg(wtss.watcher_id ORDER BY wtss.watcher_id)
                                 FILTER (WHERE wtss.watcher_id IS NOT NULL),
                             '{}'
                         ) AS watcher_ids,
                         ss.finished_at,
                         s.cancelled,
                         s.date_cancelled,
                         s.poster_image
                     FROM shows AS s
                         INNER JOIN show_status AS ss ON ss.show_id = s.id AND ss.account_id = s.account_id
                         LEFT JOIN watchers_to_show_statuses AS wtss ON wtss.show_status_id = ss.id
                     WHERE s.account_id = $1 AND s.id = $2
                     GROUP BY s.id, ss.finished_at",
                )
                .bind(account_id)
                .bind(show_id)
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or(AppError::ShowNotFound)
            })
            .await
    }

    pub async fn get_show_status(&self, account_id: i64, show_id: i64) -> AppResult<ShowStatus> {
        self.db
            .timed("get_show_status", async {
                sqlx::query_as::<_, ShowStatus>(
                    "SELECT show_id, account_id, watch_status_id, current_season, finished_at
                     FROM show_status
                     WHERE show_id = $1 AND account_id = $2",
                )
                .bind(show_id)
                .bind(account_id)
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or(AppError::ShowNotFound)
            })
            .await
    }

    /// Active shows keyed by status label, then by watcher-name group
    pub async fn get_active_shows_grouped_by_status_and_watchers(
        &self,
        account_id: i64,
    ) -> AppResult<ShowGroups> {
        let rows = self
            .fetch_active_rows(
                "get_active_shows_by_status",
                "ss.watch_status_id DESC, s.name ASC",
                account_id,
            )
            .await?;

        Ok(grouping::group_by_status_then_watcher(rows))
    }

    /// Active shows keyed by watcher-name group, then by status label
    pub async fn get_active_shows_grouped_by_watchers_and_status(
        &self,
        account_id: i64,
    ) -> AppResult<ShowGroups> {
        let rows = self
            .fetch_active_rows(
                "get_active_shows_by_watcher",
                "watcher_name ASC, ss.watch_status_id DESC, s.name ASC",
                account_id,
            )
            .await?;

        Ok(grouping::group_by_watcher_then_status(rows))
    }

    pub async fn get_finished_shows(&self, account_id: i64) -> AppResult<Vec<ShowRow>> {
        let query = format!(
            "{SHOW_ROW_SELECT} WHERE ss.account_id = $1 AND ss.watch_status_id = $2 \
             {SHOW_ROW_GROUP_BY} ORDER BY s.name ASC"
        );

        self.db
            .timed("get_finished_shows", async {
                let rows = sqlx::query_as::<_, ShowRow>(&query)
                    .bind(account_id)
                    .bind(WatchStatus::Finished.id())
                    .fetch_all(&self.db.pool)
                    .await?;
                Ok(rows)
            })
            .await
    }

    /// One page of the account's shows in any state, ordered by name
    pub async fn search_shows(
        &self,
        account_id: i64,
        options: SearchShowsOptions,
    ) -> AppResult<SearchPage<ShowRow>> {
        let page_size = self.db.page_size();

        self.db
            .timed("search_shows", async {
                let mut qb = search::build_search_query(account_id, &options, page_size);
                let rows = qb
                    .build_query_as::<SearchShowRow>()
                    .fetch_all(&self.db.pool)
                    .await?;

                let total_count = match rows.first() {
                    Some(row) => row.total_count,
                    None => {
                        let mut count = search::build_count_query(account_id, &options);
                        count
                            .build_query_scalar::<i64>()
                            .fetch_one(&self.db.pool)
                            .await?
                    }
                };

                tracing::debug!(
                    account_id,
                    page = options.effective_page(),
                    total_count,
                    "Show search completed"
                );

                Ok(SearchPage {
                    items: rows.into_iter().map(|r| r.show).collect(),
                    page: options.effective_page(),
                    total_count,
                })
            })
            .await
    }

    async fn fetch_active_rows(
        &self,
        operation: &'static str,
        order_by: &str,
        account_id: i64,
    ) -> AppResult<Vec<ShowRow>> {
        let query = format!(
            "{SHOW_ROW_SELECT} WHERE ss.account_id = $1 AND ss.watch_status_id IN ($2, $3) \
             {SHOW_ROW_GROUP_BY} ORDER BY {order_by}"
        );

        self.db
            .timed(operation, async {
                let rows = sqlx::query_as::<_, ShowRow>(&query)
                    .bind(account_id)
                    .bind(WatchStatus::WantToWatch.id())
                    .bind(WatchStatus::Watching.id())
                    .fetch_all(&self.db.pool)
                    .await?;
                Ok(rows)
            })
            .await
    }
}

fn validate_show_fields(name: &str, total_seasons: i32) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("Show name cannot be empty".to_string()));
    }

    if total_seasons < 0 {
        return Err(AppError::InvalidInput(
            "Total seasons cannot be negative".to_string(),
        ));
    }

    Ok(())
}

/// Links a watcher of the same account to a show status
async fn link_watcher(
    tx: &mut Transaction<'_, Postgres>,
    account_id: i64,
    show_status_id: i64,
    watcher_id: i64,
) -> AppResult<()> {
    let result = sqlx::query(
        "INSERT INTO watchers_to_show_statuses (watcher_id, show_status_id)
         SELECT w.id, $2 FROM watchers AS w WHERE w.id = $1 AND w.account_id = $3
         ON CONFLICT DO NOTHING",
    )
    .bind(watcher_id)
    .bind(show_status_id)
    .bind(account_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM watchers WHERE id = $1 AND account_id = $2)",
        )
        .bind(watcher_id)
        .bind(account_id)
        .fetch_one(&mut **tx)
        .await?;

        if !exists {
            tracing::warn!(account_id, watcher_id, "Watcher not found in account");
            return Err(AppError::WatcherNotFound);
        }
    }

    Ok(())
}

/// Explains why a guarded show update matched no row
async fn missing_show_error<'e, E>(executor: E, account_id: i64, show_id: i64) -> AppResult<AppError>
where
    E: PgExecutor<'e>,
{
    let cancelled: Option<bool> =
        sqlx::query_scalar("SELECT cancelled FROM shows WHERE id = $1 AND account_id = $2")
            .bind(show_id)
            .bind(account_id)
            .fetch_optional(executor)
            .await?;

    Ok(match cancelled {
        Some(true) => AppError::ShowCancelled,
        _ => AppError::ShowNotFound,
    })
}
