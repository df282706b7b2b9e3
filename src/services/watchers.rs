use crate::{
    db::Database,
    error::{AppError, AppResult},
    models::{User, Watcher, WatcherWithUserInfo},
};

/// Decides whether the acting user may rename a watcher
///
/// A user may always rename the watcher linked to themselves. The account owner may
/// additionally rename manual watchers. Everything else is denied.
pub fn can_rename(target_user_id: Option<i64>, acting_user_id: i64, acting_is_owner: bool) -> bool {
    if target_user_id == Some(acting_user_id) {
        return true;
    }

    acting_is_owner && target_user_id.is_none()
}

#[derive(Clone, Debug)]
pub struct WatcherService {
    db: Database,
}

impl WatcherService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates the watcher that represents a user inside their account, named after
    /// their email
    pub async fn create_watcher_for_user(&self, user: &User) -> AppResult<Watcher> {
        let account_id = user.account_id.ok_or_else(|| {
            AppError::InvalidInput("User is not associated with an account".to_string())
        })?;

        self.db
            .timed("create_watcher_for_user", async {
                let watcher = sqlx::query_as::<_, Watcher>(
                    "INSERT INTO watchers (account_id, user_id, name)
                     VALUES ($1, $2, $3)
                     RETURNING id, account_id, user_id, NULL::TEXT AS user_email, name",
                )
                .bind(account_id)
                .bind(user.id)
                .bind(&user.email)
                .fetch_one(&self.db.pool)
                .await?;

                tracing::info!(account_id, user_id = user.id, watcher_id = watcher.id, "Watcher created for user");
                Ok(Watcher {
                    user_email: Some(user.email.clone()),
                    ..watcher
                })
            })
            .await
    }

    pub async fn create_watcher_manual(&self, account_id: i64, name: &str) -> AppResult<Watcher> {
        let name = validate_name(name)?;

        self.db
            .timed("create_watcher_manual", async {
                let watcher = sqlx::query_as::<_, Watcher>(
                    "INSERT INTO watchers (account_id, name)
                     VALUES ($1, $2)
                     RETURNING id, account_id, user_id, NULL::TEXT AS user_email, name",
                )
                .bind(account_id)
                .bind(name)
                .fetch_one(&self.db.pool)
                .await?;

                tracing::info!(account_id, watcher_id = watcher.id, "Manual watcher created");
                Ok(watcher)
            })
            .await
    }

    pub async fn get_watchers(&self, account_id: i64) -> AppResult<Vec<Watcher>> {
        self.db
            .timed("get_watchers", async {
                let watchers = sqlx::query_as::<_, Watcher>(
                    "SELECT w.id, w.account_id, w.user_id, u.email AS user_email, w.name
                     FROM watchers AS w
                         LEFT JOIN users AS u ON u.id = w.user_id
                     WHERE w.account_id = $1
                     ORDER BY w.name ASC, w.id ASC",
                )
                .bind(account_id)
                .fetch_all(&self.db.pool)
                .await?;
                Ok(watchers)
            })
            .await
    }

    /// Watchers of the account, owner first, each flagged with whether `current_user_id`
    /// may rename it
    pub async fn get_watchers_with_user_info(
        &self,
        account_id: i64,
        current_user_id: i64,
    ) -> AppResult<Vec<WatcherWithUserInfo>> {
        self.db
            .timed("get_watchers_with_user_info", async {
                let owner: i64 = sqlx::query_scalar("SELECT owner FROM accounts WHERE id = $1")
                    .bind(account_id)
                    .fetch_optional(&self.db.pool)
                    .await?
                    .ok_or(AppError::AccountNotFound)?;

                let mut watchers = sqlx::query_as::<_, WatcherWithUserInfo>(
                    "SELECT
                         w.id,
                         w.user_id,
                         u.email AS user_email,
                         w.name,
                         COALESCE(w.user_id = a.owner, false) AS is_owner
                     FROM watchers AS w
                         INNER JOIN accounts AS a ON a.id = w.account_id
                         LEFT JOIN users AS u ON u.id = w.user_id
                     WHERE w.account_id = $1
                     ORDER BY is_owner DESC, w.name ASC, w.id ASC",
                )
                .bind(account_id)
                .fetch_all(&self.db.pool)
                .await?;

                let acting_is_owner = owner == current_user_id;
                for watcher in &mut watchers {
                    watcher.can_edit = can_rename(watcher.user_id, current_user_id, acting_is_owner);
                }

                Ok(watchers)
            })
            .await
    }

    /// Renames a watcher if the acting user is allowed to
    ///
    /// The permission read and the rename share a transaction; concurrent renames of
    /// the same watcher resolve last-write-wins.
    pub async fn update_watcher_name(
        &self,
        account_id: i64,
        acting_user_id: i64,
        watcher_id: i64,
        name: &str,
    ) -> AppResult<()> {
        let name = validate_name(name)?;

        self.db
            .timed("update_watcher_name", async {
                let mut tx = self.db.pool.begin().await?;

                let (target_user_id, acting_is_owner): (Option<i64>, bool) = sqlx::query_as(
                    "SELECT w.user_id, (a.owner = $3) AS acting_is_owner
                     FROM watchers AS w
                         INNER JOIN accounts AS a ON a.id = w.account_id
                     WHERE w.id = $1 AND w.account_id = $2",
                )
                .bind(watcher_id)
                .bind(account_id)
                .bind(acting_user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(AppError::WatcherNotFound)?;

                if !can_rename(target_user_id, acting_user_id, acting_is_owner) {
                    tracing::warn!(account_id, acting_user_id, watcher_id, "Watcher rename denied");
                    return Err(AppError::PermissionDenied(
                        "you may not rename this watcher".to_string(),
                    ));
                }

                sqlx::query("UPDATE watchers SET name = $1 WHERE id = $2 AND account_id = $3")
                    .bind(name)
                    .bind(watcher_id)
                    .bind(account_id)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;

                tracing::info!(account_id, watcher_id, "Watcher renamed");
                Ok(())
            })
            .await
    }
}

fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Watcher name cannot be empty".to_string()));
    }
    Ok(name)
}
