use crate::{
    db::Database,
    error::{AppError, AppResult},
    models::Account,
    services::identity::new_token,
};

#[derive(Clone, Debug)]
pub struct AccountService {
    db: Database,
}

impl AccountService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an account owned by `owner_id` with a fresh join token
    ///
    /// When `associate_to_user` is set, that user joins the new account in the same
    /// transaction.
    pub async fn create_account(
        &self,
        owner_id: i64,
        associate_to_user: Option<i64>,
    ) -> AppResult<Account> {
        let join_token = new_token();

        self.db
            .timed("create_account", async {
                let mut tx = self.db.pool.begin().await?;

                let account = sqlx::query_as::<_, Account>(
                    "INSERT INTO accounts (owner, join_token)
                     VALUES ($1, $2)
                     RETURNING id, owner, join_token",
                )
                .bind(owner_id)
                .bind(&join_token)
                .fetch_one(&mut *tx)
                .await?;

                if let Some(user_id) = associate_to_user {
                    let result = sqlx::query("UPDATE users SET account_id = $1 WHERE id = $2")
                        .bind(account.id)
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await?;

                    if result.rows_affected() == 0 {
                        return Err(AppError::UserNotFound);
                    }
                }

                tx.commit().await?;

                tracing::info!(account_id = account.id, owner_id, "Account created");
                Ok(account)
            })
            .await
    }

    pub async fn get_account_by_join_token(&self, join_token: &str) -> AppResult<Account> {
        self.db
            .timed("get_account_by_join_token", async {
                sqlx::query_as::<_, Account>(
                    "SELECT id, owner, join_token FROM accounts WHERE join_token = $1",
                )
                .bind(join_token.trim())
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or(AppError::AccountNotFound)
            })
            .await
    }
}
