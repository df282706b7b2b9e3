use crate::{
    db::Database,
    error::{AppError, AppResult},
    models::{CreateUserRequest, User},
    services::identity::{new_token, password},
};

const USER_COLUMNS: &str = "id, created_at, active, email, password, account_id, activation_code";

#[derive(Clone, Debug)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an inactive user with a fresh activation code
    ///
    /// The user is not associated with any account yet.
    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<User> {
        let email = normalize_email(&request.email)?;
        password::validate_password(&request.password)?;
        let hashed = password::hash_password(&request.password)?;
        let activation_code = new_token();

        self.db
            .timed("create_user", async {
                let query = format!(
                    "INSERT INTO users (active, email, password, activation_code)
                     VALUES (false, $1, $2, $3)
                     RETURNING {USER_COLUMNS}"
                );

                let user = sqlx::query_as::<_, User>(&query)
                    .bind(&email)
                    .bind(&hashed)
                    .bind(&activation_code)
                    .fetch_one(&self.db.pool)
                    .await
                    .map_err(AppError::from)
                    .map_err(|e| {
                        if e.is_unique_violation() {
                            AppError::UserAlreadyExists
                        } else {
                            e
                        }
                    })?;

                tracing::info!(user_id = user.id, "User created");
                Ok(user)
            })
            .await
    }

    /// Marks the user active and consumes the activation code
    pub async fn activate_user(&self, activation_code: &str) -> AppResult<()> {
        self.db
            .timed("activate_user", async {
                let result = sqlx::query(
                    "UPDATE users SET active = true, activation_code = NULL
                     WHERE activation_code = $1",
                )
                .bind(activation_code)
                .execute(&self.db.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::ActivationCodeNotFound);
                }

                Ok(())
            })
            .await
    }

    pub async fn get_user_by_activation_code(&self, activation_code: &str) -> AppResult<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE activation_code = $1");

        self.db
            .timed("get_user_by_activation_code", async {
                sqlx::query_as::<_, User>(&query)
                    .bind(activation_code)
                    .fetch_optional(&self.db.pool)
                    .await?
                    .ok_or(AppError::ActivationCodeNotFound)
            })
            .await
    }

    /// Active user with this email
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        let email = normalize_email(email)?;
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND active = true");

        self.db
            .timed("get_user_by_email", async {
                sqlx::query_as::<_, User>(&query)
                    .bind(&email)
                    .fetch_optional(&self.db.pool)
                    .await?
                    .ok_or(AppError::UserNotFound)
            })
            .await
    }

    /// Active user matching both email and password
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn verify_credentials(&self, email: &str, plain_password: &str) -> AppResult<User> {
        let user = match self.get_user_by_email(email).await {
            Ok(user) => user,
            Err(AppError::UserNotFound) | Err(AppError::InvalidInput(_)) => {
                return Err(AppError::InvalidCredentials)
            }
            Err(e) => return Err(e),
        };

        if !password::verify_password(plain_password, &user.password)? {
            tracing::warn!(user_id = user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn add_user_to_account(&self, user_id: i64, account_id: i64) -> AppResult<()> {
        self.db
            .timed("add_user_to_account", async {
                let result = sqlx::query("UPDATE users SET account_id = $1 WHERE id = $2")
                    .bind(account_id)
                    .bind(user_id)
                    .execute(&self.db.pool)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::UserNotFound);
                }

                tracing::info!(user_id, account_id, "User joined account");
                Ok(())
            })
            .await
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::InvalidInput("A valid email address is required".to_string())),
    }
}
