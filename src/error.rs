use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("show not found")]
    ShowNotFound,

    #[error("show has watched seasons and cannot be deleted")]
    ShowHasWatchedSeasons,

    #[error("show has been cancelled and cannot be changed")]
    ShowCancelled,

    #[error("watcher not found")]
    WatcherNotFound,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("activation code not found")]
    ActivationCodeNotFound,

    #[error("account not found")]
    AccountNotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("missing account or user identity on request")]
    MissingActor,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database error during {operation}: {source}")]
    Query {
        operation: &'static str,
        source: sqlx::Error,
    },

    #[error("Timed out during {0}")]
    Timeout(&'static str),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True when the database rejected a write because of a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        let source = match self {
            AppError::Database(e) | AppError::Query { source: e, .. } => e,
            _ => return false,
        };

        matches!(source, sqlx::Error::Database(db) if db.is_unique_violation())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ShowNotFound
            | AppError::WatcherNotFound
            | AppError::UserNotFound
            | AppError::ActivationCodeNotFound
            | AppError::AccountNotFound => StatusCode::NOT_FOUND,
            AppError::ShowHasWatchedSeasons
            | AppError::ShowCancelled
            | AppError::UserAlreadyExists => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials | AppError::MissingActor => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ExternalApi(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Query { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
