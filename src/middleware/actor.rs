use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const USER_ID_HEADER: &str = "x-user-id";

/// Account and user on whose behalf a request runs
///
/// Set by the authenticating proxy in front of this service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub account_id: i64,
    pub user_id: i64,
}

fn header_id(parts: &Parts, name: &str) -> Option<i64> {
    parts
        .headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match (
            header_id(parts, ACCOUNT_ID_HEADER),
            header_id(parts, USER_ID_HEADER),
        ) {
            (Some(account_id), Some(user_id)) => Ok(Actor {
                account_id,
                user_id,
            }),
            _ => {
                tracing::debug!(uri = %parts.uri, "Request without actor headers");
                Err(AppError::MissingActor)
            }
        }
    }
}
