use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::User,
};

use super::AppState;

/// Session resolved from the bearer token, cached per request
#[derive(Clone)]
struct ResolvedSession(Option<(User, Uuid)>);

/// The signed-in user, if any; invalid tokens are treated as anonymous
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// A signed-in user; rejects the request with 401 otherwise
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub user: User,
    pub token: Uuid,
}

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?;
    Uuid::parse_str(token.trim()).ok()
}

async fn resolve(parts: &mut Parts, state: &AppState) -> AppResult<Option<(User, Uuid)>> {
    if let Some(ResolvedSession(session)) = parts.extensions.get::<ResolvedSession>() {
        return Ok(session.clone());
    }

    let session = match bearer_token(&parts.headers) {
        Some(token) => state
            .store
            .session_user(token)
            .await?
            .map(|user| (user, token)),
        None => None,
    };

    parts.extensions.insert(ResolvedSession(session.clone()));
    Ok(session)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(resolve(parts, state).await?.map(|(user, _)| user)))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await? {
            Some((user, token)) => Ok(RequireUser { user, token }),
            None => Err(AppError::Unauthorized(
                "Please log in first".to_string(),
            )),
        }
    }
}
