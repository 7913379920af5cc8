use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    api::{AppState, RequireUser},
    error::AppResult,
    models::{LoginRequest, SignupRequest, UsernameUpdate},
    services::accounts::{self, Profile, Session},
};

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<Session>)> {
    let session = accounts::register(&*state.store, request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<Session>> {
    let session = accounts::authenticate(&*state.store, request).await?;
    tracing::info!(user_id = session.user.id, "User logged in");
    Ok(Json(session))
}

pub async fn logout(
    State(state): State<AppState>,
    RequireUser { user, token }: RequireUser,
) -> AppResult<StatusCode> {
    accounts::logout(&*state.store, token).await?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// The user with their bookmarked articles and selected categories
pub async fn profile(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
) -> AppResult<Json<Profile>> {
    Ok(Json(accounts::profile(&*state.store, user).await?))
}

pub async fn update_username(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Json(request): Json<UsernameUpdate>,
) -> AppResult<Json<Value>> {
    let user = accounts::change_username(&*state.store, &user, request).await?;
    Ok(Json(json!({ "user": user })))
}
