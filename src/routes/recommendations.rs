use axum::{extract::State, Json};

use crate::{
    api::{AppState, CurrentUser},
    error::AppResult,
    models::ArticleSummary,
};

/// Articles related to the caller's recent bookmarks; empty when anonymous
pub async fn recommend(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<ArticleSummary>>> {
    let recommendations = state
        .feed
        .recommender()
        .recommend(&*state.store, user.as_ref())
        .await?;
    Ok(Json(recommendations))
}
