use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{AppState, CurrentUser, RequireUser},
    error::AppResult,
    models::{CategorySelection, NewsCategory},
};

#[derive(Debug, Deserialize)]
pub struct HeadlinesParams {
    page_size: Option<u32>,
}

/// Every category, plus the caller's selection when signed in
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let selected = match user {
        Some(user) => state.store.user_categories(user.id).await?,
        None => Vec::new(),
    };
    Ok(Json(json!({
        "categories": NewsCategory::ALL,
        "selected": selected,
    })))
}

pub async fn headlines(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HeadlinesParams>,
) -> AppResult<Json<Value>> {
    let (category, articles) = state
        .feed
        .category_headlines(&name, params.page_size)
        .await?;
    Ok(Json(json!({
        "category": category,
        "articles": articles,
    })))
}

/// Replaces the caller's category selection
pub async fn update_user_categories(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Json(selection): Json<CategorySelection>,
) -> AppResult<Json<Value>> {
    let categories = state
        .store
        .set_user_categories(user.id, &selection.categories)
        .await?;
    tracing::info!(user_id = user.id, count = categories.len(), "Updated categories");
    Ok(Json(json!({ "categories": categories })))
}
