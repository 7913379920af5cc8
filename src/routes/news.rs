use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{AppState, CurrentUser},
    error::{AppError, AppResult},
    models::NewsCategory,
    services::{
        feed::{HomeFeed, SearchResults},
        providers::{HeadlinesQuery, DEFAULT_COUNTRY},
    },
};

#[derive(Debug, Deserialize)]
pub struct TopHeadlinesParams {
    country: Option<String>,
    category: Option<String>,
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

pub async fn top_headlines(
    State(state): State<AppState>,
    Query(params): Query<TopHeadlinesParams>,
) -> AppResult<Json<Value>> {
    let category = params
        .category
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.parse::<NewsCategory>().map_err(AppError::InvalidInput))
        .transpose()?;

    let query = HeadlinesQuery {
        country: params
            .country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        category,
        page_size: params.page_size,
    };
    let articles = state.feed.top_headlines(&query).await?;
    Ok(Json(json!({ "articles": articles })))
}

pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<SearchResults>> {
    let results = state
        .feed
        .search(&*state.store, user.as_ref(), &params.q)
        .await?;
    Ok(Json(results))
}

pub async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<HomeFeed>> {
    Ok(Json(state.feed.home(&*state.store, user.as_ref()).await?))
}
