use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{AppState, RequireUser},
    db::Commit,
    error::{AppError, AppResult},
    models::{FieldErrors, NewArticle, Validate},
};

#[derive(Debug, Deserialize)]
pub struct ArticleLookup {
    article_url: Option<String>,
}

/// Stores an article the user is about to bookmark
///
/// Answers 201 with the new article, or 200 with the stored one when the URL
/// is already known.
pub async fn create_article(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Json(article): Json<NewArticle>,
) -> AppResult<(StatusCode, Json<Value>)> {
    article.validate()?;

    if !state.url_checker.is_valid(&article.url).await {
        return Err(FieldErrors::single("url", "Not a valid url.").into());
    }

    if let Some(existing) = state.store.find_article_by_url(&article.url).await? {
        return Ok((StatusCode::OK, Json(json!({ "article": existing }))));
    }

    let url = article.url.clone();
    match state.store.create_article(article).await {
        Commit::Committed(created) => {
            tracing::info!(user_id = user.id, article_id = created.id, "Article created");
            Ok((StatusCode::CREATED, Json(json!({ "article": created }))))
        }
        // Lost a race with another request for the same URL
        Commit::Duplicate => {
            let existing = state
                .store
                .find_article_by_url(&url)
                .await?
                .ok_or_else(|| AppError::Internal("Duplicate article vanished".to_string()))?;
            Ok((StatusCode::OK, Json(json!({ "article": existing }))))
        }
        Commit::Failed => Err(AppError::Internal("Failed to create article".to_string())),
    }
}

pub async fn get_article_by_url(
    State(state): State<AppState>,
    _user: RequireUser,
    Query(params): Query<ArticleLookup>,
) -> AppResult<Json<Value>> {
    let url = params
        .article_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing article_url query parameter".to_string()))?;

    let article = state
        .store
        .find_article_by_url(&url)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No article with url {}", url)))?;

    Ok(Json(json!({ "article": article })))
}
