use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    api::{AppState, RequireUser},
    db::Commit,
    error::{AppError, AppResult},
    models::{ArticleTagRequest, TagsRequest, Validate},
    services::tagging,
};

#[derive(Debug, Deserialize)]
pub struct TagLookup {
    keyword: Option<String>,
}

/// Creates tags from the article's most relevant terms
///
/// Answers 200 with an empty list when the article yielded no terms, and 201
/// with the newly created tags otherwise.
pub async fn create_tags(
    State(state): State<AppState>,
    _user: RequireUser,
    Json(request): Json<TagsRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    request.validate()?;

    let outcome = tagging::create_tags(
        &*state.store,
        &state.extractor,
        request.article_url.trim(),
        state.max_tags,
    )
    .await?;

    let status = if outcome.had_terms {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(json!({ "tags": outcome.created }))))
}

pub async fn find_tag(
    State(state): State<AppState>,
    _user: RequireUser,
    Query(params): Query<TagLookup>,
) -> AppResult<Json<Value>> {
    let keyword = params
        .keyword
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing keyword query parameter".to_string()))?;

    let tag = state
        .store
        .find_tag(&keyword)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag '{}' not found", keyword)))?;

    Ok(Json(json!({ "tag": tag })))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    _user: RequireUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if !state.store.delete_tag(id).await? {
        return Err(AppError::NotFound(format!("Tag {} not found", id)));
    }
    Ok(Json(json!({ "tag": { "message": "Deleted.", "id": id } })))
}

/// Associates an existing tag with an existing article
pub async fn create_article_tag(
    State(state): State<AppState>,
    _user: RequireUser,
    Json(request): Json<ArticleTagRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    request.validate()?;
    let (Some(article_id), Some(tag_id)) = (request.article_id, request.tag_id) else {
        return Err(AppError::InvalidInput("article_id and tag_id are required".to_string()));
    };

    match state.store.tag_article(article_id, tag_id).await {
        Commit::Committed(article_tag) => Ok((
            StatusCode::CREATED,
            Json(json!({ "articletag": article_tag })),
        )),
        Commit::Duplicate | Commit::Failed => Err(AppError::InvalidInput(
            "Failed to create article-tag".to_string(),
        )),
    }
}
