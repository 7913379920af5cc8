use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    api::{AppState, RequireUser},
    db::Commit,
    error::{AppError, AppResult},
    models::{BookmarkRequest, FieldErrors},
};

/// Bookmarks an already stored article; 200 when it was bookmarked before
pub async fn create_bookmark(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Json(request): Json<BookmarkRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let article_id = request
        .article_id
        .ok_or_else(|| FieldErrors::single("article_id", "Please provide valid article_id"))?;

    if let Some(existing) = state.store.find_bookmark(user.id, article_id).await? {
        return Ok((StatusCode::OK, Json(json!({ "bookmark": existing }))));
    }

    match state.store.create_bookmark(user.id, article_id).await {
        Commit::Committed(bookmark) => {
            tracing::info!(user_id = user.id, article_id, "Bookmark created");
            Ok((StatusCode::CREATED, Json(json!({ "bookmark": bookmark }))))
        }
        Commit::Duplicate => {
            let existing = state
                .store
                .find_bookmark(user.id, article_id)
                .await?
                .ok_or_else(|| AppError::Internal("Duplicate bookmark vanished".to_string()))?;
            Ok((StatusCode::OK, Json(json!({ "bookmark": existing }))))
        }
        Commit::Failed => Err(AppError::InvalidInput(format!(
            "Failed to create bookmark for article {}",
            article_id
        ))),
    }
}

/// Removes one of the caller's bookmarks
pub async fn remove_bookmark(
    State(state): State<AppState>,
    RequireUser { user, .. }: RequireUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if !state.store.delete_bookmark(user.id, id).await? {
        return Err(AppError::NotFound(format!("Bookmark {} not found", id)));
    }

    tracing::info!(user_id = user.id, bookmark_id = id, "Bookmark deleted");
    Ok(Json(json!({ "bookmark": { "message": "Deleted.", "id": id } })))
}
