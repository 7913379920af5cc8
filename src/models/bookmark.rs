use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Article;

/// A user's saved article; unique per (user, article)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: i64,
    pub article_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/saves`
#[derive(Debug, Clone, Deserialize)]
pub struct BookmarkRequest {
    pub article_id: Option<i64>,
}

/// A bookmark joined with its article and the article's tag keywords
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SavedArticle {
    pub bookmark_id: i64,
    pub saved_at: DateTime<Utc>,
    pub article: Article,
    pub keywords: Vec<String>,
}
