use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{FieldErrors, Validate};

/// An article persisted because a user bookmarked it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    /// Globally unique
    pub url: String,
    pub source: String,
    pub img_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// Body of `POST /api/articles`
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Validate for NewArticle {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.require("content", &self.content);
        errors.require("source", &self.source);
        errors.url("url", &self.url);
        if let Some(img_url) = self.img_url.as_deref().filter(|u| !u.is_empty()) {
            errors.url("img_url", img_url);
        }
        errors.into_result()
    }
}
