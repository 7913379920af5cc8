use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{is_http_url, FieldErrors, Validate};

/// Longest keyword the tags table accepts
pub const MAX_KEYWORD_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Tag {
    pub id: i64,
    /// Globally unique
    pub keyword: String,
}

/// Association between an article and a tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ArticleTag {
    pub id: i64,
    pub article_id: i64,
    pub tag_id: i64,
}

/// Body of `POST /api/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct TagsRequest {
    pub article_url: String,
}

impl Validate for TagsRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("article_url", &self.article_url);
        if !self.article_url.trim().is_empty() && !is_http_url(&self.article_url) {
            errors.add("article_url", "Invalid URL.");
        }
        errors.into_result()
    }
}

/// Body of `POST /api/articletag`
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleTagRequest {
    pub article_id: Option<i64>,
    pub tag_id: Option<i64>,
}

impl Validate for ArticleTagRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.article_id.is_none() {
            errors.add("article_id", "This field is required.");
        }
        if self.tag_id.is_none() {
            errors.add("tag_id", "This field is required.");
        }
        errors.into_result()
    }
}
