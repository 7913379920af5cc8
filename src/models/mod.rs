use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod article;
pub mod bookmark;
pub mod category;
pub mod tag;
pub mod user;
pub mod validation;

pub use article::{Article, NewArticle};
pub use bookmark::{Bookmark, BookmarkRequest, SavedArticle};
pub use category::{CategorySelection, NewsCategory};
pub use tag::{ArticleTag, ArticleTagRequest, Tag, TagsRequest, MAX_KEYWORD_LEN};
pub use user::{LoginRequest, NewUser, SignupRequest, User, UserRecord, UsernameUpdate};
pub use validation::{FieldErrors, Validate};

// ============================================================================
// News API Types
// ============================================================================

/// Article summary as returned by the news API; passed to clients untouched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Envelope of every news API response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<ArticleSummary>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Text Analyzer Types
// ============================================================================

/// A ranked keyword or concept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Term {
    pub text: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Analysis {
    #[serde(default)]
    pub keywords: Vec<Term>,
    #[serde(default)]
    pub concepts: Vec<Term>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sentiment {
    pub document: Option<DocumentSentiment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSentiment {
    pub score: f64,
    pub label: String,
}

/// Analyzer terms that passed the relevance thresholds, in analyzer order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RelevantTerms {
    pub keywords: Vec<String>,
    pub concepts: Vec<String>,
}

impl RelevantTerms {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.concepts.is_empty()
    }

    /// Concepts first, then keywords
    pub fn into_candidates(self) -> Vec<String> {
        self.concepts.into_iter().chain(self.keywords).collect()
    }
}
