/// External data providers
///
/// News comes from a [`NewsSource`] (newsapi.org, optionally behind the Redis
/// cache) and keyword extraction from a [`TextAnalyzer`] (Watson NLU). Both
/// degrade to [`Fetched::Absent`] instead of failing the request.
use crate::{
    db::CacheKey,
    error::AppResult,
    models::{Analysis, ArticleSummary, NewsCategory},
    services::Fetched,
};

pub mod cached;
pub mod news_api;
pub mod watson_nlu;

pub use cached::CachedNewsSource;
pub use news_api::NewsApiProvider;
pub use watson_nlu::WatsonNluProvider;

/// Default country for top headlines
pub const DEFAULT_COUNTRY: &str = "us";

/// Default language for searches
pub const DEFAULT_LANGUAGE: &str = "en";

/// Ordering of search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    PublishedAt,
    Relevancy,
    Popularity,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::PublishedAt => "publishedAt",
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlinesQuery {
    pub country: String,
    pub category: Option<NewsCategory>,
    pub page_size: Option<u32>,
}

impl Default for HeadlinesQuery {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            category: None,
            page_size: None,
        }
    }
}

impl HeadlinesQuery {
    pub fn category(category: NewsCategory, page_size: u32) -> Self {
        Self {
            category: Some(category),
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Headlines(format!(
            "{}|{}|{}",
            self.country,
            self.category.map(|c| c.as_str()).unwrap_or("all"),
            self.page_size.map(|s| s.to_string()).unwrap_or_default()
        ))
    }
}

/// Full-text search over recent articles
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub phrase: String,
    pub sort_by: SortBy,
    pub language: String,
    /// Only articles published within this many days
    pub days: Option<u32>,
    pub exclude_domains: Vec<String>,
    pub page_size: Option<u32>,
}

impl SearchQuery {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            sort_by: SortBy::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            days: None,
            exclude_domains: Vec::new(),
            page_size: None,
        }
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn within_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    pub fn excluding(mut self, domains: &[String]) -> Self {
        self.exclude_domains = domains.to_vec();
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Search(format!(
            "{}|{}|{}|{}|{}|{}",
            self.phrase.trim(),
            self.sort_by.as_str(),
            self.language,
            self.days.map(|d| d.to_string()).unwrap_or_default(),
            self.exclude_domains.join(","),
            self.page_size.map(|s| s.to_string()).unwrap_or_default()
        ))
    }
}

/// Source of news article summaries
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn top_headlines(&self, query: &HeadlinesQuery)
        -> AppResult<Fetched<Vec<ArticleSummary>>>;

    async fn search(&self, query: &SearchQuery) -> AppResult<Fetched<Vec<ArticleSummary>>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Extracts keywords, concepts and sentiment from the article behind a URL
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze_url(
        &self,
        url: &str,
        keyword_limit: u32,
        concept_limit: u32,
    ) -> AppResult<Fetched<Analysis>>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headlines_cache_key() {
        let all = HeadlinesQuery::default();
        assert_eq!(all.cache_key().to_string(), "newsmart:headlines:us|all|");

        let sports = HeadlinesQuery::category(NewsCategory::Sports, 12);
        assert_eq!(sports.cache_key().to_string(), "newsmart:headlines:us|sports|12");
    }

    #[test]
    fn test_search_cache_key_distinguishes_parameters() {
        let base = SearchQuery::new("Tesla lockdown");
        let popular = base.clone().sort_by(SortBy::Popularity).page_size(3);
        assert_ne!(base.cache_key(), popular.cache_key());
        assert_eq!(
            popular.cache_key().to_string(),
            "newsmart:search:tesla lockdown|popularity|en|||3"
        );
    }

    #[test]
    fn test_search_builder() {
        let skip = vec!["youtube.com".to_string()];
        let query = SearchQuery::new("Disney")
            .sort_by(SortBy::Popularity)
            .within_days(7)
            .excluding(&skip)
            .page_size(4);
        assert_eq!(query.language, "en");
        assert_eq!(query.days, Some(7));
        assert_eq!(query.exclude_domains, skip);
        assert_eq!(query.page_size, Some(4));
    }
}
