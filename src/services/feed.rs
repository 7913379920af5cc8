use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{ArticleSummary, NewsCategory, User},
    services::{
        providers::{HeadlinesQuery, NewsSource, SearchQuery, SortBy},
        recommendations::Recommender,
        Fetched,
    },
};

/// Headlines per selected category on the home feed
pub const CATEGORY_PAGE_SIZE: u32 = 12;

/// Recency window of free-text search results
pub const SEARCH_DAYS: u32 = 7;

/// Bookmarked article URL → bookmark id
pub type BookmarkMap = BTreeMap<String, i64>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HomeFeed {
    pub headlines: Vec<ArticleSummary>,
    /// Top headlines of each category the user selected
    pub categories: BTreeMap<NewsCategory, Vec<ArticleSummary>>,
    pub recommendations: Vec<ArticleSummary>,
    pub bookmarked_urls: Vec<String>,
    pub bookmarks: BookmarkMap,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub articles: Vec<ArticleSummary>,
    pub bookmarks: BookmarkMap,
}

/// Assembles headline, search and home feeds
#[derive(Clone)]
pub struct FeedService {
    news: Arc<dyn NewsSource>,
    recommender: Recommender,
    exclude_domains: Vec<String>,
}

impl FeedService {
    pub fn new(
        news: Arc<dyn NewsSource>,
        recommender: Recommender,
        exclude_domains: Vec<String>,
    ) -> Self {
        Self {
            news,
            recommender,
            exclude_domains,
        }
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    fn articles_or_empty(&self, fetched: Fetched<Vec<ArticleSummary>>) -> Vec<ArticleSummary> {
        if let Some(reason) = fetched.absence() {
            tracing::warn!(provider = self.news.name(), reason = %reason, "News unavailable");
        }
        fetched.unwrap_or_default()
    }

    pub async fn top_headlines(&self, query: &HeadlinesQuery) -> AppResult<Vec<ArticleSummary>> {
        let fetched = self.news.top_headlines(query).await?;
        Ok(self.articles_or_empty(fetched))
    }

    /// Headlines of a category given by name; unknown names are not found
    pub async fn category_headlines(
        &self,
        name: &str,
        page_size: Option<u32>,
    ) -> AppResult<(NewsCategory, Vec<ArticleSummary>)> {
        let category: NewsCategory = name
            .parse()
            .map_err(|_| AppError::NotFound(format!("Category '{}' not found", name)))?;

        let query = HeadlinesQuery {
            category: Some(category),
            page_size,
            ..HeadlinesQuery::default()
        };
        Ok((category, self.top_headlines(&query).await?))
    }

    #[instrument(skip(self, store, user), fields(user_id = user.map(|u| u.id)))]
    pub async fn search<S: Store + ?Sized>(
        &self,
        store: &S,
        user: Option<&User>,
        phrase: &str,
    ) -> AppResult<SearchResults> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let query = SearchQuery::new(phrase)
            .sort_by(SortBy::Popularity)
            .within_days(SEARCH_DAYS)
            .excluding(&self.exclude_domains);
        let fetched = self.news.search(&query).await?;

        Ok(SearchResults {
            query: phrase.to_string(),
            articles: self.articles_or_empty(fetched),
            bookmarks: bookmark_map(store, user).await?,
        })
    }

    /// Everything the landing page shows; anonymous users only get headlines
    #[instrument(skip(self, store, user), fields(user_id = user.map(|u| u.id)))]
    pub async fn home<S: Store + ?Sized>(
        &self,
        store: &S,
        user: Option<&User>,
    ) -> AppResult<HomeFeed> {
        let headlines = self.top_headlines(&HeadlinesQuery::default()).await?;

        let mut categories = BTreeMap::new();
        if let Some(user) = user {
            for category in store.user_categories(user.id).await? {
                let query = HeadlinesQuery::category(category, CATEGORY_PAGE_SIZE);
                categories.insert(category, self.top_headlines(&query).await?);
            }
        }

        let recommendations = self.recommender.recommend(store, user).await?;
        let bookmarks = bookmark_map(store, user).await?;

        Ok(HomeFeed {
            headlines,
            categories,
            recommendations,
            bookmarked_urls: bookmarks.keys().cloned().collect(),
            bookmarks,
        })
    }
}

pub async fn bookmark_map<S: Store + ?Sized>(
    store: &S,
    user: Option<&User>,
) -> AppResult<BookmarkMap> {
    let Some(user) = user else {
        return Ok(BookmarkMap::new());
    };

    Ok(store
        .saved_articles(user.id)
        .await?
        .into_iter()
        .map(|saved| (saved.article.url, saved.bookmark_id))
        .collect())
}
