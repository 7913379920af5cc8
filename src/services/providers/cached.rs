use std::sync::Arc;

use crate::{
    cached,
    db::Cache,
    error::AppResult,
    models::ArticleSummary,
    services::{
        providers::{HeadlinesQuery, NewsSource, SearchQuery},
        Fetched,
    },
};

const HEADLINES_CACHE_TTL: u64 = 900; // 15 minutes
const SEARCH_CACHE_TTL: u64 = 1800; // 30 minutes

/// Serves news from Redis when possible, delegating to `inner` on a miss
#[derive(Clone)]
pub struct CachedNewsSource {
    inner: Arc<dyn NewsSource>,
    cache: Cache,
}

impl CachedNewsSource {
    pub fn new(inner: Arc<dyn NewsSource>, cache: Cache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl NewsSource for CachedNewsSource {
    async fn top_headlines(
        &self,
        query: &HeadlinesQuery,
    ) -> AppResult<Fetched<Vec<ArticleSummary>>> {
        cached!(
            self.cache,
            query.cache_key(),
            HEADLINES_CACHE_TTL,
            self.inner.top_headlines(query)
        )
    }

    async fn search(&self, query: &SearchQuery) -> AppResult<Fetched<Vec<ArticleSummary>>> {
        cached!(
            self.cache,
            query.cache_key(),
            SEARCH_CACHE_TTL,
            self.inner.search(query)
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
