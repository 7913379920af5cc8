use std::sync::Arc;
use tracing::instrument;

use crate::{
    db::{BookmarkStore, TagStore},
    error::AppResult,
    models::{ArticleSummary, User},
    services::{
        providers::{NewsSource, SearchQuery, SortBy},
        Fetched,
    },
};

/// Bookmarks that seed recommendations
pub const RECENT_BOOKMARKS: usize = 4;

/// Keywords taken from each seeding bookmark
pub const TERMS_PER_BOOKMARK: usize = 4;

/// Recency window of recommended articles
pub const RECOMMENDATION_DAYS: u32 = 7;

/// Page size per seeding bookmark: fewer per bookmark when there are more of them
pub fn batch_size(bookmarks: usize) -> u32 {
    if bookmarks > 2 {
        3
    } else {
        4
    }
}

/// Recommends articles related to what the user bookmarked recently
///
/// Each recent bookmark contributes one search built from its article's tags.
/// The per-bookmark results are concatenated as they arrive, newest bookmark
/// first, without de-duplication.
#[derive(Clone)]
pub struct Recommender {
    news: Arc<dyn NewsSource>,
    exclude_domains: Vec<String>,
}

impl Recommender {
    pub fn new(news: Arc<dyn NewsSource>, exclude_domains: Vec<String>) -> Self {
        Self {
            news,
            exclude_domains,
        }
    }

    #[instrument(skip(self, store, user), fields(user_id = user.map(|u| u.id)))]
    pub async fn recommend<S>(
        &self,
        store: &S,
        user: Option<&User>,
    ) -> AppResult<Vec<ArticleSummary>>
    where
        S: BookmarkStore + TagStore + ?Sized,
    {
        let Some(user) = user else {
            return Ok(Vec::new());
        };

        let bookmarks = store.recent_bookmarks(user.id, RECENT_BOOKMARKS).await?;
        if bookmarks.is_empty() {
            return Ok(Vec::new());
        }

        let page_size = batch_size(bookmarks.len());
        let mut recommendations = Vec::new();

        for bookmark in &bookmarks {
            let keywords = store.article_keywords(bookmark.article_id).await?;
            let phrase = keywords
                .iter()
                .take(TERMS_PER_BOOKMARK)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");

            if phrase.trim().is_empty() {
                tracing::debug!(bookmark_id = bookmark.id, "Bookmark has no tags; skipping");
                continue;
            }

            let query = SearchQuery::new(phrase)
                .sort_by(SortBy::Popularity)
                .within_days(RECOMMENDATION_DAYS)
                .excluding(&self.exclude_domains)
                .page_size(page_size);

            match self.news.search(&query).await? {
                Fetched::Data(articles) => recommendations.extend(articles),
                Fetched::Absent(reason) => {
                    tracing::warn!(
                        bookmark_id = bookmark.id,
                        provider = self.news.name(),
                        reason = %reason,
                        "No search results for bookmark"
                    );
                }
            }
        }

        tracing::info!(
            bookmarks = bookmarks.len(),
            count = recommendations.len(),
            "Assembled recommendations"
        );

        Ok(recommendations)
    }
}
