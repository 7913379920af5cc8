use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Article, ArticleTag, Bookmark, NewArticle, NewUser, NewsCategory, SavedArticle, Tag, User,
        UserRecord,
    },
};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;

/// Outcome of a single insert-and-commit
///
/// Creation never raises: a uniqueness violation or a storage failure rolls
/// the transaction back and is reported here, leaving the caller to decide
/// what to do (typically look up the existing row).
#[derive(Debug, Clone, PartialEq)]
pub enum Commit<T> {
    Committed(T),
    /// A unique constraint rejected the row
    Duplicate,
    /// Any other storage failure; already logged
    Failed,
}

impl<T> Commit<T> {
    pub fn committed(self) -> Option<T> {
        match self {
            Commit::Committed(value) => Some(value),
            Commit::Duplicate | Commit::Failed => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Commit::Committed(_))
    }
}

#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    async fn create_article(&self, article: NewArticle) -> Commit<Article>;

    async fn find_article_by_url(&self, url: &str) -> AppResult<Option<Article>>;

    async fn delete_article(&self, id: i64) -> AppResult<bool>;
}

#[async_trait::async_trait]
pub trait TagStore: Send + Sync {
    async fn create_tag(&self, keyword: &str) -> Commit<Tag>;

    async fn find_tag(&self, keyword: &str) -> AppResult<Option<Tag>>;

    async fn delete_tag(&self, id: i64) -> AppResult<bool>;

    async fn tag_article(&self, article_id: i64, tag_id: i64) -> Commit<ArticleTag>;

    /// Keywords of an article's tags in association order
    async fn article_keywords(&self, article_id: i64) -> AppResult<Vec<String>>;
}

#[async_trait::async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn create_bookmark(&self, user_id: i64, article_id: i64) -> Commit<Bookmark>;

    async fn find_bookmark(&self, user_id: i64, article_id: i64) -> AppResult<Option<Bookmark>>;

    /// Deletes only when the bookmark belongs to `user_id`
    async fn delete_bookmark(&self, user_id: i64, bookmark_id: i64) -> AppResult<bool>;

    /// Newest first, ties broken by id descending
    async fn recent_bookmarks(&self, user_id: i64, limit: usize) -> AppResult<Vec<Bookmark>>;

    /// Every bookmarked article of the user, newest first
    async fn saved_articles(&self, user_id: i64) -> AppResult<Vec<SavedArticle>>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Commit<User>;

    async fn find_user_record(&self, username: &str) -> AppResult<Option<UserRecord>>;

    async fn update_username(&self, user_id: i64, username: &str) -> Commit<User>;

    async fn create_session(&self, user_id: i64) -> AppResult<Uuid>;

    async fn session_user(&self, token: Uuid) -> AppResult<Option<User>>;

    async fn delete_session(&self, token: Uuid) -> AppResult<()>;
}

#[async_trait::async_trait]
pub trait CategoryStore: Send + Sync {
    async fn user_categories(&self, user_id: i64) -> AppResult<Vec<NewsCategory>>;

    /// Replaces the user's whole selection
    async fn set_user_categories(
        &self,
        user_id: i64,
        categories: &[NewsCategory],
    ) -> AppResult<Vec<NewsCategory>>;
}

/// Everything the HTTP layer needs from persistence
pub trait Store: ArticleStore + TagStore + BookmarkStore + UserStore + CategoryStore {}

impl<T> Store for T where T: ArticleStore + TagStore + BookmarkStore + UserStore + CategoryStore {}
