use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Article, ArticleTag, Bookmark, NewArticle, NewUser, NewsCategory, SavedArticle, Tag, User,
        UserRecord, MAX_KEYWORD_LEN,
    },
};

use super::{ArticleStore, BookmarkStore, CategoryStore, Commit, TagStore, UserStore};

/// In-process store mirroring the PostgreSQL schema's constraints
///
/// Used by `DATABASE_URL=memory` and by the test suites.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    last_id: i64,
    articles: HashMap<i64, Article>,
    tags: HashMap<i64, Tag>,
    /// Insertion order is association order
    article_tags: Vec<ArticleTag>,
    bookmarks: HashMap<i64, Bookmark>,
    users: HashMap<i64, UserRecord>,
    sessions: HashMap<Uuid, i64>,
    categories: HashMap<i64, BTreeSet<NewsCategory>>,
}

impl MemoryStoreInner {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

impl MemoryStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn create_article(&self, article: NewArticle) -> Commit<Article> {
        let mut inner = self.inner.write().await;
        if inner.articles.values().any(|a| a.url == article.url) {
            tracing::warn!(entity = "article", url = %article.url, "Rejected duplicate row");
            return Commit::Duplicate;
        }

        let created = Article {
            id: inner.next_id(),
            title: article.title,
            summary: article.summary,
            content: article.content,
            url: article.url,
            source: article.source,
            img_url: article.img_url,
            published_at: article.published_at.unwrap_or_else(Utc::now),
        };
        inner.articles.insert(created.id, created.clone());
        Commit::Committed(created)
    }

    async fn find_article_by_url(&self, url: &str) -> AppResult<Option<Article>> {
        let inner = self.inner.read().await;
        Ok(inner.articles.values().find(|a| a.url == url).cloned())
    }

    async fn delete_article(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.articles.remove(&id).is_none() {
            return Ok(false);
        }
        inner.article_tags.retain(|at| at.article_id != id);
        inner.bookmarks.retain(|_, b| b.article_id != id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl TagStore for MemoryStore {
    async fn create_tag(&self, keyword: &str) -> Commit<Tag> {
        let mut inner = self.inner.write().await;
        if keyword.chars().count() > MAX_KEYWORD_LEN {
            tracing::error!(entity = "tag", keyword, "Failed to persist row: keyword too long");
            return Commit::Failed;
        }
        if inner.tags.values().any(|t| t.keyword == keyword) {
            tracing::warn!(entity = "tag", keyword, "Rejected duplicate row");
            return Commit::Duplicate;
        }

        let tag = Tag {
            id: inner.next_id(),
            keyword: keyword.to_string(),
        };
        inner.tags.insert(tag.id, tag.clone());
        Commit::Committed(tag)
    }

    async fn find_tag(&self, keyword: &str) -> AppResult<Option<Tag>> {
        let inner = self.inner.read().await;
        Ok(inner.tags.values().find(|t| t.keyword == keyword).cloned())
    }

    async fn delete_tag(&self, id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.tags.remove(&id).is_none() {
            return Ok(false);
        }
        inner.article_tags.retain(|at| at.tag_id != id);
        Ok(true)
    }

    async fn tag_article(&self, article_id: i64, tag_id: i64) -> Commit<ArticleTag> {
        let mut inner = self.inner.write().await;
        if !inner.articles.contains_key(&article_id) || !inner.tags.contains_key(&tag_id) {
            tracing::error!(
                entity = "article_tag",
                article_id,
                tag_id,
                "Failed to persist row: unknown article or tag"
            );
            return Commit::Failed;
        }
        if inner
            .article_tags
            .iter()
            .any(|at| at.article_id == article_id && at.tag_id == tag_id)
        {
            tracing::warn!(entity = "article_tag", article_id, tag_id, "Rejected duplicate row");
            return Commit::Duplicate;
        }

        let article_tag = ArticleTag {
            id: inner.next_id(),
            article_id,
            tag_id,
        };
        inner.article_tags.push(article_tag.clone());
        Commit::Committed(article_tag)
    }

    async fn article_keywords(&self, article_id: i64) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .article_tags
            .iter()
            .filter(|at| at.article_id == article_id)
            .filter_map(|at| inner.tags.get(&at.tag_id))
            .map(|t| t.keyword.clone())
            .collect())
    }
}

impl MemoryStoreInner {
    fn bookmarks_newest_first(&self, user_id: i64) -> Vec<Bookmark> {
        let mut bookmarks: Vec<Bookmark> = self
            .bookmarks
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookmarks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        bookmarks
    }
}

#[async_trait::async_trait]
impl BookmarkStore for MemoryStore {
    async fn create_bookmark(&self, user_id: i64, article_id: i64) -> Commit<Bookmark> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) || !inner.articles.contains_key(&article_id) {
            tracing::error!(
                entity = "bookmark",
                user_id,
                article_id,
                "Failed to persist row: unknown user or article"
            );
            return Commit::Failed;
        }
        if inner
            .bookmarks
            .values()
            .any(|b| b.user_id == user_id && b.article_id == article_id)
        {
            tracing::warn!(entity = "bookmark", user_id, article_id, "Rejected duplicate row");
            return Commit::Duplicate;
        }

        let bookmark = Bookmark {
            id: inner.next_id(),
            user_id,
            article_id,
            created_at: Utc::now(),
        };
        inner.bookmarks.insert(bookmark.id, bookmark.clone());
        Commit::Committed(bookmark)
    }

    async fn find_bookmark(&self, user_id: i64, article_id: i64) -> AppResult<Option<Bookmark>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bookmarks
            .values()
            .find(|b| b.user_id == user_id && b.article_id == article_id)
            .cloned())
    }

    async fn delete_bookmark(&self, user_id: i64, bookmark_id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .bookmarks
            .get(&bookmark_id)
            .is_some_and(|b| b.user_id == user_id);
        if owned {
            inner.bookmarks.remove(&bookmark_id);
        }
        Ok(owned)
    }

    async fn recent_bookmarks(&self, user_id: i64, limit: usize) -> AppResult<Vec<Bookmark>> {
        let inner = self.inner.read().await;
        let mut bookmarks = inner.bookmarks_newest_first(user_id);
        bookmarks.truncate(limit);
        Ok(bookmarks)
    }

    async fn saved_articles(&self, user_id: i64) -> AppResult<Vec<SavedArticle>> {
        let inner = self.inner.read().await;
        Ok(inner
            .bookmarks_newest_first(user_id)
            .into_iter()
            .filter_map(|b| {
                let article = inner.articles.get(&b.article_id)?.clone();
                let keywords = inner
                    .article_tags
                    .iter()
                    .filter(|at| at.article_id == article.id)
                    .filter_map(|at| inner.tags.get(&at.tag_id))
                    .map(|t| t.keyword.clone())
                    .collect();
                Some(SavedArticle {
                    bookmark_id: b.id,
                    saved_at: b.created_at,
                    article,
                    keywords,
                })
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Commit<User> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            tracing::warn!(entity = "user", username = %user.username, "Rejected duplicate row");
            return Commit::Duplicate;
        }

        let record = UserRecord {
            id: inner.next_id(),
            username: user.username,
            password: user.password_hash,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        };
        inner.users.insert(record.id, record.clone());
        Commit::Committed(record.into())
    }

    async fn find_user_record(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_username(&self, user_id: i64, username: &str) -> Commit<User> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.id != user_id && u.username == username)
        {
            tracing::warn!(entity = "user", username, "Rejected duplicate row");
            return Commit::Duplicate;
        }
        match inner.users.get_mut(&user_id) {
            Some(record) => {
                record.username = username.to_string();
                Commit::Committed(record.clone().into())
            }
            None => {
                tracing::error!(entity = "user", user_id, "Failed to persist row: unknown user");
                Commit::Failed
            }
        }
    }

    async fn create_session(&self, user_id: i64) -> AppResult<Uuid> {
        let token = Uuid::new_v4();
        self.inner.write().await.sessions.insert(token, user_id);
        Ok(token)
    }

    async fn session_user(&self, token: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(&token)
            .and_then(|id| inner.users.get(id))
            .cloned()
            .map(User::from))
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        self.inner.write().await.sessions.remove(&token);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CategoryStore for MemoryStore {
    async fn user_categories(&self, user_id: i64) -> AppResult<Vec<NewsCategory>> {
        let inner = self.inner.read().await;
        Ok(inner
            .categories
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn set_user_categories(
        &self,
        user_id: i64,
        categories: &[NewsCategory],
    ) -> AppResult<Vec<NewsCategory>> {
        let selection: BTreeSet<NewsCategory> = categories.iter().copied().collect();
        let result = selection.iter().copied().collect();
        self.inner
            .write()
            .await
            .categories
            .insert(user_id, selection);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_article(url: &str) -> NewArticle {
        NewArticle {
            title: "Secret".to_string(),
            content: "Bruce Wayne is the Batman".to_string(),
            url: url.to_string(),
            source: "The Joker".to_string(),
            summary: None,
            img_url: None,
            published_at: None,
        }
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            email: format!("{}@test.com", username),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_tag_is_not_created() {
        let store = MemoryStore::new();

        let first = store.create_tag("Tesla").await;
        assert!(first.is_committed());
        assert_eq!(store.create_tag("Tesla").await, Commit::Duplicate);

        let tag = store.find_tag("Tesla").await.unwrap().unwrap();
        assert_eq!(Some(tag), first.committed());
    }

    #[tokio::test]
    async fn test_overlong_keyword_fails() {
        let store = MemoryStore::new();
        let keyword = "k".repeat(MAX_KEYWORD_LEN + 1);
        assert_eq!(store.create_tag(&keyword).await, Commit::Failed);
    }

    #[tokio::test]
    async fn test_duplicate_article_url() {
        let store = MemoryStore::new();
        assert!(store
            .create_article(new_article("http://www.google.com"))
            .await
            .is_committed());
        assert_eq!(
            store.create_article(new_article("http://www.google.com")).await,
            Commit::Duplicate
        );
    }

    #[tokio::test]
    async fn test_bookmark_unique_per_user_and_article() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("test1")).await.committed().unwrap();
        let article = store
            .create_article(new_article("https://a.com"))
            .await
            .committed()
            .unwrap();

        let bookmark = store
            .create_bookmark(user.id, article.id)
            .await
            .committed()
            .unwrap();
        assert_eq!(
            store.create_bookmark(user.id, article.id).await,
            Commit::Duplicate
        );
        assert_eq!(
            store.find_bookmark(user.id, article.id).await.unwrap(),
            Some(bookmark)
        );
    }

    #[tokio::test]
    async fn test_bookmark_requires_existing_article() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("test1")).await.committed().unwrap();
        assert_eq!(store.create_bookmark(user.id, 999).await, Commit::Failed);
    }

    #[tokio::test]
    async fn test_recent_bookmarks_newest_first() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("test1")).await.committed().unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            let article = store
                .create_article(new_article(&format!("https://a.com/{}", i)))
                .await
                .committed()
                .unwrap();
            let bookmark = store
                .create_bookmark(user.id, article.id)
                .await
                .committed()
                .unwrap();
            ids.push(bookmark.id);
        }

        let recent: Vec<i64> = store
            .recent_bookmarks(user.id, 4)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        ids.reverse();
        assert_eq!(recent, ids[..4]);
    }

    #[tokio::test]
    async fn test_article_keywords_in_association_order() {
        let store = MemoryStore::new();
        let article = store
            .create_article(new_article("https://a.com"))
            .await
            .committed()
            .unwrap();
        let lockdown = store.create_tag("lockdown").await.committed().unwrap();
        let tesla = store.create_tag("Tesla").await.committed().unwrap();

        store.tag_article(article.id, tesla.id).await;
        store.tag_article(article.id, lockdown.id).await;
        assert_eq!(
            store.tag_article(article.id, lockdown.id).await,
            Commit::Duplicate
        );

        assert_eq!(
            store.article_keywords(article.id).await.unwrap(),
            vec!["Tesla", "lockdown"]
        );
    }

    #[tokio::test]
    async fn test_delete_bookmark_checks_owner() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("owner")).await.committed().unwrap();
        let other = store.create_user(new_user("other")).await.committed().unwrap();
        let article = store
            .create_article(new_article("https://a.com"))
            .await
            .committed()
            .unwrap();
        let bookmark = store
            .create_bookmark(owner.id, article.id)
            .await
            .committed()
            .unwrap();

        assert!(!store.delete_bookmark(other.id, bookmark.id).await.unwrap());
        assert!(store.delete_bookmark(owner.id, bookmark.id).await.unwrap());
        assert!(!store.delete_bookmark(owner.id, bookmark.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_article_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("test1")).await.committed().unwrap();
        let article = store
            .create_article(new_article("https://a.com"))
            .await
            .committed()
            .unwrap();
        let tag = store.create_tag("gold").await.committed().unwrap();
        store.tag_article(article.id, tag.id).await;
        store.create_bookmark(user.id, article.id).await;

        assert!(store.delete_article(article.id).await.unwrap());
        assert!(store.saved_articles(user.id).await.unwrap().is_empty());
        assert!(store.article_keywords(article.id).await.unwrap().is_empty());
        assert!(store.find_tag("gold").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_username_update_rejects_taken_name() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("first")).await.committed().unwrap();
        store.create_user(new_user("second")).await;

        assert_eq!(
            store.update_username(first.id, "second").await,
            Commit::Duplicate
        );
        let renamed = store
            .update_username(first.id, "renamed")
            .await
            .committed()
            .unwrap();
        assert_eq!(renamed.username, "renamed");
    }

    #[tokio::test]
    async fn test_sessions() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("test1")).await.committed().unwrap();
        let token = store.create_session(user.id).await.unwrap();

        assert_eq!(store.session_user(token).await.unwrap(), Some(user));
        store.delete_session(token).await.unwrap();
        assert_eq!(store.session_user(token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_categories_replace_selection() {
        let store = MemoryStore::new();
        store
            .set_user_categories(1, &[NewsCategory::Sports, NewsCategory::Business])
            .await
            .unwrap();
        let selected = store
            .set_user_categories(1, &[NewsCategory::Health, NewsCategory::Health])
            .await
            .unwrap();
        assert_eq!(selected, vec![NewsCategory::Health]);
        assert_eq!(
            store.user_categories(1).await.unwrap(),
            vec![NewsCategory::Health]
        );
    }
}
