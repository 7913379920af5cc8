use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Article, ArticleTag, Bookmark, NewArticle, NewUser, NewsCategory, SavedArticle, Tag, User,
        UserRecord,
    },
};

use super::{ArticleStore, BookmarkStore, CategoryStore, Commit, TagStore, UserStore};

/// Creates a PostgreSQL connection pool and applies the embedded migrations
///
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

const ARTICLE_COLUMNS: &str = "id, title, summary, content, url, source, img_url, published_at";
const USER_COLUMNS: &str = "id, username, email, first_name, last_name";

/// Maps the result of an insert transaction onto a [`Commit`]
///
/// An uncommitted transaction is rolled back when dropped, so every error
/// path here has already been rolled back.
fn settle<T>(entity: &'static str, result: Result<T, sqlx::Error>) -> Commit<T> {
    match result {
        Ok(value) => Commit::Committed(value),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            tracing::warn!(entity, error = %e, "Rejected duplicate row");
            Commit::Duplicate
        }
        Err(e) => {
            tracing::error!(entity, error = %e, "Failed to persist row");
            Commit::Failed
        }
    }
}

/// Store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ArticleStore for PgStore {
    async fn create_article(&self, article: NewArticle) -> Commit<Article> {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let created = sqlx::query_as::<_, Article>(&format!(
                r#"
                INSERT INTO articles (title, summary, content, url, source, img_url, published_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {ARTICLE_COLUMNS}
                "#
            ))
            .bind(&article.title)
            .bind(&article.summary)
            .bind(&article.content)
            .bind(&article.url)
            .bind(&article.source)
            .bind(&article.img_url)
            .bind(article.published_at.unwrap_or_else(Utc::now))
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(created)
        }
        .await;

        settle("article", result)
    }

    async fn find_article_by_url(&self, url: &str) -> AppResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE url = $1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    async fn delete_article(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl TagStore for PgStore {
    async fn create_tag(&self, keyword: &str) -> Commit<Tag> {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let tag = sqlx::query_as::<_, Tag>(
                "INSERT INTO tags (keyword) VALUES ($1) RETURNING id, keyword",
            )
            .bind(keyword)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(tag)
        }
        .await;

        settle("tag", result)
    }

    async fn find_tag(&self, keyword: &str) -> AppResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, keyword FROM tags WHERE keyword = $1")
            .bind(keyword)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    async fn delete_tag(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tag_article(&self, article_id: i64, tag_id: i64) -> Commit<ArticleTag> {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let article_tag = sqlx::query_as::<_, ArticleTag>(
                r#"
                INSERT INTO articles_tags (article_id, tag_id)
                VALUES ($1, $2)
                RETURNING id, article_id, tag_id
                "#,
            )
            .bind(article_id)
            .bind(tag_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(article_tag)
        }
        .await;

        settle("article_tag", result)
    }

    async fn article_keywords(&self, article_id: i64) -> AppResult<Vec<String>> {
        let keywords: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT t.keyword::TEXT
            FROM articles_tags art
            JOIN tags t ON t.id = art.tag_id
            WHERE art.article_id = $1
            ORDER BY art.id ASC
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keywords.into_iter().map(|(k,)| k).collect())
    }
}

#[derive(FromRow)]
struct SavedArticleRow {
    bookmark_id: i64,
    saved_at: DateTime<Utc>,
    #[sqlx(flatten)]
    article: Article,
    keywords: Vec<String>,
}

#[async_trait::async_trait]
impl BookmarkStore for PgStore {
    async fn create_bookmark(&self, user_id: i64, article_id: i64) -> Commit<Bookmark> {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let bookmark = sqlx::query_as::<_, Bookmark>(
                r#"
                INSERT INTO saves (user_id, article_id)
                VALUES ($1, $2)
                RETURNING id, user_id, article_id, created_at
                "#,
            )
            .bind(user_id)
            .bind(article_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(bookmark)
        }
        .await;

        settle("bookmark", result)
    }

    async fn find_bookmark(&self, user_id: i64, article_id: i64) -> AppResult<Option<Bookmark>> {
        let bookmark = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, article_id, created_at
            FROM saves
            WHERE user_id = $1 AND article_id = $2
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bookmark)
    }

    async fn delete_bookmark(&self, user_id: i64, bookmark_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM saves WHERE id = $1 AND user_id = $2")
            .bind(bookmark_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_bookmarks(&self, user_id: i64, limit: usize) -> AppResult<Vec<Bookmark>> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, article_id, created_at
            FROM saves
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookmarks)
    }

    async fn saved_articles(&self, user_id: i64) -> AppResult<Vec<SavedArticle>> {
        let rows = sqlx::query_as::<_, SavedArticleRow>(
            r#"
            SELECT s.id AS bookmark_id, s.created_at AS saved_at,
                   a.id, a.title, a.summary, a.content, a.url, a.source, a.img_url, a.published_at,
                   COALESCE(
                       array_agg(t.keyword::TEXT ORDER BY art.id) FILTER (WHERE t.id IS NOT NULL),
                       '{}'::TEXT[]
                   ) AS keywords
            FROM saves s
            JOIN articles a ON a.id = s.article_id
            LEFT JOIN articles_tags art ON art.article_id = a.id
            LEFT JOIN tags t ON t.id = art.tag_id
            WHERE s.user_id = $1
            GROUP BY s.id, a.id
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SavedArticle {
                bookmark_id: row.bookmark_id,
                saved_at: row.saved_at,
                article: row.article,
                keywords: row.keywords,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Commit<User> {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let created = sqlx::query_as::<_, User>(&format!(
                r#"
                INSERT INTO users (username, password, email, first_name, last_name)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {USER_COLUMNS}
                "#
            ))
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(created)
        }
        .await;

        settle("user", result)
    }

    async fn find_user_record(&self, username: &str) -> AppResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, password, email, first_name, last_name
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_username(&self, user_id: i64, username: &str) -> Commit<User> {
        let result = async {
            let mut tx = self.pool.begin().await?;
            let user = sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET username = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
            ))
            .bind(user_id)
            .bind(username)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(user)
        }
        .await;

        settle("user", result)
    }

    async fn create_session(&self, user_id: i64) -> AppResult<Uuid> {
        let token = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn session_user(&self, token: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CategoryStore for PgStore {
    async fn user_categories(&self, user_id: i64) -> AppResult<Vec<NewsCategory>> {
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT category FROM users_categories WHERE user_id = $1 ORDER BY category",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names
            .into_iter()
            .filter_map(|(name,)| match name.parse::<NewsCategory>() {
                Ok(category) => Some(category),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "Skipping unknown stored category");
                    None
                }
            })
            .collect())
    }

    async fn set_user_categories(
        &self,
        user_id: i64,
        categories: &[NewsCategory],
    ) -> AppResult<Vec<NewsCategory>> {
        let mut selection = categories.to_vec();
        selection.sort();
        selection.dedup();

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM users_categories WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for category in &selection {
            sqlx::query("INSERT INTO users_categories (user_id, category) VALUES ($1, $2)")
                .bind(user_id)
                .bind(category.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(selection)
    }
}
