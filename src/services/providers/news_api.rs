/// newsapi.org v2 provider
///
/// Endpoints:
/// 1. Top headlines: /v2/top-headlines → headlines by country and category
/// 2. Search: /v2/everything → full-text search with recency and domain filters
use crate::{
    error::{AppError, AppResult},
    models::{ArticleSummary, NewsApiResponse},
    services::{
        http::ApiSession,
        providers::{HeadlinesQuery, NewsSource, SearchQuery},
        Absence, Fetched,
    },
};
use chrono::{Duration, Utc};

const SERVICE: &str = "newsapi";

#[derive(Clone)]
pub struct NewsApiProvider {
    session: ApiSession,
    api_key: String,
    api_url: String,
}

impl NewsApiProvider {
    pub fn new(session: ApiSession, api_key: String, api_url: String) -> Self {
        Self {
            session,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn headlines_params(query: &HeadlinesQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("country", query.country.clone())];
        if let Some(category) = query.category {
            params.push(("category", category.as_str().to_string()));
        }
        if let Some(size) = query.page_size {
            params.push(("pageSize", size.to_string()));
        }
        params
    }

    fn search_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.phrase.clone()),
            ("sortBy", query.sort_by.as_str().to_string()),
            ("language", query.language.clone()),
        ];
        if let Some(days) = query.days {
            let from = Utc::now() - Duration::days(i64::from(days));
            params.push(("from", from.format("%Y-%m-%dT%H:%M:%S").to_string()));
        }
        if !query.exclude_domains.is_empty() {
            params.push(("excludeDomains", query.exclude_domains.join(",")));
        }
        if let Some(size) = query.page_size {
            params.push(("pageSize", size.to_string()));
        }
        params
    }

    async fn get_articles(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> AppResult<Fetched<Vec<ArticleSummary>>> {
        let request = self
            .session
            .client()
            .get(format!("{}{}", self.api_url, path))
            .header("X-Api-Key", &self.api_key)
            .query(params);

        let response = match self.session.send_json::<NewsApiResponse>(SERVICE, request).await? {
            Fetched::Data(response) => response,
            Fetched::Absent(reason) => return Ok(Fetched::Absent(reason)),
        };

        if response.status != "ok" {
            let error = AppError::ExternalApi(format!(
                "News API {} failed: {} {}",
                path,
                response.code.as_deref().unwrap_or("unknown"),
                response.message.as_deref().unwrap_or(""),
            ));
            return self.session.degrade(SERVICE, Absence::NoData, error);
        }

        tracing::debug!(
            path,
            total_results = response.total_results.unwrap_or_default(),
            returned = response.articles.len(),
            "News API request completed"
        );
        Ok(Fetched::Data(response.articles))
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsApiProvider {
    async fn top_headlines(
        &self,
        query: &HeadlinesQuery,
    ) -> AppResult<Fetched<Vec<ArticleSummary>>> {
        self.get_articles("/v2/top-headlines", &Self::headlines_params(query))
            .await
    }

    async fn search(&self, query: &SearchQuery) -> AppResult<Fetched<Vec<ArticleSummary>>> {
        self.get_articles("/v2/everything", &Self::search_params(query))
            .await
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppEnv,
        models::NewsCategory,
        services::{http::testing::spawn_server, providers::SortBy},
    };
    use axum::{extract::Query, http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_headlines_params() {
        let params =
            NewsApiProvider::headlines_params(&HeadlinesQuery::category(NewsCategory::Health, 12));
        assert_eq!(param(&params, "country"), Some("us"));
        assert_eq!(param(&params, "category"), Some("health"));
        assert_eq!(param(&params, "pageSize"), Some("12"));

        let params = NewsApiProvider::headlines_params(&HeadlinesQuery::default());
        assert_eq!(param(&params, "category"), None);
        assert_eq!(param(&params, "pageSize"), None);
    }

    #[test]
    fn test_search_params() {
        let query = SearchQuery::new("Tesla lockdown")
            .sort_by(SortBy::Popularity)
            .within_days(7)
            .excluding(&["youtube.com".to_string(), "vimeo.com".to_string()])
            .page_size(3);
        let params = NewsApiProvider::search_params(&query);

        assert_eq!(param(&params, "q"), Some("Tesla lockdown"));
        assert_eq!(param(&params, "sortBy"), Some("popularity"));
        assert_eq!(param(&params, "language"), Some("en"));
        assert_eq!(param(&params, "excludeDomains"), Some("youtube.com,vimeo.com"));
        assert_eq!(param(&params, "pageSize"), Some("3"));

        let from = chrono::NaiveDateTime::parse_from_str(
            param(&params, "from").unwrap(),
            "%Y-%m-%dT%H:%M:%S",
        )
        .unwrap();
        let age = Utc::now().naive_utc() - from;
        assert!(age >= Duration::days(7) - Duration::minutes(1));
        assert!(age <= Duration::days(7) + Duration::minutes(1));
    }

    #[test]
    fn test_search_params_without_recency() {
        let params = NewsApiProvider::search_params(&SearchQuery::new("Disney"));
        assert_eq!(param(&params, "from"), None);
        assert_eq!(param(&params, "excludeDomains"), None);
        assert_eq!(param(&params, "sortBy"), Some("publishedAt"));
    }

    async fn fake_news_api() -> String {
        let router = Router::new()
            .route(
                "/v2/everything",
                get(
                    |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("secret")
                        {
                            return Json(json!({
                                "status": "error",
                                "code": "apiKeyInvalid",
                                "message": "Your API key is invalid"
                            }));
                        }
                        let q = params.get("q").cloned().unwrap_or_default();
                        Json(json!({
                            "status": "ok",
                            "totalResults": 1,
                            "articles": [{
                                "source": {"id": null, "name": "Example"},
                                "title": q,
                                "url": "https://news.example.com/a"
                            }]
                        }))
                    },
                ),
            )
            .route(
                "/v2/top-headlines",
                get(|| async {
                    (
                        axum::http::StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({"status": "error", "code": "rateLimited"})),
                    )
                }),
            );
        spawn_server(router).await
    }

    #[tokio::test]
    async fn test_search_returns_articles() {
        let base = fake_news_api().await;
        let provider = NewsApiProvider::new(
            ApiSession::new(AppEnv::Production).unwrap(),
            "secret".to_string(),
            format!("{}/", base),
        );

        let articles = provider
            .search(&SearchQuery::new("Tesla lockdown"))
            .await
            .unwrap()
            .data()
            .unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("Tesla lockdown"));
    }

    #[tokio::test]
    async fn test_error_envelope_is_absent() {
        let base = fake_news_api().await;
        let provider = NewsApiProvider::new(
            ApiSession::new(AppEnv::Production).unwrap(),
            "wrong".to_string(),
            base,
        );

        let fetched = provider.search(&SearchQuery::new("Disney")).await.unwrap();
        assert_eq!(fetched.absence(), Some(Absence::NoData));
    }

    #[tokio::test]
    async fn test_error_envelope_propagates_in_development() {
        let base = fake_news_api().await;
        let provider = NewsApiProvider::new(
            ApiSession::new(AppEnv::Development).unwrap(),
            "wrong".to_string(),
            base,
        );

        let result = provider.search(&SearchQuery::new("Disney")).await;
        match result {
            Err(AppError::ExternalApi(message)) => assert!(message.contains("apiKeyInvalid")),
            other => panic!("expected an external API error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_absent() {
        let base = fake_news_api().await;
        let provider = NewsApiProvider::new(
            ApiSession::new(AppEnv::Production).unwrap(),
            "secret".to_string(),
            base,
        );

        let fetched = provider
            .top_headlines(&HeadlinesQuery::default())
            .await
            .unwrap();
        assert_eq!(fetched.absence(), Some(Absence::Status(429)));
    }
}
