/// IBM Watson Natural Language Understanding provider
///
/// A single `/v1/analyze` call fetches the page behind the URL and returns its
/// keywords, concepts and document sentiment.
use crate::{
    error::AppResult,
    models::Analysis,
    services::{http::ApiSession, providers::TextAnalyzer, Fetched},
};
use serde_json::{json, Value};

const SERVICE: &str = "watson-nlu";
const API_VERSION: &str = "2019-07-12";

#[derive(Clone)]
pub struct WatsonNluProvider {
    session: ApiSession,
    api_key: String,
    api_url: String,
}

impl WatsonNluProvider {
    pub fn new(session: ApiSession, api_key: String, api_url: String) -> Self {
        Self {
            session,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn analyze_body(url: &str, keyword_limit: u32, concept_limit: u32) -> Value {
        json!({
            "url": url,
            "features": {
                "sentiment": {},
                "keywords": {
                    "limit": keyword_limit,
                    "sentiment": true
                },
                "concepts": {
                    "limit": concept_limit
                }
            }
        })
    }
}

#[async_trait::async_trait]
impl TextAnalyzer for WatsonNluProvider {
    async fn analyze_url(
        &self,
        url: &str,
        keyword_limit: u32,
        concept_limit: u32,
    ) -> AppResult<Fetched<Analysis>> {
        let request = self
            .session
            .client()
            .post(format!("{}/v1/analyze", self.api_url))
            .query(&[("version", API_VERSION)])
            .basic_auth("apikey", Some(&self.api_key))
            .json(&Self::analyze_body(url, keyword_limit, concept_limit));

        let fetched: Fetched<Analysis> = self.session.send_json(SERVICE, request).await?;

        if let Fetched::Data(analysis) = &fetched {
            tracing::debug!(
                url,
                keywords = analysis.keywords.len(),
                concepts = analysis.concepts.len(),
                "Analyzed article"
            );
        }

        Ok(fetched)
    }

    fn name(&self) -> &'static str {
        "Watson NLU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppEnv, services::http::testing::spawn_server, services::Absence};
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;

    #[test]
    fn test_analyze_body() {
        let body = WatsonNluProvider::analyze_body("https://example.com/a", 5, 3);
        assert_eq!(body["url"], "https://example.com/a");
        assert_eq!(body["features"]["keywords"]["limit"], 5);
        assert_eq!(body["features"]["keywords"]["sentiment"], true);
        assert_eq!(body["features"]["concepts"]["limit"], 3);
        assert!(body["features"]["sentiment"].is_object());
    }

    async fn fake_nlu() -> String {
        let router = Router::new().route(
            "/v1/analyze",
            post(
                |headers: HeaderMap,
                 Query(params): Query<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    // "apikey:secret" in base64
                    let authorized = headers.get("authorization").and_then(|v| v.to_str().ok())
                        == Some("Basic YXBpa2V5OnNlY3JldA==");
                    if !authorized || params.get("version").map(String::as_str) != Some(API_VERSION)
                    {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
                    }
                    let limit = body["features"]["keywords"]["limit"].as_u64().unwrap_or(0);
                    let keywords: Vec<Value> = vec![
                        json!({"text": "Tesla", "relevance": 0.95}),
                        json!({"text": "factory", "relevance": 0.5}),
                    ]
                    .into_iter()
                    .take(limit as usize)
                    .collect();
                    (
                        StatusCode::OK,
                        Json(json!({
                            "keywords": keywords,
                            "concepts": [{"text": "Elon Musk", "relevance": 0.93}],
                            "sentiment": {"document": {"score": 0.1, "label": "positive"}}
                        })),
                    )
                },
            ),
        );
        spawn_server(router).await
    }

    #[tokio::test]
    async fn test_analyze_url() {
        let base = fake_nlu().await;
        let provider = WatsonNluProvider::new(
            ApiSession::new(AppEnv::Production).unwrap(),
            "secret".to_string(),
            base,
        );

        let analysis = provider
            .analyze_url("https://example.com/tesla", 5, 5)
            .await
            .unwrap()
            .data()
            .unwrap();
        assert_eq!(analysis.keywords.len(), 2);
        assert_eq!(analysis.concepts[0].text, "Elon Musk");
        assert_eq!(
            analysis.sentiment.unwrap().document.unwrap().label,
            "positive"
        );
    }

    #[tokio::test]
    async fn test_rejected_key_is_absent() {
        let base = fake_nlu().await;
        let provider = WatsonNluProvider::new(
            ApiSession::new(AppEnv::Production).unwrap(),
            "wrong".to_string(),
            base,
        );

        let fetched = provider
            .analyze_url("https://example.com/tesla", 5, 5)
            .await
            .unwrap();
        assert_eq!(fetched.absence(), Some(Absence::Status(401)));
    }
}
