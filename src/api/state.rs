use std::sync::Arc;

use crate::{
    config::{default_skip_domains, Config},
    db::Store,
    services::{
        feed::FeedService,
        providers::{NewsSource, TextAnalyzer},
        recommendations::Recommender,
        terms::{TermExtractor, TermLimits},
        url_check::UrlChecker,
    },
};

/// Tunables of the tagging and recommendation pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Never analyzed, and excluded from every search
    pub skip_domains: Vec<String>,
    pub limits: TermLimits,
    pub max_tags: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            skip_domains: default_skip_domains(),
            limits: TermLimits::default(),
            max_tags: 4,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            skip_domains: config.skip_domains.clone(),
            limits: TermLimits {
                keyword_relevance: config.keyword_relevance,
                concept_relevance: config.concept_relevance,
                ..TermLimits::default()
            },
            max_tags: config.max_tags,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub feed: FeedService,
    pub extractor: TermExtractor,
    pub url_checker: Arc<dyn UrlChecker>,
    pub max_tags: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        news: Arc<dyn NewsSource>,
        analyzer: Arc<dyn TextAnalyzer>,
        url_checker: Arc<dyn UrlChecker>,
        settings: PipelineSettings,
    ) -> Self {
        let extractor = TermExtractor::new(analyzer, settings.skip_domains, settings.limits);
        // Searches exclude exactly the domains the extractor skips
        let skip_domains = extractor.skip_domains().to_vec();
        let recommender = Recommender::new(news.clone(), skip_domains.clone());
        Self {
            store,
            feed: FeedService::new(news, recommender, skip_domains),
            extractor,
            url_checker,
            max_tags: settings.max_tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        services::{
            providers::{MockNewsSource, MockTextAnalyzer},
            url_check::MockUrlChecker,
            Fetched,
        },
    };

    #[tokio::test]
    async fn test_spaced_skip_domains_reach_searches_clean() {
        let config: Config = envy::from_iter(vec![
            ("NEWS_API_KEY".to_string(), "news".to_string()),
            ("NLU_API_KEY".to_string(), "nlu".to_string()),
            ("NLU_URL".to_string(), "https://nlu.local".to_string()),
            ("SKIP_DOMAINS".to_string(), "youtube.com, Vimeo.com ,".to_string()),
        ])
        .unwrap();

        let mut news = MockNewsSource::new();
        news.expect_search()
            .withf(|query| query.exclude_domains == vec!["youtube.com", "vimeo.com"])
            .times(1)
            .returning(|_| Ok(Fetched::Data(Vec::new())));
        let mut analyzer = MockTextAnalyzer::new();
        analyzer.expect_analyze_url().never();

        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(news),
            Arc::new(analyzer),
            Arc::new(MockUrlChecker::new()),
            PipelineSettings::from(&config),
        );

        assert_eq!(state.extractor.skip_domains(), ["youtube.com", "vimeo.com"]);
        assert!(state.extractor.is_skipped("https://vimeo.com/12345"));

        let results = state.feed.search(&*state.store, None, "tesla").await.unwrap();
        assert!(results.articles.is_empty());
    }
}
