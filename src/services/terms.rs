use std::sync::Arc;
use tracing::instrument;
use url::Url;

use crate::{
    error::AppResult,
    models::{RelevantTerms, Term},
    services::{providers::TextAnalyzer, Fetched},
};

/// How many terms to request and which relevance they must exceed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermLimits {
    pub keyword_count: u32,
    pub concept_count: u32,
    pub keyword_relevance: f64,
    pub concept_relevance: f64,
}

impl Default for TermLimits {
    fn default() -> Self {
        Self {
            keyword_count: 5,
            concept_count: 5,
            keyword_relevance: 0.7,
            concept_relevance: 0.9,
        }
    }
}

/// Turns an article URL into the keywords and concepts worth tagging
#[derive(Clone)]
pub struct TermExtractor {
    analyzer: Arc<dyn TextAnalyzer>,
    skip_domains: Vec<String>,
    limits: TermLimits,
}

impl TermExtractor {
    pub fn new(analyzer: Arc<dyn TextAnalyzer>, skip_domains: Vec<String>, limits: TermLimits) -> Self {
        let skip_domains = skip_domains
            .into_iter()
            .map(|d| d.trim().trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            analyzer,
            skip_domains,
            limits,
        }
    }

    pub fn skip_domains(&self) -> &[String] {
        &self.skip_domains
    }

    /// True when the URL's host is a skip-listed domain or one of its subdomains
    pub fn is_skipped(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return false;
        };

        self.skip_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Keywords and concepts of the article above their relevance thresholds
    ///
    /// Skip-listed URLs and analyzer outages both yield empty terms.
    #[instrument(skip(self))]
    pub async fn relevant_terms(&self, url: &str) -> AppResult<RelevantTerms> {
        if self.is_skipped(url) {
            tracing::debug!("Skipping analysis for skip-listed domain");
            return Ok(RelevantTerms::default());
        }

        let analysis = match self
            .analyzer
            .analyze_url(url, self.limits.keyword_count, self.limits.concept_count)
            .await?
        {
            Fetched::Data(analysis) => analysis,
            Fetched::Absent(reason) => {
                tracing::warn!(
                    analyzer = self.analyzer.name(),
                    reason = %reason,
                    "No analysis available"
                );
                return Ok(RelevantTerms::default());
            }
        };

        let terms = RelevantTerms {
            keywords: filter_terms(
                analysis.keywords,
                self.limits.keyword_relevance,
                self.limits.keyword_count,
            ),
            concepts: filter_terms(
                analysis.concepts,
                self.limits.concept_relevance,
                self.limits.concept_count,
            ),
        };

        tracing::debug!(
            keywords = terms.keywords.len(),
            concepts = terms.concepts.len(),
            "Extracted relevant terms"
        );

        Ok(terms)
    }
}

/// Texts of terms strictly above `threshold`, in input order, at most `cap`
pub fn filter_terms(terms: Vec<Term>, threshold: f64, cap: u32) -> Vec<String> {
    terms
        .into_iter()
        .filter(|term| term.relevance > threshold)
        .map(|term| term.text)
        .take(cap as usize)
        .collect()
}
