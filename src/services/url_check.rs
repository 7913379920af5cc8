use reqwest::{Client as HttpClient, StatusCode};
use std::time::Duration;

use crate::{error::AppResult, models::validation::is_http_url};

/// Timeout for the reachability probe of a submitted article URL
pub const URL_CHECK_TIMEOUT: Duration = Duration::from_millis(500);

/// Decides whether a submitted article URL may be stored
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UrlChecker: Send + Sync {
    async fn is_valid(&self, url: &str) -> bool;
}

/// Probes the URL with a HEAD request
///
/// Only a definite "gone" answer (404 or 410) rejects the URL. Slow or
/// unreachable hosts and every other status are accepted, so a flaky
/// publisher never blocks a bookmark.
#[derive(Clone)]
pub struct HttpUrlChecker {
    client: HttpClient,
}

impl HttpUrlChecker {
    pub fn new() -> AppResult<Self> {
        let client = HttpClient::builder().timeout(URL_CHECK_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl UrlChecker for HttpUrlChecker {
    async fn is_valid(&self, url: &str) -> bool {
        if !is_http_url(url) {
            return false;
        }

        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                let gone = status == StatusCode::NOT_FOUND || status == StatusCode::GONE;
                if gone {
                    tracing::info!(url, status = status.as_u16(), "Article URL is gone");
                }
                !gone
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "URL probe failed; accepting");
                true
            }
        }
    }
}
