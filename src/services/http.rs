use reqwest::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    config::AppEnv,
    error::{AppError, AppResult},
    services::{Absence, Fetched},
};

/// Timeout for search and analysis calls
pub const MAX_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP plumbing for the external providers
///
/// Every failure mode of a call (timeout, transport error, non-2xx status,
/// undecodable body) becomes [`Fetched::Absent`]. In development the
/// underlying error is returned instead and surfaces as a 502.
#[derive(Clone)]
pub struct ApiSession {
    client: HttpClient,
    env: AppEnv,
}

impl ApiSession {
    pub fn new(env: AppEnv) -> AppResult<Self> {
        let client = HttpClient::builder().timeout(MAX_TIMEOUT).build()?;
        Ok(Self { client, env })
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Sends `request` and decodes the JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> AppResult<Fetched<T>> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return self.degrade(service, classify(&e), e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return self.degrade(
                service,
                Absence::Status(status.as_u16()),
                AppError::ExternalApi(format!(
                    "{} returned status {}: {}",
                    service, status, body
                )),
            );
        }

        match response.json::<T>().await {
            Ok(body) => Ok(Fetched::Data(body)),
            Err(e) => {
                let reason = if e.is_timeout() {
                    Absence::Timeout
                } else {
                    Absence::NoData
                };
                self.degrade(service, reason, e.into())
            }
        }
    }

    /// Logs a failed call, then degrades it to absence outside development
    pub(crate) fn degrade<T>(
        &self,
        service: &'static str,
        reason: Absence,
        error: AppError,
    ) -> AppResult<Fetched<T>> {
        match reason {
            Absence::Timeout => tracing::error!(service, error = %error, "Request timed out"),
            _ => tracing::warn!(service, reason = %reason, error = %error, "External request failed"),
        }

        if self.env.is_development() {
            return Err(error);
        }
        Ok(Fetched::Absent(reason))
    }
}

fn classify(error: &reqwest::Error) -> Absence {
    if error.is_timeout() {
        Absence::Timeout
    } else {
        Absence::Transport
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;

    /// Serves `router` on an ephemeral local port and returns its base URL
    pub async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
