//! Polling sources for the fallback transport.

use crate::TransportResult;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches one poll body.
#[async_trait]
pub trait PollSource: Send + Sync {
    /// Returns `Ok(None)` when the endpoint answered with a non-success
    /// status; such ticks are skipped without an error event.
    async fn fetch(&self, url: &Url) -> TransportResult<Option<Value>>;
}

/// Authenticated HTTP GET poller.
pub struct HttpPollSource {
    client: Client,
    auth_token: Option<String>,
}

impl HttpPollSource {
    pub fn new(timeout: Duration, auth_token: Option<String>) -> TransportResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, auth_token })
    }
}

#[async_trait]
impl PollSource for HttpPollSource {
    async fn fetch(&self, url: &Url) -> TransportResult<Option<Value>> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "Poll returned non-success status");
            return Ok(None);
        }

        Ok(Some(response.json().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let source = HttpPollSource::new(Duration::from_secs(2), Some("token".into())).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/notifications")).unwrap();
        assert!(source.fetch(&url).await.is_err());
    }
}
