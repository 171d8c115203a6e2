//! Bounded media download over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::traits::RemoteFetch;

/// Cap on a single downloaded object. Segments of a few tens of seconds
/// stay well under this.
const MAX_FETCH_BYTES: u64 = 512 * 1024 * 1024;

/// [`RemoteFetch`] over plain HTTP GET.
pub struct HttpFetcher {
    http: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PipelineError::from)?;
        Ok(Self {
            http,
            max_bytes: MAX_FETCH_BYTES,
        })
    }

    /// Override the download cap.
    pub fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl RemoteFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>> {
        let mut response = self.http.get(url).send().await?.error_for_status()?;

        // Reject up front when the server announces the size, but the cap
        // must hold for chunked bodies too.
        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(PipelineError::upstream(format!(
                    "remote object too large ({len} bytes)"
                )));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() as u64 + chunk.len() as u64 > self.max_bytes {
                return Err(PipelineError::upstream(format!(
                    "remote object too large (over {} bytes)",
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        debug!("Fetched {} bytes", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/seg.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3, 4]))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/seg.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing.mp4", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(_)));
    }

    // The cap holds even when the body arrives without a Content-Length
    // announcing it.
    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_limit(16);
        let err = fetcher
            .fetch(&format!("{}/huge.mp4", server.uri()))
            .await
            .unwrap_err();
        match err {
            PipelineError::Upstream(msg) => assert!(msg.contains("too large"), "got: {msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
