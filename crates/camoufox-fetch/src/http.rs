//! HTTP backend abstraction for release feeds and asset downloads.
//!
//! The [`Downloader`](crate::Downloader) only needs "GET this URL and give me
//! a status, an optional length and a body stream". Keeping that behind a
//! trait lets tests script failures without a socket.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use camoufox_core::{FetchConfig, FetchError, FetchResult};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;

/// Streamed response body.
pub type ByteStream = BoxStream<'static, FetchResult<Bytes>>;

/// Status line and body of a single GET.
pub struct HttpResponse {
    pub status: u16,
    /// Declared body length. `None` or `Some(0)` means unknown.
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl HttpResponse {
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can issue a streamed GET.
///
/// Retrying is the caller's job; a backend performs exactly one request per
/// call so attempt counts stay observable.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn get(&self, url: &str) -> FetchResult<HttpResponse>;
}

#[async_trait]
impl<T: HttpBackend + ?Sized> HttpBackend for Arc<T> {
    async fn get(&self, url: &str) -> FetchResult<HttpResponse> {
        (**self).get(url).await
    }
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
pub struct ReqwestBackend {
    client: reqwest::Client,
    api_base_url: String,
    auth_token: Option<String>,
}

impl ReqwestBackend {
    /// Create a backend with the configured user agent, connect timeout and token.
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(FetchError::network)?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url().to_string(),
            auth_token: config.github_token().map(str::to_string),
        })
    }

    /// Build a request, attaching API headers only for the release API host.
    ///
    /// Asset downloads redirect to a storage host that rejects foreign
    /// `Authorization` headers.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if url.starts_with(&self.api_base_url) {
            request = request.header("Accept", "application/vnd.github+json");
            if let Some(ref token) = self.auth_token {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
        }
        request
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get(&self, url: &str) -> FetchResult<HttpResponse> {
        let response = self
            .build_request(url)
            .send()
            .await
            .map_err(FetchError::network)?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(FetchError::network))
            .boxed();

        Ok(HttpResponse {
            status,
            content_length,
            body,
        })
    }
}

// ============================================================================
// Scripted Backend for Testing
// ============================================================================


#[cfg(test)]
mod tests {
    use super::testing::{Scripted, ScriptedBackend};
    use super::*;

    #[tokio::test]
    async fn test_scripted_backend_replays_in_order_then_repeats_last() {
        let backend = ScriptedBackend::new().script(
            "https://x/a",
            [Scripted::Status(500), Scripted::body(b"ok")],
        );

        assert_eq!(backend.get("https://x/a").await.unwrap().status, 500);
        assert_eq!(backend.get("https://x/a").await.unwrap().status, 200);
        assert_eq!(backend.get("https://x/a").await.unwrap().status, 200);
        assert_eq!(backend.attempts("https://x/a"), 3);
    }

    #[tokio::test]
    async fn test_arc_backend_delegates() {
        let backend = Arc::new(ScriptedBackend::new().script("u", [Scripted::Network]));
        let shared: Arc<ScriptedBackend> = Arc::clone(&backend);
        assert!(shared.get("u").await.is_err());
        assert_eq!(backend.attempts("u"), 1);
    }

    #[test]
    fn test_reqwest_backend_builds_from_config() {
        let config = FetchConfig::new("/tmp/camoufox-test/install", "/tmp/camoufox-test/data")
            .with_github_token(Some("secret".into()));
        let backend = ReqwestBackend::new(&config).unwrap();
        assert_eq!(backend.auth_token.as_deref(), Some("secret"));

        let api = backend
            .build_request(&config.releases_url())
            .build()
            .unwrap();
        assert!(api.headers().contains_key("Authorization"));

        let asset = backend
            .build_request("https://objects.example.com/camoufox.zip")
            .build()
            .unwrap();
        assert!(!asset.headers().contains_key("Authorization"));
    }

    #[test]
    fn test_success_range() {
        let response = |status| HttpResponse {
            status,
            content_length: None,
            body: futures_util::stream::empty().boxed(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(302).is_success());
        assert!(!response(404).is_success());
    }
}
