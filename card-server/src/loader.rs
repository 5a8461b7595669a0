//! HTTP image loader backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use card_renderer::{ImageLoader, LoadAttempt, RenderError, RenderResult};
use reqwest::Client;
use thiserror::Error;
use url::Url;

const USER_AGENT: &str = concat!("arbiz-viewer/", env!("CARGO_PKG_VERSION"));

/// Errors building the HTTP loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fetches card images over HTTP(S).
///
/// Per-attempt time budgets are enforced by the caller's load policy; the
/// client only bounds connection setup.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    /// Create a loader with the given connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(connect_timeout: Duration) -> Result<Self, LoaderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn fetch(&self, url: &str, attempt: LoadAttempt) -> RenderResult<Vec<u8>> {
        let parsed =
            Url::parse(url).map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RenderError::Resource(format!(
                "unsupported image scheme: {}",
                parsed.scheme()
            )));
        }

        tracing::debug!(%url, ?attempt, "Fetching card image");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Resource(format!("{url}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Resource(format!("{url}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader() -> HttpImageLoader {
        HttpImageLoader::new(Duration::from_secs(2)).expect("client")
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock binding can be blocked by the macOS sandbox"
    )]
    async fn test_fetches_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = loader()
            .fetch(&format!("{}/logo.png", server.uri()), LoadAttempt::Primary)
            .await
            .expect("fetch");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock binding can be blocked by the macOS sandbox"
    )]
    async fn test_http_error_is_resource_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = loader()
            .fetch(&format!("{}/missing.png", server.uri()), LoadAttempt::Retry)
            .await
            .expect_err("404 fails");
        assert!(matches!(err, RenderError::Resource(msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn test_rejects_non_http_schemes() {
        let err = loader()
            .fetch("file:///etc/passwd", LoadAttempt::Primary)
            .await
            .expect_err("file scheme rejected");
        assert!(matches!(err, RenderError::Resource(msg) if msg.contains("file")));

        assert!(loader()
            .fetch("not a url", LoadAttempt::Primary)
            .await
            .is_err());
    }
}
