//! Image loading under a time budget with one retry.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RenderError, RenderResult};
use crate::image::{decode_data_uri, is_data_uri, LoadedImage};

/// Default time budget for one fetch attempt.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Which attempt a fetch is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAttempt {
    /// The first fetch.
    Primary,
    /// A fetch after the primary failed. Loaders may change strategy here
    /// (for example dropping credentials).
    Retry,
}

/// Fetches raw image bytes by URL.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch the bytes at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be fetched.
    async fn fetch(&self, url: &str, attempt: LoadAttempt) -> RenderResult<Vec<u8>>;
}

/// Timeout and retry policy for image loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    /// Budget per attempt.
    pub timeout: Duration,
    /// Whether a failed primary attempt is retried once.
    pub retry: bool,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_IMAGE_TIMEOUT,
            retry: true,
        }
    }
}

impl LoadPolicy {
    /// Load and validate an image.
    ///
    /// Data URIs are decoded in place without touching the loader. Remote
    /// sources get the primary attempt and, if enabled, one retry; each
    /// attempt (fetch and decode) is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error if every attempt fails.
    pub async fn load<L>(&self, loader: &L, src: &str) -> RenderResult<LoadedImage>
    where
        L: ImageLoader + ?Sized,
    {
        if is_data_uri(src) {
            return LoadedImage::from_bytes(decode_data_uri(src)?);
        }

        let attempts: &[LoadAttempt] = if self.retry {
            &[LoadAttempt::Primary, LoadAttempt::Retry]
        } else {
            &[LoadAttempt::Primary]
        };

        let mut last_error = RenderError::Resource(format!("No attempt made for {src}"));
        for &attempt in attempts {
            match self.attempt(loader, src, attempt).await {
                Ok(image) => return Ok(image),
                Err(e) => {
                    tracing::debug!("Image load {attempt:?} failed for {src}: {e}");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn attempt<L>(&self, loader: &L, src: &str, attempt: LoadAttempt) -> RenderResult<LoadedImage>
    where
        L: ImageLoader + ?Sized,
    {
        let fetch = async {
            let bytes = loader.fetch(src, attempt).await?;
            LoadedImage::from_bytes(bytes)
        };

        tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| RenderError::Timeout {
                url: src.to_string(),
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}
