//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An image could not be fetched or decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// An image fetch exceeded its time budget.
    #[error("Timed out loading {url} after {timeout_ms} ms")]
    Timeout {
        /// URL being fetched.
        url: String,
        /// Budget that was exceeded.
        timeout_ms: u64,
    },

    /// The texture could not be rasterized.
    #[error("Texture composition failed: {0}")]
    Compose(String),

    /// The texture could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<RenderError> for card_core::ViewerError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Resource(_) | RenderError::Timeout { .. } => {
                Self::ResourceLoad(err.to_string())
            }
            RenderError::Compose(_) | RenderError::Encode(_) => Self::SceneBuild(err.to_string()),
        }
    }
}
