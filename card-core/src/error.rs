//! Error types for viewer operations.

use thiserror::Error;

use crate::session::SessionPhase;

/// Result type for viewer operations.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Errors that can occur while presenting a card.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    /// The platform lacks the queried AR feature.
    ///
    /// Recoverable by falling to the next weaker render mode.
    #[error("Capability absent: {0}")]
    CapabilityAbsent(String),

    /// An image failed to fetch or decode.
    #[error("Failed to load resource: {0}")]
    ResourceLoad(String),

    /// The AR session request was rejected or the session failed mid-flight.
    #[error("AR session failed: {0}")]
    Session(String),

    /// The 3-D scene could not be constructed.
    #[error("Scene construction failed: {0}")]
    SceneBuild(String),

    /// The requested card does not exist or is not published.
    #[error("Card not found: {0}")]
    NotFound(String),

    /// The card provider could not be reached.
    #[error("Card provider unavailable: {0}")]
    Provider(String),

    /// A session operation was requested in a phase that does not allow it.
    #[error("Cannot {action} while session is {phase}")]
    InvalidTransition {
        /// Phase the session was in.
        phase: SessionPhase,
        /// Operation that was attempted.
        action: &'static str,
    },

    /// The session was disposed and accepts no further operations.
    #[error("Session disposed")]
    Disposed,

    /// Card record serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ViewerError {
    /// Whether the error should degrade the render mode rather than surface
    /// to the user.
    #[must_use]
    pub fn is_mode_failure(&self) -> bool {
        matches!(
            self,
            Self::CapabilityAbsent(_) | Self::Session(_) | Self::SceneBuild(_)
        )
    }

    /// Message suitable for display; never includes internal detail for
    /// session failures.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Card not found".to_string(),
            Self::CapabilityAbsent(_) | Self::Session(_) | Self::SceneBuild(_) => {
                "AR unavailable on this device".to_string()
            }
            Self::Provider(_) => "Unable to load card".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
