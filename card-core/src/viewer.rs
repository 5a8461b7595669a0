//! Orchestration of a single card view: load, record, detect, degrade.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::mode::{CapabilityDetector, CapabilityProbe, RenderMode};
use crate::{CardView, ViewerError, ViewerResult};

/// Source of published cards.
#[async_trait(?Send)]
pub trait CardProvider {
    /// Fetch a published card by its public ID.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::NotFound`] for unknown or unpublished cards and
    /// [`ViewerError::Provider`] when the source cannot be reached.
    async fn get_published_card(&self, public_id: &str) -> ViewerResult<CardView>;
}

/// Sink for view analytics.
#[async_trait(?Send)]
pub trait Analytics {
    /// Record one view of a card.
    ///
    /// # Errors
    ///
    /// Returns an error if the view could not be recorded. Callers ignore it.
    async fn record_view(&self, public_id: &str) -> ViewerResult<()>;
}

/// What the page is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ViewState {
    /// Fetching the card.
    Loading,
    /// The card does not exist or is not published. Terminal.
    NotFound,
    /// The card could not be fetched; retry is offered.
    Error {
        /// User-facing message.
        message: String,
    },
    /// The card is on screen.
    Showing {
        /// How it is presented.
        mode: RenderMode,
    },
}

/// One viewer page for one public card ID.
#[derive(Debug)]
pub struct ViewerPage {
    public_id: String,
    state: ViewState,
    card: Option<CardView>,
    detector: CapabilityDetector,
    view_recorded: bool,
}

impl ViewerPage {
    /// Create a page for a public card ID.
    #[must_use]
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            state: ViewState::Loading,
            card: None,
            detector: CapabilityDetector::new(),
            view_recorded: false,
        }
    }

    /// The public card ID.
    #[must_use]
    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// The loaded card.
    #[must_use]
    pub fn card(&self) -> Option<&CardView> {
        self.card.as_ref()
    }

    /// The active render mode, once showing.
    #[must_use]
    pub fn mode(&self) -> Option<RenderMode> {
        match self.state {
            ViewState::Showing { mode } => Some(mode),
            _ => None,
        }
    }

    /// Load the card, record the view and pick a render mode.
    ///
    /// Calling again after an error retries. A `NotFound` page stays terminal
    /// and a showing page keeps its card and mode.
    pub async fn load<C, A, P>(&mut self, provider: &C, analytics: &A, probe: &P) -> &ViewState
    where
        C: CardProvider + ?Sized,
        A: Analytics + ?Sized,
        P: CapabilityProbe + ?Sized,
    {
        if matches!(self.state, ViewState::NotFound | ViewState::Showing { .. }) {
            return &self.state;
        }
        self.state = ViewState::Loading;

        let card = match provider.get_published_card(&self.public_id).await {
            Ok(card) if card.is_published => card,
            Ok(_) | Err(ViewerError::NotFound(_)) => {
                tracing::info!("Card {} not found", self.public_id);
                self.state = ViewState::NotFound;
                return &self.state;
            }
            Err(e) => {
                tracing::warn!("Failed to load card {}: {e}", self.public_id);
                self.state = ViewState::Error {
                    message: e.user_message(),
                };
                return &self.state;
            }
        };

        if !self.view_recorded {
            self.view_recorded = true;
            if let Err(e) = analytics.record_view(&self.public_id).await {
                tracing::debug!("View not recorded for {}: {e}", self.public_id);
            }
        }

        let mode = if card.ar_enabled {
            self.detector.detect(probe).await
        } else {
            RenderMode::StaticFallback
        };

        self.card = Some(card);
        self.state = ViewState::Showing { mode };
        &self.state
    }

    /// Step down to the next weaker mode after the active one failed.
    ///
    /// Returns the new mode, or `None` if nothing is showing.
    pub fn mode_failed(&mut self, error: &ViewerError) -> Option<RenderMode> {
        let ViewState::Showing { mode } = self.state else {
            return None;
        };
        let next = mode.on_failure();
        tracing::warn!("Render mode {mode} failed ({error}); falling back to {next}");
        self.state = ViewState::Showing { mode: next };
        Some(next)
    }
}
