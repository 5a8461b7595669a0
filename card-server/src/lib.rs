//! # ARbiz Card Server Library
//!
//! HTTP surface for the card viewer: public card lookup, view analytics,
//! composed textures, interactive zones and the static fallback page.
//! Used by both the binary and the integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{routing::get, Router};
use card_renderer::{ImageLoader, TextureComposer};

pub mod config;
pub mod health;
pub mod loader;
pub mod metrics;
pub mod routes;
pub mod store;

pub use config::ServerArgs;
pub use loader::HttpImageLoader;
pub use store::{CardStore, StoredCard};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Published cards and their scan counts.
    pub store: CardStore,
    /// Texture composer shared across requests.
    pub composer: Arc<TextureComposer>,
    /// Image source for texture composition.
    pub loader: Arc<dyn ImageLoader>,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(
        store: CardStore,
        composer: TextureComposer,
        loader: impl ImageLoader + 'static,
    ) -> Self {
        Self {
            store,
            composer: Arc::new(composer),
            loader: Arc::new(loader),
        }
    }
}

/// Build the application router: card API, fallback page and health probes.
///
/// Metrics and the HTTP middleware stack are added by the binary.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .with_state(state)
}
