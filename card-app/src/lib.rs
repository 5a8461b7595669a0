//! # ARbiz Viewer WASM Application
//!
//! Browser bindings for the card viewer: render-mode detection, the AR
//! session controller and the static fallback.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web card-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { CardViewer } from './pkg/card_app.js';
//!
//! await init();
//! const viewer = new CardViewer('', cardId);
//! viewer.setListener((json) => handleEvent(JSON.parse(json)));
//! const state = JSON.parse(await viewer.load());
//! if (state.state === 'showing' && state.mode !== 'static-fallback') {
//!     viewer.mount();
//!     await buildScene(viewer.textureUrl());
//!     viewer.sceneReady();
//! } else {
//!     container.innerHTML = viewer.fallbackHtml();
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use card_core::{CapabilityDetector, CardView};
use card_renderer::render_fallback_html;
use wasm_bindgen::prelude::*;

pub mod api;
pub mod error;
pub mod probe;
pub mod viewer;

pub use api::ApiClient;
pub use error::AppError;
pub use probe::NavigatorProbe;
pub use viewer::CardViewer;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("ARbiz viewer WASM initialized");
}

/// Detect the best render mode for this browser.
///
/// Resolves to `"immersive-ar"`, `"marker-ar"` or `"static-fallback"`.
///
/// # Errors
///
/// Rejects only when called outside a browsing context.
#[wasm_bindgen(js_name = detectRenderMode)]
pub async fn detect_render_mode() -> Result<String, JsValue> {
    let probe = NavigatorProbe::from_window()?;
    let mode = CapabilityDetector::new().detect(&probe).await;
    Ok(mode.as_str().to_string())
}

/// Render static card markup from a card JSON record.
///
/// # Errors
///
/// Returns an error if the JSON is not a card record.
#[wasm_bindgen(js_name = fallbackHtml)]
pub fn fallback_html(card_json: &str) -> Result<String, JsValue> {
    let card = CardView::from_json(card_json).map_err(AppError::from)?;
    Ok(render_fallback_html(&card))
}
