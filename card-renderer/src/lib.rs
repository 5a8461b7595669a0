//! # ARbiz Card Renderer
//!
//! Turns a [`card_core::CardView`] into something a person can look at.
//!
//! ## Outputs
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  CardView                   │
//! ├──────────────────────┬──────────────────────┤
//! │ Texture Composer     │ Fallback Renderer    │
//! │ SVG ─▶ resvg ─▶ PNG  │ HTML + live links    │
//! │ (AR card face)       │ (no AR / AR failed)  │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! The composer needs the `raster` feature (on by default). Browser builds
//! disable it and keep only the fallback renderer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
#[cfg(feature = "raster")]
pub mod compose;
pub mod error;
pub mod fallback;
#[cfg(feature = "raster")]
pub mod image;
#[cfg(feature = "raster")]
pub mod loader;

#[cfg(feature = "raster")]
pub use compose::{
    ComposedTexture, ComposerConfig, ImageLayer, OmittedLayer, TextureComposer,
};
pub use error::{RenderError, RenderResult};
pub use fallback::{render_fallback_html, render_fallback_page, render_not_found_page};
#[cfg(feature = "raster")]
pub use image::{ImageFormat, LoadedImage};
#[cfg(feature = "raster")]
pub use loader::{ImageLoader, LoadAttempt, LoadPolicy};
