//! # ARbiz Card Core
//!
//! Viewer logic for published business cards, free of I/O so it runs
//! unchanged in the browser (WASM) and on the server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Card Model      │  Render Mode             │
//! │  - CardView      │  - Capability probe      │
//! │  - LinkAction    │  - Fallback chain        │
//! ├─────────────────────────────────────────────┤
//! │  Layout          │  AR Session              │
//! │  - Text lines    │  - Phase machine         │
//! │  - Hit zones     │  - Raycasting            │
//! ├─────────────────────────────────────────────┤
//! │  Viewer Page: load, record view, degrade    │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod card;
pub mod error;
pub mod event;
pub mod layout;
pub mod mode;
pub mod session;
pub mod spatial;
pub mod viewer;
pub mod zone;

pub use card::{CardView, ContactKind, LinkAction, DEFAULT_FONT, DEFAULT_THEME_COLOR, SAFE_FONTS};
pub use error::{ViewerError, ViewerResult};
pub use event::{ArInput, RenderLoop, SessionEvent};
pub use layout::{CardLayout, ContactLine, PixelRect, TextAnchor, TextLine, TextRole};
pub use mode::{CapabilityDetector, CapabilityProbe, RenderMode};
pub use session::{ArSession, ArSessionConfig, ArSessionId, HitOutcome, SessionPhase};
pub use spatial::{Camera, CardPlane, PlaneHit, Pose, Quat, Ray, Vec3};
pub use viewer::{Analytics, CardProvider, ViewState, ViewerPage};
pub use zone::{InteractiveZone, ZoneBounds};

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
