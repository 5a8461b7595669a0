//! Input and lifecycle events of the AR session.

use serde::{Deserialize, Serialize};

use crate::session::SessionPhase;
use crate::spatial::{Camera, Pose, Ray};
use crate::LinkAction;

/// A selection made while the AR session is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ArInput {
    /// A tap on the screen, in normalized device coordinates.
    #[serde(rename_all = "camelCase")]
    ScreenTap {
        /// X in `-1..=1`, right positive.
        ndc_x: f32,
        /// Y in `-1..=1`, up positive.
        ndc_y: f32,
        /// Camera the tap was made through.
        camera: Camera,
    },
    /// A controller `select` event.
    ControllerSelect {
        /// Controller pose at selection time.
        pose: Pose,
    },
}

impl ArInput {
    /// The world-space ray this input casts.
    #[must_use]
    pub fn ray(&self) -> Ray {
        match self {
            Self::ScreenTap {
                ndc_x,
                ndc_y,
                camera,
            } => camera.ray_from_ndc(*ndc_x, *ndc_y),
            Self::ControllerSelect { pose } => Ray::from_pose(pose),
        }
    }
}

/// Which render loop drives the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderLoop {
    /// Nothing is rendering.
    #[default]
    None,
    /// The page's regular animation loop.
    Regular,
    /// The XR session's frame loop.
    Xr,
}

/// Lifecycle notification emitted by [`crate::ArSession`].
///
/// The platform adapter performs the side effect each event describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The session moved between phases.
    PhaseChanged {
        /// Previous phase.
        from: SessionPhase,
        /// New phase.
        to: SessionPhase,
    },
    /// Input listeners should be attached.
    InputAttached,
    /// Input listeners should be detached.
    InputDetached,
    /// Cancel the `from` loop, then start the `to` loop.
    LoopChanged {
        /// Loop being cancelled.
        from: RenderLoop,
        /// Loop being started.
        to: RenderLoop,
    },
    /// The platform session should be ended.
    EndRequested,
    /// Call [`crate::ArSession::request_end`] after this many milliseconds.
    #[serde(rename_all = "camelCase")]
    EndScheduled {
        /// Delay in milliseconds.
        after_ms: u64,
    },
    /// A zone hit replaced the pending action.
    ActionQueued {
        /// The queued action.
        action: LinkAction,
    },
    /// Navigate to the action's URL.
    ActionDispatched {
        /// The dispatched action.
        action: LinkAction,
    },
    /// The session failed.
    Failed {
        /// User-facing message.
        message: String,
    },
}
