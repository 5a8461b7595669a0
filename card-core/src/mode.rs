//! Render-mode selection and the AR fallback chain.
//!
//! ```text
//!   immersive-ar ──fail──▶ marker-ar ──fail──▶ static-fallback
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ViewerResult;

/// User-agent fragments identifying handheld devices (matched case-insensitively).
const MOBILE_SIGNATURES: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Strategy used to present a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Native immersive AR session with pose tracking.
    ImmersiveAr,
    /// Fiducial-marker AR without native session support.
    MarkerAr,
    /// Flat 2-D page.
    StaticFallback,
}

/// Explicit failure edges between render modes.
const FAILURE_TRANSITIONS: [(RenderMode, RenderMode); 2] = [
    (RenderMode::ImmersiveAr, RenderMode::MarkerAr),
    (RenderMode::MarkerAr, RenderMode::StaticFallback),
];

impl RenderMode {
    /// The mode to use after this one fails.
    ///
    /// Static fallback has no weaker mode and stays put.
    #[must_use]
    pub fn on_failure(self) -> Self {
        FAILURE_TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map_or(self, |(_, to)| *to)
    }

    /// Whether this mode presents an AR scene.
    #[must_use]
    pub fn is_ar(self) -> bool {
        !matches!(self, Self::StaticFallback)
    }

    /// Kebab-case name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImmersiveAr => "immersive-ar",
            Self::MarkerAr => "marker-ar",
            Self::StaticFallback => "static-fallback",
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boundary to the platform's capability queries.
///
/// Not `Send`: browser promises are bound to the UI thread.
#[async_trait(?Send)]
pub trait CapabilityProbe {
    /// Whether an `immersive-ar` session type is supported.
    ///
    /// # Errors
    ///
    /// Returns an error if the XR subsystem is missing or the query throws.
    async fn immersive_ar_supported(&self) -> ViewerResult<bool>;

    /// The user-agent string.
    ///
    /// # Errors
    ///
    /// Returns an error if the user agent cannot be read.
    fn user_agent(&self) -> ViewerResult<String>;
}

/// Check whether a user agent belongs to a handheld device.
#[must_use]
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_lowercase();
    MOBILE_SIGNATURES.iter().any(|sig| ua.contains(sig))
}

/// Classify already-probed capabilities into a render mode.
#[must_use]
pub fn classify(immersive_ar: bool, mobile: bool) -> RenderMode {
    if immersive_ar {
        RenderMode::ImmersiveAr
    } else if mobile {
        RenderMode::MarkerAr
    } else {
        RenderMode::StaticFallback
    }
}

/// Probes the platform once and remembers the outcome.
#[derive(Debug, Default)]
pub struct CapabilityDetector {
    detected: Option<RenderMode>,
}

impl CapabilityDetector {
    /// Create a detector that has not probed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mode detected so far, if any.
    #[must_use]
    pub fn detected(&self) -> Option<RenderMode> {
        self.detected
    }

    /// Detect the render mode.
    ///
    /// The first call probes the platform; later calls return the cached
    /// result without probing again. Probe failures count as "not supported"
    /// for that tier.
    pub async fn detect<P>(&mut self, probe: &P) -> RenderMode
    where
        P: CapabilityProbe + ?Sized,
    {
        if let Some(mode) = self.detected {
            return mode;
        }

        let immersive_ar = match probe.immersive_ar_supported().await {
            Ok(supported) => supported,
            Err(e) => {
                tracing::warn!("Immersive AR probe failed: {e}");
                false
            }
        };

        let mobile = !immersive_ar
            && match probe.user_agent() {
                Ok(ua) => is_mobile_user_agent(&ua),
                Err(e) => {
                    tracing::warn!("User agent probe failed: {e}");
                    false
                }
            };

        let mode = classify(immersive_ar, mobile);
        tracing::info!("Render mode detected: {mode}");
        self.detected = Some(mode);
        mode
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::ViewerError;

    struct FakeProbe {
        xr: ViewerResult<bool>,
        ua: ViewerResult<&'static str>,
        calls: Cell<u32>,
    }

    impl FakeProbe {
        fn new(xr: ViewerResult<bool>, ua: &'static str) -> Self {
            Self::with_user_agent(xr, Ok(ua))
        }

        fn with_user_agent(xr: ViewerResult<bool>, ua: ViewerResult<&'static str>) -> Self {
            Self {
                xr,
                ua,
                calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl CapabilityProbe for FakeProbe {
        async fn immersive_ar_supported(&self) -> ViewerResult<bool> {
            self.calls.set(self.calls.get() + 1);
            self.xr.clone()
        }

        fn user_agent(&self) -> ViewerResult<String> {
            self.ua.clone().map(str::to_string)
        }
    }

    const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/126.0";

    #[tokio::test]
    async fn test_immersive_ar_wins() {
        let probe = FakeProbe::new(Ok(true), ANDROID_UA);
        let mut detector = CapabilityDetector::new();
        assert_eq!(detector.detect(&probe).await, RenderMode::ImmersiveAr);
    }

    #[tokio::test]
    async fn test_mobile_without_xr_uses_marker() {
        let probe = FakeProbe::new(Ok(false), ANDROID_UA);
        let mut detector = CapabilityDetector::new();
        assert_eq!(detector.detect(&probe).await, RenderMode::MarkerAr);
    }

    #[tokio::test]
    async fn test_probe_error_falls_through() {
        let probe = FakeProbe::new(
            Err(ViewerError::CapabilityAbsent("navigator.xr missing".into())),
            DESKTOP_UA,
        );
        let mut detector = CapabilityDetector::new();
        assert_eq!(detector.detect(&probe).await, RenderMode::StaticFallback);
    }

    #[tokio::test]
    async fn test_user_agent_error_falls_through() {
        let probe = FakeProbe::with_user_agent(
            Ok(false),
            Err(ViewerError::CapabilityAbsent("navigator missing".into())),
        );
        let mut detector = CapabilityDetector::new();
        assert_eq!(detector.detect(&probe).await, RenderMode::StaticFallback);
    }

    #[tokio::test]
    async fn test_every_probe_failing_yields_static() {
        let probe = FakeProbe::with_user_agent(
            Err(ViewerError::CapabilityAbsent("navigator.xr missing".into())),
            Err(ViewerError::CapabilityAbsent("navigator missing".into())),
        );
        let mut detector = CapabilityDetector::new();
        assert_eq!(detector.detect(&probe).await, RenderMode::StaticFallback);
        assert_eq!(detector.detected(), Some(RenderMode::StaticFallback));
    }

    #[tokio::test]
    async fn test_detection_is_idempotent() {
        let probe = FakeProbe::new(Ok(true), DESKTOP_UA);
        let mut detector = CapabilityDetector::new();

        let first = detector.detect(&probe).await;
        let second = detector.detect(&probe).await;

        assert_eq!(first, second);
        assert_eq!(probe.calls.get(), 1, "second call must not re-probe");
    }

    #[test]
    fn test_mobile_signatures() {
        assert!(is_mobile_user_agent(ANDROID_UA));
        assert!(is_mobile_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)"));
        assert!(is_mobile_user_agent("Opera/9.80 (J2ME/MIDP; Opera Mini/9.80)"));
        assert!(!is_mobile_user_agent(DESKTOP_UA));
    }

    #[test]
    fn test_failure_chain() {
        assert_eq!(RenderMode::ImmersiveAr.on_failure(), RenderMode::MarkerAr);
        assert_eq!(RenderMode::MarkerAr.on_failure(), RenderMode::StaticFallback);
        assert_eq!(
            RenderMode::StaticFallback.on_failure(),
            RenderMode::StaticFallback
        );
    }

    #[test]
    fn test_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&RenderMode::ImmersiveAr).expect("serialize");
        assert_eq!(json, "\"immersive-ar\"");
    }
}
