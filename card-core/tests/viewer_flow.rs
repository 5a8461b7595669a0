//! Viewer Flow Integration Tests
//!
//! Drives a card from load through an AR session using only the public API:
//! - Mode detection per environment
//! - Zones for partially filled cards
//! - Screen taps inside and outside zones

use async_trait::async_trait;
use card_core::{
    zone, Analytics, ArInput, ArSession, ArSessionConfig, Camera, CapabilityProbe, CardProvider,
    CardView, ContactKind, HitOutcome, Pose, RenderMode, SessionPhase, ViewerError, ViewerPage,
    ViewerResult,
};

struct StaticProvider(CardView);

#[async_trait(?Send)]
impl CardProvider for StaticProvider {
    async fn get_published_card(&self, public_id: &str) -> ViewerResult<CardView> {
        if self.0.card_id == public_id {
            Ok(self.0.clone())
        } else {
            Err(ViewerError::NotFound(public_id.to_string()))
        }
    }
}

struct NoAnalytics;

#[async_trait(?Send)]
impl Analytics for NoAnalytics {
    async fn record_view(&self, _public_id: &str) -> ViewerResult<()> {
        Ok(())
    }
}

struct Environment {
    immersive_ar: bool,
    user_agent: &'static str,
}

#[async_trait(?Send)]
impl CapabilityProbe for Environment {
    async fn immersive_ar_supported(&self) -> ViewerResult<bool> {
        Ok(self.immersive_ar)
    }

    fn user_agent(&self) -> ViewerResult<String> {
        Ok(self.user_agent.to_string())
    }
}

const DESKTOP: Environment = Environment {
    immersive_ar: false,
    user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0",
};

const XR_HEADSET: Environment = Environment {
    immersive_ar: true,
    user_agent: "Mozilla/5.0 (X11; Linux x86_64) OculusBrowser/33.0",
};

fn jane() -> CardView {
    CardView {
        card_id: "jane".into(),
        full_name: "Jane Doe".into(),
        phone: "+1 555 0100".into(),
        email: String::new(),
        website: "https://x.co".into(),
        is_published: true,
        ..CardView::default()
    }
}

#[tokio::test]
async fn test_desktop_without_ar_shows_static_page() {
    let mut page = ViewerPage::new("jane");
    page.load(&StaticProvider(jane()), &NoAnalytics, &DESKTOP)
        .await;
    assert_eq!(page.mode(), Some(RenderMode::StaticFallback));
}

#[tokio::test]
async fn test_ar_environment_gets_two_zones() {
    let mut page = ViewerPage::new("jane");
    page.load(&StaticProvider(jane()), &NoAnalytics, &XR_HEADSET)
        .await;
    assert_eq!(page.mode(), Some(RenderMode::ImmersiveAr));

    let card = page.card().expect("card loaded");
    let kinds: Vec<_> = zone::zones_for(card).iter().map(|z| z.kind).collect();
    assert_eq!(kinds, vec![ContactKind::Phone, ContactKind::Website]);
}

#[tokio::test]
async fn test_unknown_card_is_not_found() {
    let mut page = ViewerPage::new("nobody");
    let state = page
        .load(&StaticProvider(jane()), &NoAnalytics, &XR_HEADSET)
        .await;
    assert_eq!(*state, card_core::ViewState::NotFound);
}

#[test]
fn test_tap_outside_zones_keeps_session_active() {
    let mut session = ArSession::new(ArSessionConfig::default());
    session.mount().expect("mount");
    session
        .scene_ready(zone::zones_for(&jane()))
        .expect("scene ready");
    session.request_start().expect("user starts");
    session.session_started().expect("platform grants");

    // Top-left of the screen lands on the header, far from the contact block.
    let tap = ArInput::ScreenTap {
        ndc_x: -0.05,
        ndc_y: 0.05,
        camera: Camera::default(),
    };
    let outcome = session
        .handle_input(&tap, &Pose::default())
        .expect("input accepted");

    assert_eq!(outcome, HitOutcome::Miss);
    assert_eq!(session.phase(), SessionPhase::Active);
    assert!(session.pending_action().is_none());
}
