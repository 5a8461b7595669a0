//! AR session state machine.
//!
//! ```text
//!  uninitialized ─mount─▶ capability-checking ─scene_ready─▶ ready ◀────────┐
//!                               │ scene_failed                │ request_start│
//!                               ▼                             ▼              │
//!                             error ◀──rejected/runtime── starting           │
//!                               ▲                             │ started      │
//!                               │                             ▼              │
//!                               └────────runtime──────────  active          │
//!                                                             │ request_end  │
//!                                                             ▼              │
//!                                                           ending ─ended────┘
//! ```
//!
//! [`ArSession`] owns every session handle: the pending link action, the
//! input attachment flag and the active render loop. Only the transition
//! methods mutate it; [`ArSession::frame`] is read-only.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::{ArInput, RenderLoop, SessionEvent};
use crate::spatial::{CardPlane, Pose};
use crate::zone::{self, InteractiveZone};
use crate::{LinkAction, ViewerError, ViewerResult};

/// Default pause between a zone hit and ending the session, so the user
/// sees the selection register.
pub const DEFAULT_LINK_FEEDBACK_DELAY: Duration = Duration::from_millis(1500);

/// Phase of the AR session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    /// Not mounted yet.
    #[default]
    Uninitialized,
    /// Probing capabilities and building the scene.
    CapabilityChecking,
    /// Scene built; waiting for the user to start.
    Ready,
    /// Session requested from the platform.
    Starting,
    /// Session running.
    Active,
    /// Session end requested.
    Ending,
    /// Failed; terminal for this instance.
    Error,
}

impl SessionPhase {
    /// Kebab-case name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::CapabilityChecking => "capability-checking",
            Self::Ready => "ready",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Ending => "ending",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one platform session, fresh on every start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArSessionId(Uuid);

impl ArSessionId {
    /// Create a random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArSessionConfig {
    /// Delay between the first zone hit and the end request.
    /// Zero ends the session on the hit itself.
    pub link_feedback_delay: Duration,
}

impl Default for ArSessionConfig {
    fn default() -> Self {
        Self {
            link_feedback_delay: DEFAULT_LINK_FEEDBACK_DELAY,
        }
    }
}

/// What a selection did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitOutcome {
    /// The session was not active; input was dropped.
    Ignored,
    /// The ray missed the card or landed outside every zone.
    Miss,
    /// A zone was hit and its action is now pending.
    Queued(LinkAction),
}

/// Callback receiving lifecycle events.
pub type SessionListener = Box<dyn FnMut(&SessionEvent)>;

/// Callback receiving the session failure.
pub type FailureCallback = Box<dyn FnMut(&ViewerError)>;

/// The AR session controller.
pub struct ArSession {
    config: ArSessionConfig,
    phase: SessionPhase,
    zones: Vec<InteractiveZone>,
    session_id: Option<ArSessionId>,
    pending_action: Option<LinkAction>,
    end_scheduled: bool,
    input_attached: bool,
    render_loop: RenderLoop,
    failure_reported: bool,
    disposed: bool,
    listener: Option<SessionListener>,
    on_failure: Option<FailureCallback>,
}

impl std::fmt::Debug for ArSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArSession")
            .field("phase", &self.phase)
            .field("session_id", &self.session_id)
            .field("pending_action", &self.pending_action)
            .field("input_attached", &self.input_attached)
            .field("render_loop", &self.render_loop)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Default for ArSession {
    fn default() -> Self {
        Self::new(ArSessionConfig::default())
    }
}

impl ArSession {
    /// Create an unmounted session.
    #[must_use]
    pub fn new(config: ArSessionConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Uninitialized,
            zones: Vec::new(),
            session_id: None,
            pending_action: None,
            end_scheduled: false,
            input_attached: false,
            render_loop: RenderLoop::None,
            failure_reported: false,
            disposed: false,
            listener: None,
            on_failure: None,
        }
    }

    /// Set the lifecycle event listener.
    pub fn set_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Set the failure callback. It fires at most once.
    pub fn set_on_failure<F>(&mut self, callback: F)
    where
        F: FnMut(&ViewerError) + 'static,
    {
        self.on_failure = Some(Box::new(callback));
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Session tuning.
    #[must_use]
    pub fn config(&self) -> &ArSessionConfig {
        &self.config
    }

    /// ID of the running platform session.
    #[must_use]
    pub fn session_id(&self) -> Option<ArSessionId> {
        self.session_id
    }

    /// Action waiting for the session to end.
    #[must_use]
    pub fn pending_action(&self) -> Option<&LinkAction> {
        self.pending_action.as_ref()
    }

    /// Whether input listeners are attached.
    #[must_use]
    pub fn input_attached(&self) -> bool {
        self.input_attached
    }

    /// The loop currently driving rendering.
    #[must_use]
    pub fn render_loop(&self) -> RenderLoop {
        self.render_loop
    }

    /// Zones of the mounted card.
    #[must_use]
    pub fn zones(&self) -> &[InteractiveZone] {
        &self.zones
    }

    /// Whether [`Self::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Begin capability checking.
    ///
    /// # Errors
    ///
    /// Returns an error unless the session is uninitialized.
    pub fn mount(&mut self) -> ViewerResult<()> {
        self.expect_phase(SessionPhase::Uninitialized, "mount")?;
        self.set_phase(SessionPhase::CapabilityChecking);
        Ok(())
    }

    /// The scene (card plane, texture, zones) is built.
    ///
    /// # Errors
    ///
    /// Returns an error unless capabilities are being checked.
    pub fn scene_ready(&mut self, zones: Vec<InteractiveZone>) -> ViewerResult<()> {
        self.expect_phase(SessionPhase::CapabilityChecking, "finish scene")?;
        tracing::debug!("Scene ready with {} zone(s)", zones.len());
        self.zones = zones;
        self.set_phase(SessionPhase::Ready);
        self.set_loop(RenderLoop::Regular);
        Ok(())
    }

    /// Scene construction failed.
    ///
    /// # Errors
    ///
    /// Returns an error unless capabilities are being checked.
    pub fn scene_failed(&mut self, reason: impl Into<String>) -> ViewerResult<()> {
        self.expect_phase(SessionPhase::CapabilityChecking, "fail scene")?;
        self.fail(ViewerError::SceneBuild(reason.into()));
        Ok(())
    }

    /// The user asked to enter AR.
    ///
    /// This is the only way into `starting`; nothing starts a session
    /// automatically.
    ///
    /// # Errors
    ///
    /// Returns an error unless the session is ready.
    pub fn request_start(&mut self) -> ViewerResult<()> {
        self.expect_phase(SessionPhase::Ready, "start")?;
        self.set_phase(SessionPhase::Starting);
        Ok(())
    }

    /// The platform granted the session.
    ///
    /// # Errors
    ///
    /// Returns an error unless a start is in flight.
    pub fn session_started(&mut self) -> ViewerResult<ArSessionId> {
        self.expect_phase(SessionPhase::Starting, "confirm start")?;
        let id = ArSessionId::new();
        tracing::info!("AR session {id} started");
        self.session_id = Some(id);
        self.set_phase(SessionPhase::Active);
        self.attach_input();
        self.set_loop(RenderLoop::Xr);
        Ok(id)
    }

    /// The platform rejected the session request.
    ///
    /// # Errors
    ///
    /// Returns an error unless a start is in flight.
    pub fn session_rejected(&mut self, reason: impl Into<String>) -> ViewerResult<()> {
        self.expect_phase(SessionPhase::Starting, "reject start")?;
        self.fail(ViewerError::Session(reason.into()));
        Ok(())
    }

    /// Raycast a selection against the card and queue the hit zone's action.
    ///
    /// The card is placed relative to `viewer` exactly as [`Self::frame`]
    /// places it. The first hit schedules the end of the session; later hits
    /// before the end only replace the pending action.
    ///
    /// # Errors
    ///
    /// Returns an error if the session was disposed.
    pub fn handle_input(&mut self, input: &ArInput, viewer: &Pose) -> ViewerResult<HitOutcome> {
        self.ensure_live("handle input")?;
        if self.phase != SessionPhase::Active {
            return Ok(HitOutcome::Ignored);
        }

        let plane = CardPlane::facing(viewer);
        let Some(hit) = plane.intersect(&input.ray()) else {
            return Ok(HitOutcome::Miss);
        };
        let Some(zone) = zone::resolve(&self.zones, hit.u, hit.v) else {
            return Ok(HitOutcome::Miss);
        };

        let action = zone.action();
        tracing::debug!("Zone hit: {} -> {}", zone.kind, action.url());
        self.pending_action = Some(action.clone());
        self.emit(&SessionEvent::ActionQueued {
            action: action.clone(),
        });

        if !self.end_scheduled {
            self.end_scheduled = true;
            if self.config.link_feedback_delay.is_zero() {
                self.request_end()?;
            } else {
                let after_ms =
                    u64::try_from(self.config.link_feedback_delay.as_millis()).unwrap_or(u64::MAX);
                self.emit(&SessionEvent::EndScheduled { after_ms });
            }
        }

        Ok(HitOutcome::Queued(action))
    }

    /// Ask the platform to end the session.
    ///
    /// Repeated requests while already ending are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error unless the session is active or ending.
    pub fn request_end(&mut self) -> ViewerResult<()> {
        self.ensure_live("end")?;
        match self.phase {
            SessionPhase::Ending => Ok(()),
            SessionPhase::Active => {
                self.detach_input();
                self.set_phase(SessionPhase::Ending);
                self.emit(&SessionEvent::EndRequested);
                Ok(())
            }
            phase => Err(ViewerError::InvalidTransition { phase, action: "end" }),
        }
    }

    /// The platform confirmed the session ended.
    ///
    /// Returns to `ready` first, then dispatches the pending action, if any.
    /// Also accepted while active, for sessions the user closed from the
    /// platform UI.
    ///
    /// # Errors
    ///
    /// Returns an error unless the session is active or ending.
    pub fn session_ended(&mut self) -> ViewerResult<Option<LinkAction>> {
        self.ensure_live("confirm end")?;
        if !matches!(self.phase, SessionPhase::Active | SessionPhase::Ending) {
            return Err(ViewerError::InvalidTransition {
                phase: self.phase,
                action: "confirm end",
            });
        }

        if let Some(id) = self.session_id.take() {
            tracing::info!("AR session {id} ended");
        }
        self.detach_input();
        self.end_scheduled = false;
        self.set_phase(SessionPhase::Ready);
        self.set_loop(RenderLoop::Regular);

        let action = self.pending_action.take();
        if let Some(action) = &action {
            self.emit(&SessionEvent::ActionDispatched {
                action: action.clone(),
            });
        }
        Ok(action)
    }

    /// The platform reported an error while starting or running.
    ///
    /// Scene failures go through [`Self::scene_failed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session was disposed or is neither starting
    /// nor active.
    pub fn runtime_error(&mut self, reason: impl Into<String>) -> ViewerResult<()> {
        self.ensure_live("report error")?;
        if !matches!(self.phase, SessionPhase::Starting | SessionPhase::Active) {
            return Err(ViewerError::InvalidTransition {
                phase: self.phase,
                action: "report error",
            });
        }
        self.fail(ViewerError::Session(reason.into()));
        Ok(())
    }

    /// Where to draw the card this frame, if the session shows it.
    #[must_use]
    pub fn frame(&self, viewer: &Pose) -> Option<CardPlane> {
        if self.disposed || !matches!(self.phase, SessionPhase::Active | SessionPhase::Ending) {
            return None;
        }
        Some(CardPlane::facing(viewer))
    }

    /// Tear everything down. Safe in any phase, including mid-end.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if matches!(self.phase, SessionPhase::Starting | SessionPhase::Active) {
            self.emit(&SessionEvent::EndRequested);
        }
        self.detach_input();
        self.set_loop(RenderLoop::None);
        self.pending_action = None;
        self.end_scheduled = false;
        self.session_id = None;
        self.disposed = true;
        tracing::debug!("AR session disposed in phase {}", self.phase);
    }

    fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> ViewerResult<()> {
        self.ensure_live(action)?;
        if self.phase == expected {
            Ok(())
        } else {
            Err(ViewerError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn ensure_live(&self, action: &'static str) -> ViewerResult<()> {
        if self.disposed {
            tracing::debug!("Ignoring {action} on disposed session");
            return Err(ViewerError::Disposed);
        }
        Ok(())
    }

    fn fail(&mut self, error: ViewerError) {
        tracing::warn!("AR session failed in phase {}: {error}", self.phase);
        self.detach_input();
        self.set_loop(RenderLoop::None);
        self.pending_action = None;
        self.end_scheduled = false;
        self.session_id = None;
        self.set_phase(SessionPhase::Error);

        if !self.failure_reported {
            self.failure_reported = true;
            if let Some(callback) = self.on_failure.as_mut() {
                callback(&error);
            }
        }
        self.emit(&SessionEvent::Failed {
            message: error.user_message(),
        });
    }

    fn set_phase(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        tracing::debug!("Session phase {from} -> {to}");
        self.phase = to;
        self.emit(&SessionEvent::PhaseChanged { from, to });
    }

    fn set_loop(&mut self, to: RenderLoop) {
        let from = self.render_loop;
        if from == to {
            return;
        }
        self.render_loop = to;
        self.emit(&SessionEvent::LoopChanged { from, to });
    }

    fn attach_input(&mut self) {
        if !self.input_attached {
            self.input_attached = true;
            self.emit(&SessionEvent::InputAttached);
        }
    }

    fn detach_input(&mut self) {
        if self.input_attached {
            self.input_attached = false;
            self.emit(&SessionEvent::InputDetached);
        }
    }

    fn emit(&mut self, event: &SessionEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::spatial::{Camera, Vec3};
    use crate::{CardView, ContactKind};

    fn card() -> CardView {
        CardView {
            phone: "+1 555 0100".into(),
            email: "jane@acme.example".into(),
            website: "acme.example".into(),
            ..CardView::default()
        }
    }

    fn ready_session(config: ArSessionConfig) -> (ArSession, Rc<RefCell<Vec<SessionEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut session = ArSession::new(config);
        let sink = Rc::clone(&events);
        session.set_listener(move |event| sink.borrow_mut().push(event.clone()));
        session.mount().expect("mount");
        session
            .scene_ready(zone::zones_for(&card()))
            .expect("scene ready");
        (session, events)
    }

    fn active_session(config: ArSessionConfig) -> (ArSession, Rc<RefCell<Vec<SessionEvent>>>) {
        let (mut session, events) = ready_session(config);
        session.request_start().expect("start");
        session.session_started().expect("started");
        (session, events)
    }

    /// A controller at the viewer's position aimed at the centre of `kind`'s zone.
    fn aim_at(session: &ArSession, kind: ContactKind) -> ArInput {
        let zone = session
            .zones()
            .iter()
            .find(|z| z.kind == kind)
            .expect("zone exists");
        let plane = CardPlane::facing(&Pose::default());
        let x = (zone.bounds.left + zone.bounds.right) / 2.0;
        let y = (zone.bounds.top + zone.bounds.bottom) / 2.0;
        let target = plane
            .center
            .add(&plane.right.scale(x * plane.width))
            .add(&plane.up.scale(y * plane.height));

        let mut pose = Pose::default();
        let dir = target.normalize();
        // Rotate -Z onto `dir`.
        let axis = Vec3::forward().cross(&dir);
        let angle = Vec3::forward().dot(&dir).clamp(-1.0, 1.0).acos();
        pose.orientation = crate::spatial::Quat::from_axis_angle(axis, angle);
        ArInput::ControllerSelect { pose }
    }

    fn count(events: &[SessionEvent], wanted: &SessionEvent) -> usize {
        events.iter().filter(|e| *e == wanted).count()
    }

    #[test]
    fn test_never_starts_without_user_action() {
        let (session, events) = ready_session(ArSessionConfig::default());
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(session.session_id().is_none());
        assert!(!events
            .borrow()
            .iter()
            .any(|e| matches!(e, SessionEvent::PhaseChanged { to: SessionPhase::Starting, .. })));
    }

    #[test]
    fn test_start_requires_ready() {
        let mut session = ArSession::default();
        let err = session.request_start().expect_err("not mounted");
        assert_eq!(
            err,
            ViewerError::InvalidTransition {
                phase: SessionPhase::Uninitialized,
                action: "start"
            }
        );
    }

    #[test]
    fn test_input_attached_only_while_active() {
        let (mut session, events) = active_session(ArSessionConfig::default());
        assert!(session.input_attached());
        assert_eq!(session.render_loop(), RenderLoop::Xr);

        session.request_end().expect("end");
        assert!(!session.input_attached());
        session.session_ended().expect("ended");

        session.request_start().expect("restart");
        session.session_started().expect("started again");

        let events = events.borrow();
        assert_eq!(count(&events, &SessionEvent::InputAttached), 2);
        assert_eq!(count(&events, &SessionEvent::InputDetached), 1);
    }

    #[test]
    fn test_hit_schedules_end_and_dispatches_after_confirmation() {
        let (mut session, events) = active_session(ArSessionConfig::default());
        let input = aim_at(&session, ContactKind::Phone);

        let outcome = session
            .handle_input(&input, &Pose::default())
            .expect("input");
        assert_eq!(
            outcome,
            HitOutcome::Queued(LinkAction::Phone("+1 555 0100".into()))
        );
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(events
            .borrow()
            .contains(&SessionEvent::EndScheduled { after_ms: 1500 }));

        session.request_end().expect("end after delay");
        assert_eq!(session.phase(), SessionPhase::Ending);
        assert!(
            !events
                .borrow()
                .iter()
                .any(|e| matches!(e, SessionEvent::ActionDispatched { .. })),
            "no dispatch before end confirmation"
        );

        let dispatched = session.session_ended().expect("ended");
        assert_eq!(dispatched.map(|a| a.url()), Some("tel:+15550100".into()));
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.render_loop(), RenderLoop::Regular);

        // Ready is reported before the dispatch.
        let events = events.borrow();
        let ready_at = events
            .iter()
            .rposition(|e| matches!(e, SessionEvent::PhaseChanged { to: SessionPhase::Ready, .. }))
            .expect("ready event");
        let dispatch_at = events
            .iter()
            .position(|e| matches!(e, SessionEvent::ActionDispatched { .. }))
            .expect("dispatch event");
        assert!(ready_at < dispatch_at);
    }

    #[test]
    fn test_last_hit_wins_during_feedback_delay() {
        let (mut session, events) = active_session(ArSessionConfig::default());
        let phone = aim_at(&session, ContactKind::Phone);
        let website = aim_at(&session, ContactKind::Website);

        session.handle_input(&phone, &Pose::default()).expect("phone");
        session
            .handle_input(&website, &Pose::default())
            .expect("website");

        assert_eq!(
            session.pending_action(),
            Some(&LinkAction::Website("acme.example".into()))
        );
        let scheduled = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SessionEvent::EndScheduled { .. }))
            .count();
        assert_eq!(scheduled, 1);

        session.request_end().expect("end");
        let dispatched = session.session_ended().expect("ended");
        assert_eq!(dispatched.map(|a| a.url()), Some("https://acme.example".into()));
    }

    #[test]
    fn test_zero_delay_ends_on_hit() {
        let config = ArSessionConfig {
            link_feedback_delay: Duration::ZERO,
        };
        let (mut session, _events) = active_session(config);
        let input = aim_at(&session, ContactKind::Email);

        session.handle_input(&input, &Pose::default()).expect("hit");
        assert_eq!(session.phase(), SessionPhase::Ending);
        assert!(!session.input_attached());
    }

    #[test]
    fn test_miss_is_noop() {
        let (mut session, _events) = active_session(ArSessionConfig::default());
        let away = ArInput::ControllerSelect {
            pose: Pose::new(
                Vec3::zero(),
                crate::spatial::Quat::from_axis_angle(Vec3::up(), std::f32::consts::PI),
            ),
        };
        assert_eq!(
            session.handle_input(&away, &Pose::default()).expect("input"),
            HitOutcome::Miss
        );

        // Centre of the card is the header area, not a zone.
        let tap = ArInput::ScreenTap {
            ndc_x: 0.0,
            ndc_y: 0.0,
            camera: Camera::default(),
        };
        assert_eq!(
            session.handle_input(&tap, &Pose::default()).expect("input"),
            HitOutcome::Miss
        );
        assert!(session.pending_action().is_none());
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_input_outside_active_is_ignored() {
        let (mut session, _events) = ready_session(ArSessionConfig::default());
        let input = aim_at(&session, ContactKind::Phone);
        assert_eq!(
            session.handle_input(&input, &Pose::default()).expect("input"),
            HitOutcome::Ignored
        );
    }

    #[test]
    fn test_rejection_fails_once() {
        let failures = Rc::new(RefCell::new(Vec::new()));
        let (mut session, _events) = ready_session(ArSessionConfig::default());
        let sink = Rc::clone(&failures);
        session.set_on_failure(move |err| sink.borrow_mut().push(err.clone()));

        session.request_start().expect("start");
        session
            .session_rejected("NotAllowedError")
            .expect("reject");
        assert_eq!(session.phase(), SessionPhase::Error);
        assert!(session.runtime_error("late").is_err());
        assert_eq!(
            failures.borrow().as_slice(),
            &[ViewerError::Session("NotAllowedError".into())]
        );

        // Terminal.
        assert!(session.request_start().is_err());
    }

    #[test]
    fn test_scene_failure_is_reported() {
        let failures = Rc::new(RefCell::new(0));
        let mut session = ArSession::default();
        let sink = Rc::clone(&failures);
        session.set_on_failure(move |_| *sink.borrow_mut() += 1);

        session.mount().expect("mount");
        session.scene_failed("no WebGL").expect("fail scene");
        assert_eq!(session.phase(), SessionPhase::Error);
        assert_eq!(*failures.borrow(), 1);
    }

    #[test]
    fn test_runtime_error_detaches_input() {
        let (mut session, _events) = active_session(ArSessionConfig::default());
        session.runtime_error("tracking lost").expect("error");
        assert_eq!(session.phase(), SessionPhase::Error);
        assert!(!session.input_attached());
        assert_eq!(session.render_loop(), RenderLoop::None);
    }

    #[test]
    fn test_runtime_error_only_while_starting_or_active() {
        let mut session = ArSession::default();
        assert!(session.runtime_error("early").is_err());
        session.mount().expect("mount");
        assert!(session.runtime_error("early").is_err());
        assert_eq!(session.phase(), SessionPhase::CapabilityChecking);

        let (mut session, _events) = ready_session(ArSessionConfig::default());
        assert!(matches!(
            session.runtime_error("idle"),
            Err(ViewerError::InvalidTransition {
                phase: SessionPhase::Ready,
                ..
            })
        ));
        assert_eq!(session.phase(), SessionPhase::Ready);

        session.request_start().expect("start");
        session.runtime_error("no tracking").expect("error");
        assert_eq!(session.phase(), SessionPhase::Error);
    }

    #[test]
    fn test_frame_places_card_only_in_session() {
        let (mut session, _events) = ready_session(ArSessionConfig::default());
        assert!(session.frame(&Pose::default()).is_none());

        session.request_start().expect("start");
        session.session_started().expect("started");
        let plane = session.frame(&Pose::default()).expect("placed");
        assert!((plane.center.z + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_dispose_mid_session() {
        let (mut session, events) = active_session(ArSessionConfig::default());
        let input = aim_at(&session, ContactKind::Phone);
        session.handle_input(&input, &Pose::default()).expect("hit");

        session.dispose();
        assert!(session.is_disposed());
        assert!(!session.input_attached());
        assert_eq!(session.render_loop(), RenderLoop::None);
        assert!(session.pending_action().is_none());
        assert!(events.borrow().contains(&SessionEvent::EndRequested));

        // Second dispose and later operations are harmless.
        session.dispose();
        assert_eq!(session.session_ended(), Err(ViewerError::Disposed));
    }

    #[test]
    fn test_dispose_while_ending_does_not_request_again() {
        let (mut session, events) = active_session(ArSessionConfig::default());
        session.request_end().expect("end");
        session.dispose();
        assert_eq!(count(&events.borrow(), &SessionEvent::EndRequested), 1);
    }

    #[test]
    fn test_loop_changes_are_single_events() {
        let (mut session, events) = active_session(ArSessionConfig::default());
        session.request_end().expect("end");
        session.session_ended().expect("ended");

        let loops: Vec<_> = events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::LoopChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            loops,
            vec![
                (RenderLoop::None, RenderLoop::Regular),
                (RenderLoop::Regular, RenderLoop::Xr),
                (RenderLoop::Xr, RenderLoop::Regular),
            ]
        );
    }
}
