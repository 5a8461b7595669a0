//! `CardViewer`: one card page in the browser.
//!
//! Owns the [`ViewerPage`] and the [`ArSession`] and turns their outcomes
//! into JSON for the page script. Session events are queued while the
//! session runs and delivered to the listener afterwards, so a listener may
//! call back into the viewer.
//!
//! Each AR tier gets its own session. When the active tier fails and the
//! page steps down to another AR mode, the failed session is disposed and a
//! fresh one takes its place, ready to be mounted.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use card_core::{
    zone, ArInput, ArSession, ArSessionConfig, CardView, HitOutcome, LinkAction, Pose,
    RenderMode, SessionEvent, ViewerError, ViewerPage,
};
use card_renderer::render_fallback_html;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::api::ApiClient;
use crate::error::{js_message, AppError};
use crate::probe::NavigatorProbe;

/// Result of a selection, as reported to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum HitReport {
    /// Session not active.
    Ignored,
    /// Nothing hit.
    Miss,
    /// A contact zone was hit; the link opens once the session ends.
    Queued {
        /// Pending action.
        action: LinkAction,
        /// URL it will open.
        url: String,
    },
}

impl From<HitOutcome> for HitReport {
    fn from(outcome: HitOutcome) -> Self {
        match outcome {
            HitOutcome::Ignored => Self::Ignored,
            HitOutcome::Miss => Self::Miss,
            HitOutcome::Queued(action) => {
                let url = action.url();
                Self::Queued { action, url }
            }
        }
    }
}

/// Notification sent to the page listener.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageEvent {
    /// Session lifecycle event.
    Session(SessionEvent),
    /// The render mode stepped down after a failure.
    ModeChanged(ModeChange),
}

/// Payload of a mode step-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeChange {
    /// Always `"modeChanged"`.
    pub event: &'static str,
    /// Mode now in effect.
    pub mode: RenderMode,
    /// User-facing message for the failure.
    pub message: String,
}

type EventQueue = Rc<RefCell<VecDeque<SessionEvent>>>;
type FailureSlot = Rc<RefCell<Option<ViewerError>>>;

/// Browser viewer for one public card.
#[wasm_bindgen]
pub struct CardViewer {
    api: Rc<ApiClient>,
    public_id: String,
    page: Rc<RefCell<Option<ViewerPage>>>,
    session: ArSession,
    events: EventQueue,
    failure: FailureSlot,
    listener: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl CardViewer {
    /// Create a viewer for `public_id`, talking to the service at `api_base`
    /// (empty for same origin).
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(api_base: &str, public_id: &str) -> CardViewer {
        Self::with_config(api_base, public_id, ArSessionConfig::default())
    }

    /// Register the page callback. It receives one JSON string per event.
    #[wasm_bindgen(js_name = setListener)]
    pub fn set_listener(&mut self, listener: js_sys::Function) {
        self.listener = Some(listener);
    }

    /// Fetch the card, record the view and detect the render mode.
    ///
    /// Resolves to the view state as JSON.
    #[must_use]
    pub fn load(&self) -> js_sys::Promise {
        let api = Rc::clone(&self.api);
        let slot = Rc::clone(&self.page);
        wasm_bindgen_futures::future_to_promise(async move {
            let mut page = slot.borrow_mut().take().ok_or(AppError::LoadInProgress)?;
            let result = match NavigatorProbe::from_window() {
                Ok(probe) => {
                    let state = page.load(api.as_ref(), api.as_ref(), &probe).await;
                    serde_json::to_string(state).map_err(AppError::from)
                }
                Err(err) => Err(err),
            };
            *slot.borrow_mut() = Some(page);
            Ok(JsValue::from_str(&result?))
        })
    }

    /// Current view state as JSON.
    #[wasm_bindgen(js_name = viewState)]
    pub fn view_state(&self) -> Result<String, JsValue> {
        let page = self.page.borrow();
        let page = page.as_ref().ok_or(AppError::LoadInProgress)?;
        Ok(serde_json::to_string(page.state()).map_err(AppError::from)?)
    }

    /// Render mode in effect, if the card is showing.
    #[must_use]
    pub fn mode(&self) -> Option<String> {
        self.page
            .borrow()
            .as_ref()
            .and_then(ViewerPage::mode)
            .map(|mode| mode.as_str().to_string())
    }

    /// Session phase name.
    #[must_use]
    pub fn phase(&self) -> String {
        self.session.phase().as_str().to_string()
    }

    /// URL of the composed card texture.
    #[wasm_bindgen(js_name = textureUrl)]
    #[must_use]
    pub fn texture_url(&self) -> String {
        self.api.texture_url(&self.public_id)
    }

    /// Static card markup for the fallback view.
    #[wasm_bindgen(js_name = fallbackHtml)]
    pub fn fallback_html(&self) -> Result<String, JsValue> {
        Ok(render_fallback_html(&self.card()?))
    }

    /// Replace the contents of the element `element_id` with the static card.
    #[wasm_bindgen(js_name = mountFallback)]
    pub fn mount_fallback(&self, element_id: &str) -> Result<(), JsValue> {
        let html = render_fallback_html(&self.card()?);
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(AppError::NoWindow)?;
        let container = document
            .get_element_by_id(element_id)
            .ok_or_else(|| AppError::Js(format!("Element '{element_id}' not found")))?;
        container.set_inner_html(&html);
        Ok(())
    }

    /// Start building the AR scene.
    pub fn mount(&mut self) -> Result<(), JsValue> {
        let result = self.session.mount();
        self.finish(result)
    }

    /// The page finished building the scene with the card texture.
    #[wasm_bindgen(js_name = sceneReady)]
    pub fn scene_ready(&mut self) -> Result<(), JsValue> {
        let zones = zone::zones_for(&self.card()?);
        let result = self.session.scene_ready(zones);
        self.finish(result)
    }

    /// Building the scene failed.
    #[wasm_bindgen(js_name = sceneFailed)]
    pub fn scene_failed(&mut self, reason: &str) -> Result<(), JsValue> {
        let result = self.session.scene_failed(reason);
        self.finish(result)
    }

    /// The user pressed the AR button.
    #[wasm_bindgen(js_name = requestStart)]
    pub fn request_start(&mut self) -> Result<(), JsValue> {
        let result = self.session.request_start();
        self.finish(result)
    }

    /// The platform granted the session. Returns the session ID.
    #[wasm_bindgen(js_name = sessionStarted)]
    pub fn session_started(&mut self) -> Result<String, JsValue> {
        let result = self.session.session_started();
        self.finish(result).map(|id| id.to_string())
    }

    /// The platform refused the session.
    #[wasm_bindgen(js_name = sessionRejected)]
    pub fn session_rejected(&mut self, reason: &str) -> Result<(), JsValue> {
        let result = self.session.session_rejected(reason);
        self.finish(result)
    }

    /// A tap or controller select. Both arguments are JSON: an input and the
    /// viewer pose. Returns the outcome as JSON.
    #[wasm_bindgen(js_name = handleInput)]
    pub fn handle_input(&mut self, input_json: &str, viewer_json: &str) -> Result<String, JsValue> {
        let input: ArInput = serde_json::from_str(input_json).map_err(AppError::from)?;
        let viewer: Pose = serde_json::from_str(viewer_json).map_err(AppError::from)?;
        let result = self.session.handle_input(&input, &viewer);
        let outcome = self.finish(result)?;
        Ok(serde_json::to_string(&HitReport::from(outcome)).map_err(AppError::from)?)
    }

    /// Ask the platform to end the session.
    #[wasm_bindgen(js_name = requestEnd)]
    pub fn request_end(&mut self) -> Result<(), JsValue> {
        let result = self.session.request_end();
        self.finish(result)
    }

    /// The platform confirmed the end. Opens the pending link, if any, and
    /// returns its URL.
    #[wasm_bindgen(js_name = sessionEnded)]
    pub fn session_ended(&mut self) -> Result<Option<String>, JsValue> {
        let result = self.session.session_ended();
        let Some(action) = self.finish(result)? else {
            return Ok(None);
        };
        open_link(&action)?;
        Ok(Some(action.url()))
    }

    /// The platform reported an error mid-session.
    #[wasm_bindgen(js_name = runtimeError)]
    pub fn runtime_error(&mut self, reason: &str) -> Result<(), JsValue> {
        let result = self.session.runtime_error(reason);
        self.finish(result)
    }

    /// Card placement for this frame as JSON, given the viewer pose as JSON.
    pub fn frame(&self, viewer_json: &str) -> Result<Option<String>, JsValue> {
        let viewer: Pose = serde_json::from_str(viewer_json).map_err(AppError::from)?;
        self.session
            .frame(&viewer)
            .map(|plane| serde_json::to_string(&plane).map_err(|e| AppError::from(e).into()))
            .transpose()
    }

    /// Tear down the session. Safe at any time.
    pub fn dispose(&mut self) {
        self.session.dispose();
        self.deliver();
    }
}

impl CardViewer {
    /// Create a viewer with explicit session tuning.
    #[must_use]
    pub fn with_config(api_base: &str, public_id: &str, config: ArSessionConfig) -> Self {
        let events: EventQueue = Rc::default();
        let failure: FailureSlot = Rc::default();
        let session = wired_session(config, &events, &failure);

        Self {
            api: Rc::new(ApiClient::new(api_base)),
            public_id: public_id.to_string(),
            page: Rc::new(RefCell::new(Some(ViewerPage::new(public_id)))),
            session,
            events,
            failure,
            listener: None,
        }
    }

    fn card(&self) -> Result<CardView, AppError> {
        self.page
            .borrow()
            .as_ref()
            .and_then(ViewerPage::card)
            .cloned()
            .ok_or(AppError::NoCard)
    }

    /// Deliver queued events, then surface any failure as a mode change.
    fn finish<T>(&mut self, result: Result<T, ViewerError>) -> Result<T, JsValue> {
        self.deliver();
        result.map_err(|err| AppError::from(err).into())
    }

    fn deliver(&mut self) {
        self.drain_events();

        let failure = self.failure.borrow_mut().take();
        let Some(err) = failure else {
            return;
        };
        let mode = self
            .page
            .borrow_mut()
            .as_mut()
            .and_then(|page| page.mode_failed(&err));
        let Some(mode) = mode else {
            return;
        };
        if mode.is_ar() {
            self.next_tier();
        }
        self.notify(&PageEvent::ModeChanged(ModeChange {
            event: "modeChanged",
            mode,
            message: err.user_message(),
        }));
    }

    fn drain_events(&mut self) {
        let events: Vec<_> = self.events.borrow_mut().drain(..).collect();
        for event in events {
            self.notify(&PageEvent::Session(event));
        }
    }

    /// Replace the failed session with a fresh one for the next AR tier.
    fn next_tier(&mut self) {
        self.session.dispose();
        self.drain_events();
        let config = *self.session.config();
        self.session = wired_session(config, &self.events, &self.failure);
        tracing::debug!("Fresh AR session for the next tier");
    }

    fn notify(&self, event: &PageEvent) {
        let Some(listener) = &self.listener else {
            return;
        };
        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = listener.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    tracing::warn!("Viewer listener threw: {}", js_message(&e));
                }
            }
            Err(e) => tracing::warn!("Failed to serialize viewer event: {e}"),
        }
    }
}

fn wired_session(config: ArSessionConfig, events: &EventQueue, failure: &FailureSlot) -> ArSession {
    let mut session = ArSession::new(config);
    let queue = Rc::clone(events);
    session.set_listener(move |event| queue.borrow_mut().push_back(event.clone()));
    let slot = Rc::clone(failure);
    session.set_on_failure(move |err| *slot.borrow_mut() = Some(err.clone()));
    session
}

/// Navigate to a contact link: websites in a new tab, everything else in
/// place.
fn open_link(action: &LinkAction) -> Result<(), AppError> {
    let window = web_sys::window().ok_or(AppError::NoWindow)?;
    let url = action.url();
    if action.opens_new_window() {
        window
            .open_with_url_and_target(&url, "_blank")
            .map_err(|e| AppError::Js(js_message(&e)))?;
    } else {
        window
            .location()
            .set_href(&url)
            .map_err(|e| AppError::Js(js_message(&e)))?;
    }
    Ok(())
}
