//! Capability probe backed by `navigator`.

use async_trait::async_trait;
use card_core::{CapabilityProbe, ViewerError, ViewerResult};
use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::error::{js_message, AppError};

const IMMERSIVE_AR: &str = "immersive-ar";

/// Queries WebXR support and the user agent of the current page.
pub struct NavigatorProbe {
    navigator: web_sys::Navigator,
}

impl NavigatorProbe {
    /// Probe for the page's navigator.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoWindow`] outside a browsing context.
    pub fn from_window() -> Result<Self, AppError> {
        let window = web_sys::window().ok_or(AppError::NoWindow)?;
        Ok(Self {
            navigator: window.navigator(),
        })
    }
}

fn session_error(value: &JsValue) -> ViewerError {
    ViewerError::CapabilityAbsent(js_message(value))
}

#[async_trait(?Send)]
impl CapabilityProbe for NavigatorProbe {
    async fn immersive_ar_supported(&self) -> ViewerResult<bool> {
        // navigator.xr is missing from the web-sys bindings on stable
        let xr = Reflect::get(&self.navigator, &JsValue::from_str("xr"))
            .map_err(|e| session_error(&e))?;
        if xr.is_undefined() || xr.is_null() {
            return Err(ViewerError::CapabilityAbsent("navigator.xr".into()));
        }

        let is_supported: Function = Reflect::get(&xr, &JsValue::from_str("isSessionSupported"))
            .map_err(|e| session_error(&e))?
            .dyn_into()
            .map_err(|_| {
                ViewerError::CapabilityAbsent("navigator.xr.isSessionSupported".into())
            })?;

        let promise: Promise = is_supported
            .call1(&xr, &JsValue::from_str(IMMERSIVE_AR))
            .map_err(|e| session_error(&e))?
            .dyn_into()
            .map_err(|_| ViewerError::CapabilityAbsent("isSessionSupported result".into()))?;

        let supported = JsFuture::from(promise)
            .await
            .map_err(|e| session_error(&e))?;
        Ok(supported.as_bool().unwrap_or(false))
    }

    fn user_agent(&self) -> ViewerResult<String> {
        self.navigator
            .user_agent()
            .map_err(|e| ViewerError::CapabilityAbsent(js_message(&e)))
    }
}
