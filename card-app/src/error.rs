//! Error type for the browser bindings.

use card_core::ViewerError;
use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised by the browser bindings.
#[derive(Debug, Error)]
pub enum AppError {
    /// No `window` global (not running in a page).
    #[error("No window object")]
    NoWindow,

    /// A browser API threw.
    #[error("Browser API error: {0}")]
    Js(String),

    /// The viewer rejected an operation.
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    /// JSON passed in from the page did not parse.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A card must be loaded first.
    #[error("No card loaded")]
    NoCard,

    /// `load` was called while a previous load is running.
    #[error("Card load already in progress")]
    LoadInProgress,
}

impl From<AppError> for JsValue {
    fn from(err: AppError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort message from a thrown JS value.
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
