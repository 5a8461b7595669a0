//! Card service client over `fetch`.
//!
//! Talks to the card server's public API and unwraps its
//! `{ statusCode, message, data }` envelope.

use async_trait::async_trait;
use card_core::{Analytics, CardProvider, CardView, ViewerError, ViewerResult};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::error::js_message;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// Client for the public card API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    /// Client for the service at `base_url` (empty for same origin).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of a card's public record.
    #[must_use]
    pub fn card_url(&self, public_id: &str) -> String {
        format!("{}/api/card/public/{public_id}", self.base_url)
    }

    /// URL of a card's composed texture.
    #[must_use]
    pub fn texture_url(&self, public_id: &str) -> String {
        format!("{}/texture.png", self.card_url(public_id))
    }

    async fn send(&self, method: &str, url: &str) -> ViewerResult<(u16, String)> {
        let window =
            web_sys::window().ok_or_else(|| ViewerError::Provider("No window object".into()))?;

        let init = RequestInit::new();
        init.set_method(method);
        let request = Request::new_with_str_and_init(url, &init)
            .map_err(|e| ViewerError::Provider(js_message(&e)))?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| ViewerError::Provider(js_message(&e)))?
            .dyn_into()
            .map_err(|_| ViewerError::Provider("fetch did not return a Response".into()))?;

        let text = JsFuture::from(
            response
                .text()
                .map_err(|e| ViewerError::Provider(js_message(&e)))?,
        )
        .await
        .map_err(|e| ViewerError::Provider(js_message(&e)))?;

        Ok((response.status(), text.as_string().unwrap_or_default()))
    }
}

/// Turn a card lookup response into a card.
///
/// # Errors
///
/// Returns [`ViewerError::NotFound`] for 404 responses and
/// [`ViewerError::Provider`] for any other failure.
pub fn parse_card_response(public_id: &str, status: u16, body: &str) -> ViewerResult<CardView> {
    if status == 404 {
        return Err(ViewerError::NotFound(public_id.to_string()));
    }
    let envelope: Envelope<CardView> = serde_json::from_str(body)
        .map_err(|e| ViewerError::Provider(format!("HTTP {status}: {e}")))?;
    if !(200..300).contains(&status) {
        return Err(ViewerError::Provider(format!(
            "HTTP {status}: {}",
            envelope.message
        )));
    }
    envelope
        .data
        .ok_or_else(|| ViewerError::Provider("Card response had no data".into()))
}

#[async_trait(?Send)]
impl CardProvider for ApiClient {
    async fn get_published_card(&self, public_id: &str) -> ViewerResult<CardView> {
        let (status, body) = self.send("GET", &self.card_url(public_id)).await?;
        parse_card_response(public_id, status, &body)
    }
}

#[async_trait(?Send)]
impl Analytics for ApiClient {
    async fn record_view(&self, public_id: &str) -> ViewerResult<()> {
        let url = format!("{}/view", self.card_url(public_id));
        let (status, _) = self.send("POST", &url).await?;
        match status {
            200..=299 => Ok(()),
            404 => Err(ViewerError::NotFound(public_id.to_string())),
            _ => Err(ViewerError::Provider(format!("HTTP {status}"))),
        }
    }
}
