//! API route handlers.
//!
//! JSON endpoints answer with the card service envelope
//! `{ statusCode, message, data }`. The texture and page endpoints answer
//! with PNG and HTML bodies.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use card_core::{CardView, InteractiveZone};
use card_renderer::{render_fallback_page, render_not_found_page, RenderError};
use serde::Serialize;
use thiserror::Error;

use crate::metrics;
use crate::AppState;

/// Header listing image layers left out of a composed texture.
pub const OMITTED_LAYERS_HEADER: &str = "x-omitted-layers";

/// Response envelope shared by all JSON endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body.
    pub status_code: u16,
    /// Human readable outcome.
    pub message: String,
    /// Payload, `null` on errors.
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response carrying `data`.
    #[must_use]
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// An error response without payload.
    #[must_use]
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Errors surfaced by the API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown or unpublished card.
    #[error("card not found: {0}")]
    NotFound(String),

    /// Texture rasterization failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(_) => ApiResponse::error(StatusCode::NOT_FOUND, "Card not found"),
            Self::Render(err) => {
                tracing::error!(error = %err, "Texture composition failed");
                ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "Unable to render card")
            }
        }
        .into_response()
    }
}

/// Payload of the view analytics endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRecorded {
    /// Scan count after this view.
    pub scan_count: u64,
}

/// Payload of the zones endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardZones {
    /// Public card id.
    pub card_id: String,
    /// Interactive regions in card-local coordinates, in contact order.
    pub zones: Vec<InteractiveZone>,
}

/// Routes for the public card API and the fallback page.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/card/public/{card_id}", get(get_public_card))
        .route("/api/card/public/{card_id}/view", post(record_view))
        .route("/api/card/public/{card_id}/zones", get(get_zones))
        .route("/api/card/public/{card_id}/texture.png", get(get_texture))
        .route("/view/{card_id}", get(view_page))
}

fn lookup(state: &AppState, endpoint: &'static str, card_id: &str) -> Result<CardView, ApiError> {
    match state.store.get_published(card_id) {
        Ok(card) => {
            metrics::record_card_lookup(endpoint, "found");
            Ok(card)
        }
        Err(err) => {
            metrics::record_card_lookup(endpoint, "not_found");
            tracing::debug!(%card_id, error = %err, "Card lookup missed");
            Err(ApiError::NotFound(card_id.to_string()))
        }
    }
}

/// Get a published card.
#[tracing::instrument(name = "get_public_card", skip(state))]
pub async fn get_public_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<ApiResponse<CardView>, ApiError> {
    let card = lookup(&state, "card", &card_id)?;
    Ok(ApiResponse::ok(card, "Card fetched successfully"))
}

/// Record a view of a published card.
#[tracing::instrument(name = "record_view", skip(state))]
pub async fn record_view(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<ApiResponse<ViewRecorded>, ApiError> {
    let scan_count = state
        .store
        .record_view(&card_id)
        .map_err(|_| ApiError::NotFound(card_id.clone()))?;
    metrics::record_card_view();
    tracing::debug!(%card_id, scan_count, "View recorded");
    Ok(ApiResponse::ok(
        ViewRecorded { scan_count },
        "View recorded successfully",
    ))
}

/// Get the interactive regions of a published card.
#[tracing::instrument(name = "get_zones", skip(state))]
pub async fn get_zones(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<ApiResponse<CardZones>, ApiError> {
    let card = lookup(&state, "zones", &card_id)?;
    let zones = card_core::zone::zones_for(&card);
    Ok(ApiResponse::ok(
        CardZones { card_id, zones },
        "Zones fetched successfully",
    ))
}

/// Compose and return the card face texture.
///
/// Image layers that fail to load are listed in the
/// [`OMITTED_LAYERS_HEADER`] response header.
#[tracing::instrument(name = "get_texture", skip(state))]
pub async fn get_texture(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> Result<Response, ApiError> {
    let card = lookup(&state, "texture", &card_id)?;

    let texture = match state.composer.compose(&card, state.loader.as_ref()).await {
        Ok(texture) => texture,
        Err(err) => {
            metrics::record_texture_composed(false);
            return Err(err.into());
        }
    };
    metrics::record_texture_composed(true);

    for omitted in &texture.omitted {
        metrics::record_layer_omitted(omitted.layer.as_str());
        tracing::warn!(
            %card_id,
            layer = omitted.layer.as_str(),
            reason = %omitted.reason,
            "Texture layer omitted"
        );
    }

    let mut response = (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        texture.png,
    )
        .into_response();

    if !texture.omitted.is_empty() {
        let layers = texture
            .omitted
            .iter()
            .map(|o| o.layer.as_str())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&layers) {
            response.headers_mut().insert(OMITTED_LAYERS_HEADER, value);
        }
    }

    Ok(response)
}

/// Static fallback page for a card.
#[tracing::instrument(name = "view_page", skip(state))]
pub async fn view_page(State(state): State<AppState>, Path(card_id): Path<String>) -> Response {
    match lookup(&state, "page", &card_id) {
        Ok(card) => Html(render_fallback_page(&card)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html(render_not_found_page())).into_response(),
    }
}
