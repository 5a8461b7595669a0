//! Prometheus metrics for the card service.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const CARD_LOOKUPS_TOTAL: &str = "arbiz_card_lookups_total";
const CARD_VIEWS_TOTAL: &str = "arbiz_card_views_total";
const TEXTURES_COMPOSED_TOTAL: &str = "arbiz_textures_composed_total";
const TEXTURE_LAYERS_OMITTED_TOTAL: &str = "arbiz_texture_layers_omitted_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a public card lookup.
///
/// * `endpoint` - which surface asked ("card", "zones", "texture", "page")
/// * `outcome` - "found" or "not_found"
pub fn record_card_lookup(endpoint: &'static str, outcome: &'static str) {
    counter!(
        CARD_LOOKUPS_TOTAL,
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a view recorded through the analytics endpoint.
pub fn record_card_view() {
    counter!(CARD_VIEWS_TOTAL).increment(1);
}

/// Record a composed texture.
///
/// * `success` - whether rasterization produced a PNG
pub fn record_texture_composed(success: bool) {
    counter!(
        TEXTURES_COMPOSED_TOTAL,
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record an image layer left out of a texture.
///
/// * `layer` - "background" or "logo"
pub fn record_layer_omitted(layer: &str) {
    counter!(
        TEXTURE_LAYERS_OMITTED_TOTAL,
        "layer" => layer.to_string()
    )
    .increment(1);
}
