//! # ARbiz Viewer Server
//!
//! Serves published business cards to the AR viewer and the static
//! fallback page.

use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use card_renderer::{ComposerConfig, LoadPolicy, TextureComposer};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use card_server::{build_router, metrics, AppState, CardStore, HttpImageLoader, ServerArgs};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Build a CORS layer for the viewer front-end.
///
/// Local-only servers accept localhost origins; public binds accept any
/// origin for the read-only card API.
fn build_cors_layer(args: &ServerArgs) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if !args.is_local_only() {
        return layer.allow_origin(tower_http::cors::Any);
    }

    let port = args.port;
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    layer.allow_origin(origins)
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,card_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,card_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing();

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let store = match &args.cards {
        Some(path) => CardStore::from_seed_file(path)
            .with_context(|| format!("loading cards from {}", path.display()))?,
        None => {
            tracing::warn!("No card seed file given; every lookup will return 404");
            CardStore::new()
        }
    };

    let composer = TextureComposer::new(ComposerConfig {
        policy: LoadPolicy {
            timeout: args.image_timeout(),
            ..LoadPolicy::default()
        },
        ..ComposerConfig::default()
    });
    if composer.font_faces() == 0 {
        tracing::warn!("No system fonts found; card text will not render");
    }

    let loader = HttpImageLoader::new(CONNECT_TIMEOUT).context("building image loader")?;
    let state = AppState::new(store, composer, loader);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = Router::new()
        .merge(metrics_router)
        .merge(build_router(state))
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(&args))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let addr = args.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("ARbiz viewer server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
