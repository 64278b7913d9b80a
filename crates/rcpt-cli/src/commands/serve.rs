//! Serve command - expose the receipt endpoint over HTTP.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::any,
};
use clap::Args;
use console::style;
use tower_http::trace::TraceLayer;
use tracing::info;

use rcpt_core::api::{handle_request, ApiResponse, CORS_HEADERS};
use rcpt_core::ocr::{create_provider, OcrProvider};
use rcpt_core::receipt::HeuristicReceiptParser;

use super::config::load_config;
use super::process::{ocr_config, ProviderArg};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Socket address to bind (overrides the config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Route serving the endpoint (overrides the config)
    #[arg(short, long)]
    route: Option<String>,

    /// OCR provider (overrides the config)
    #[arg(short, long, value_enum)]
    provider: Option<ProviderArg>,

    /// Provider API key (overrides the config and environment)
    #[arg(long)]
    api_key: Option<String>,
}

/// State shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn OcrProvider>,
    pub parser: Arc<HeuristicReceiptParser>,
}

/// Build the router serving the endpoint at `route`.
pub fn build_router(route: &str, state: AppState) -> Router {
    Router::new()
        .route(route, any(receipt_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn receipt_endpoint(State(state): State<AppState>, method: Method, body: String) -> Response {
    let response = handle_request(
        method.as_str(),
        &body,
        state.provider.as_ref(),
        state.parser.as_ref(),
    )
    .await;
    into_response(response)
}

fn into_response(api: ApiResponse) -> Response {
    let status = StatusCode::from_u16(api.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = api.content_type;
    let mut response = (status, api.body).into_response();

    let headers = response.headers_mut();
    for (name, value) in CORS_HEADERS {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }
    match content_type {
        Some(content_type) => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        None => {
            headers.remove(CONTENT_TYPE);
        }
    }

    response
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let ocr = ocr_config(config.ocr, args.provider, args.api_key);
    let provider: Arc<dyn OcrProvider> = Arc::from(create_provider(&ocr)?);
    let parser = Arc::new(HeuristicReceiptParser::new().with_config(config.extraction));

    let bind = args.bind.unwrap_or(config.server.bind);
    let route = args.route.unwrap_or(config.server.route);

    let app = build_router(&route, AppState { provider, parser });
    let listener = tokio::net::TcpListener::bind(&bind).await?;

    info!("Starting receipt endpoint on {}{}", bind, route);
    println!(
        "{} Listening on http://{}{} ({})",
        style("✓").green(),
        bind,
        route,
        ocr.provider.display_name()
    );

    axum::serve(listener, app).await?;
    Ok(())
}
