use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::{info, warn};

use crate::settings::{self, Credentials};
use crate::Translator;

use super::error::ServerError;
use super::models::ServerResponse;
use super::state::ServerState;
use super::translate::translate_request;
use super::util::resolve_tmp_dir;

pub async fn run_server(settings: settings::Settings, credentials: Credentials) -> Result<()> {
    let translator = Translator::from_settings(&settings, &credentials)?;
    let app = build_router(translator, &settings)?;
    let listener = tokio::net::TcpListener::bind(&settings.server_addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", settings.server_addr))?;
    info!(
        addr = %settings.server_addr,
        route = %settings.route_path,
        translation_provider = settings.translation_provider.as_str(),
        "server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "server error")?;
    Ok(())
}

/// Router with the pipeline route, the health probe and CORS on every response.
pub fn build_router(translator: Translator, settings: &settings::Settings) -> Result<Router> {
    if !settings.route_path.starts_with('/') {
        return Err(anyhow!(
            "route path must start with '/': {}",
            settings.route_path
        ));
    }
    let state = Arc::new(ServerState {
        translator,
        tmp_dir: resolve_tmp_dir(settings)?,
    });
    let app = Router::new()
        .route("/health", get(health))
        .route(
            &settings.route_path,
            post(transcribe_translate)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(settings.max_upload_bytes)),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware));
    Ok(app)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("X-Requested-With, Content-Type"),
    );
}

async fn transcribe_translate(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ServerResponse>, ServerError> {
    let multipart = multipart.map_err(ServerError::parse)?;
    let response = translate_request(state.as_ref(), multipart).await?;
    Ok(Json(response))
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
