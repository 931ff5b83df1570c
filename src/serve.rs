//! HTTP surface: router, handlers, and error → response mapping.
//!
//! Routes:
//! - `GET /api/chapters` — JSON array of chapter names
//! - `GET /api/chapters/{chapter}` — JSON array of page filenames
//! - `GET /manga/{chapter}/{page}` — raw image bytes (`ServeDir`, content
//!   type inferred from the extension)
//! - `GET /health` — server status and version
//!
//! Every failure is an isolated JSON error response; nothing a request does
//! can take the process down. Scan failures map to 500 with the opaque
//! message, rejected chapter names to 400, and a panicking handler is caught
//! by [`CatchPanicLayer`] and turned into a generic 500.
//!
//! The listers are synchronous filesystem code, so handlers run them on the
//! blocking pool and the runtime never stalls on a slow disk.

use std::any::Any;
use std::error::Error as _;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::scan::{self, ScanError};

/// JSON body for every failed request: `{"error": "..."}`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Error, Debug)]
enum ApiError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// The blocking task was cancelled or panicked under us.
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Scan(ScanError::InvalidChapter(name)) => {
                tracing::warn!(chapter = %name, "rejected chapter name");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Scan(err) => {
                // The io cause is logged here and nowhere else; clients only
                // ever see the opaque message.
                tracing::error!(error = %err, cause = ?err.source(), "scan failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the application router.
///
/// The static file service is rooted at the same media directory the listers
/// scan, so `/manga/<chapter>/<page>` serves exactly the files the listings
/// name. `ServeDir` rejects `..` segments on its own.
pub fn router(config: Arc<ServerConfig>) -> Router {
    let static_media = ServeDir::new(&config.root);

    Router::new()
        .route("/health", get(health))
        .route("/api/chapters", get(chapters))
        .route("/api/chapters/{chapter}", get(pages))
        .nest_service("/manga", static_media)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(config)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn chapters(
    State(config): State<Arc<ServerConfig>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let listing = tokio::task::spawn_blocking(move || scan::list_chapters(&config))
        .await
        .map_err(|_| ApiError::Internal)??;
    Ok(Json(listing))
}

async fn pages(
    State(config): State<Arc<ServerConfig>>,
    Path(chapter): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let listing = tokio::task::spawn_blocking(move || scan::list_pages(&config, &chapter))
        .await
        .map_err(|_| ApiError::Internal)??;
    Ok(Json(listing))
}

/// Catch-all for panicking handlers: log, answer 500, keep serving.
///
/// Public so tests can wrap a deliberately panicking route in the same
/// `CatchPanicLayer` the router uses.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
