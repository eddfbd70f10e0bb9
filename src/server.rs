//! HTTP surface: axum router, handlers, and error-to-status mapping.
//!
//! Handlers parse and validate the JSON body on the async side, then move
//! the whole conversion onto the blocking pool so decoding, compression and
//! rasterisation never stall the reactor.

use crate::api::{
    CapabilitiesResponse, CollageBody, CollageResponse, ConvertBody, ConvertResponse, ErrorBody,
    HealthResponse,
};
use crate::config::ServerConfig;
use crate::convert::Converter;
use crate::error::ConvertError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared, read-only state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub converter: Arc<Converter>,
}

impl AppState {
    pub fn new(config: ServerConfig, converter: Converter) -> Self {
        Self {
            config: Arc::new(config),
            converter: Arc::new(converter),
        }
    }

    /// State with a pdfium-backed converter.
    pub fn from_config(config: ServerConfig) -> Self {
        let converter = Converter::from_config(&config);
        Self::new(config, converter)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_request_bytes;
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(capabilities))
        .route("/health", get(health))
        .route("/convert", post(convert_files))
        .route("/collage", post(create_collage))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, serve until Ctrl-C, then drain.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(
        address = %address,
        max_request_bytes = config.max_request_bytes,
        "pixdoc listening"
    );
    let app = router(AppState::from_config(config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
        return;
    }
    info!("Shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn capabilities() -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse::default())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::now())
}

async fn convert_files(
    State(state): State<AppState>,
    body: Result<Json<ConvertBody>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Json(body) = body.map_err(ApiError::from)?;
    let request = body
        .into_request(&state.config)
        .map_err(|e| ApiError::conversion(e, Operation::Convert))?;

    let converter = Arc::clone(&state.converter);
    let result = tokio::task::spawn_blocking(move || converter.convert(request))
        .await
        .map_err(|e| ApiError::join(e, Operation::Convert))?
        .map_err(|e| ApiError::conversion(e, Operation::Convert))?;

    Ok(Json(result.into()))
}

async fn create_collage(
    State(state): State<AppState>,
    body: Result<Json<CollageBody>, JsonRejection>,
) -> Result<Json<CollageResponse>, ApiError> {
    let Json(body) = body.map_err(ApiError::from)?;
    let request = body
        .into_request(&state.config)
        .map_err(|e| ApiError::conversion(e, Operation::Collage))?;

    let converter = Arc::clone(&state.converter);
    let result = tokio::task::spawn_blocking(move || converter.collage(request))
        .await
        .map_err(|e| ApiError::join(e, Operation::Collage))?
        .map_err(|e| ApiError::conversion(e, Operation::Collage))?;

    Ok(Json(result.into()))
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Which endpoint failed; selects the 500 message prefix.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Convert,
    Collage,
}

impl Operation {
    fn failure_prefix(self) -> &'static str {
        match self {
            Operation::Convert => "Conversion failed",
            Operation::Collage => "Collage creation failed",
        }
    }
}

/// An error response: status plus `{"success": false, "error": …}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn conversion(err: ConvertError, operation: Operation) -> Self {
        if err.is_client_error() {
            warn!(error = %err, "Rejected request");
            Self {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            }
        } else {
            error!(error = %err, "{}", operation.failure_prefix());
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("{}: {err}", operation.failure_prefix()),
            }
        }
    }
}

impl ApiError {
    fn join(err: tokio::task::JoinError, operation: Operation) -> Self {
        Self::conversion(ConvertError::Internal(err.to_string()), operation)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        warn!(status = %status, error = %rejection.body_text(), "Malformed request body");
        Self {
            status,
            message: ConvertError::InvalidRequest(rejection.body_text()).to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}
