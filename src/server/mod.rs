//! Axum router and the HTTP error envelope.

mod handlers;

use crate::config::AppConfig;
use crate::error::ProxyError;
use crate::eutils::EUtilsClient;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state injected into every handler. Built once at startup; nothing
/// here is recreated per request.
pub struct AppState {
    pub eutils: EUtilsClient,
}

pub type SharedState = Arc<AppState>;

/// Build the full router, including permissive CORS (preflight `OPTIONS`
/// answered with 200) and request tracing.
pub fn build_router(config: &AppConfig) -> Router {
    let state: SharedState = Arc::new(AppState {
        eutils: EUtilsClient::new(config),
    });

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/search", get(handlers::search))
        .route("/api/papers", post(handlers::papers))
        .route("/api/paper/{id}", get(handlers::paper))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wrapper turning a [`ProxyError`] into the JSON error envelope
/// `{ "error": .., "details"?: .. }` with the matching status code.
pub struct ApiError(pub ProxyError);

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = json!({ "error": self.0.to_string() });
        if let Some(details) = self.0.details() {
            body["details"] = json!(details);
        }
        (status, Json(body)).into_response()
    }
}
