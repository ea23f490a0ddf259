//! HTTP API surface.

pub mod export;
pub mod requests;
pub mod students;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::error::Error;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/requests", get(requests::list).post(requests::submit))
        .route("/api/requests/status", post(requests::update_status))
        .route("/api/students", get(students::roster))
        .route("/api/students/:name/stats", get(students::stats))
        .route("/api/export/pdf", post(export::export_pdf))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, None),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, None),
            Error::Upstream { details, .. } => (StatusCode::BAD_GATEWAY, details.clone()),
            Error::RenderTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, None),
            Error::RenderLaunch(detail) | Error::Render(detail) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(detail.clone()))
            }
            // cancellation is swallowed by its owner; reaching HTTP is a bug
            Error::Cancelled => (StatusCode::INTERNAL_SERVER_ERROR, None),
            Error::Config(detail) => (StatusCode::INTERNAL_SERVER_ERROR, Some(detail.clone())),
        };

        if status.is_server_error() {
            error!(%status, "request failed: {self}");
        } else {
            warn!(%status, "request rejected: {self}");
        }

        let body = ErrorBody {
            message: self.to_string(),
            // diagnostic detail only outside production builds
            details: if cfg!(debug_assertions) { details } else { None },
        };

        (status, Json(body)).into_response()
    }
}
