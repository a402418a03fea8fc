//! Route gateway for the HTTP front-end.
//!
//! Each sibling module exports a subrouter; this module merges them, applies
//! the shared layers and owns the response envelope and error mapping.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{Advisor, Config, Error};

mod analyze;
mod health;
mod recommend;
mod root;

// ---

pub fn router(advisor: Advisor, config: &Config) -> Router {
    // ---
    Router::new()
        .merge(root::router())
        .merge(health::router())
        .merge(recommend::router())
        .merge(analyze::router())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(advisor)
}

/// Success envelope shared by every API response.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    request_id: Uuid,
    timestamp: DateTime<Utc>,
    data: T,
}

impl<T: Serialize> Envelope<T> {
    fn ok(request_id: Uuid, data: T) -> Json<Self> {
        Json(Envelope {
            success: true,
            request_id,
            timestamp: Utc::now(),
            data,
        })
    }
}

/// Failure surfaced to an HTTP caller.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Body(JsonRejection),
    Upload(MultipartError),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Body(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Upload(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let (status, message) = match self {
            ApiError::Core(e) => {
                let status = match e {
                    Error::MalformedInputShape(_) | Error::UnsupportedImage(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    Error::ContentBlocked(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    Error::UpstreamUnavailable(_) | Error::EmptyResponse => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string())
            }
            ApiError::Body(e) => (e.status(), e.body_text()),
            ApiError::Upload(e) => (e.status(), e.body_text()),
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
