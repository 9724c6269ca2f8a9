//! # REST API Interface Layer
//!
//! One `*_apis` module per resource, each exposing a `router()` that is
//! nested under `/api` by [`crate::create_router`]. Handlers log the request,
//! convert DTOs through the mappers and call exactly one domain operation.

pub mod activity_apis;
pub mod analysis_apis;
pub mod assistant_apis;
pub mod baby_apis;
pub mod mappers;
pub mod media_apis;
pub mod notification_apis;
pub mod settings_apis;
pub mod social_apis;

#[cfg(test)]
pub(crate) mod test_support;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::domain::models::activity::ActivityValidationError;
use crate::domain::models::baby::BabyValidationError;
use crate::domain::models::media::MediaError;

/// Status code for an error coming out of a domain service
pub fn status_for(e: &anyhow::Error) -> StatusCode {
    if e.downcast_ref::<BabyValidationError>().is_some()
        || e.downcast_ref::<ActivityValidationError>().is_some()
    {
        return StatusCode::BAD_REQUEST;
    }
    if let Some(media_error) = e.downcast_ref::<MediaError>() {
        return match media_error {
            MediaError::NotFound(_) => StatusCode::NOT_FOUND,
            MediaError::SourceNotFound(_) | MediaError::InvalidImageData(_) => StatusCode::BAD_REQUEST,
            MediaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }

    let message = e.to_string();
    if message.contains("not found") {
        StatusCode::NOT_FOUND
    } else if message.starts_with("Invalid") {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Log `e` and turn it into a plain-text response
pub fn error_response(action: &str, e: anyhow::Error) -> Response {
    error!("Failed to {}: {:#}", action, e);
    (status_for(&e), e.to_string()).into_response()
}
