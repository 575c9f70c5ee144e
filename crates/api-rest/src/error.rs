//! Mapping from core errors to HTTP responses.
//!
//! Client mistakes become `400`, missing resources `404`, and everything else is logged and
//! collapsed to a generic `500` so storage details never reach the caller.

use api_shared::ErrorRes;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cartella_core::{FieldErrors, IdError, RecordError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(FieldErrors),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Validation(fields) => ApiError::Validation(fields),
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => ErrorRes::new(message),
            ApiError::Validation(fields) => ErrorRes {
                error: "Validation failed".into(),
                fields: Some(fields.into_inner()),
            },
            ApiError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorRes::new("Internal server error")
            }
        };
        (status, Json(body)).into_response()
    }
}
