use std::fmt::Display;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Handler error. Renders as `{"success": false, "error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// The same error rendered in the older `{"error": ...}` shape.
#[derive(Debug)]
pub struct Legacy(pub ApiError);

impl From<ApiError> for Legacy {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for Legacy {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.0.to_string() }));
        (self.0.status(), body).into_response()
    }
}

/// Log `err` and replace it with a 500 carrying only `message`.
pub fn internal<E: Display>(message: &'static str) -> impl FnOnce(E) -> ApiError {
    move |err| {
        error!("{}: {}", message, err);
        ApiError::Internal(message.to_string())
    }
}
