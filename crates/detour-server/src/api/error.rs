//! HTTP mapping for planning errors.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use detour_core::{RouteError, RouteErrorKind};
use serde_json::json;

use crate::state::StoreError;

#[derive(Debug)]
pub enum ApiError {
    Route(RouteError),
    NotFound(String),
    SessionLimit(usize),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Route(err) => match err.kind() {
                RouteErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                RouteErrorKind::NoRoute => StatusCode::NOT_FOUND,
                RouteErrorKind::ProviderUnavailable => StatusCode::BAD_GATEWAY,
            },
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        ApiError::Route(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionLimit(limit) => ApiError::SessionLimit(limit),
            StoreError::Route(err) => ApiError::Route(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Route(RouteError::invalid_input(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Route(err) => json!({ "kind": err.kind(), "message": err.message() }),
            ApiError::NotFound(id) => json!({
                "kind": "not_found",
                "message": format!("session {} not found", id),
            }),
            ApiError::SessionLimit(limit) => json!({
                "kind": "session_limit",
                "message": format!("session limit of {} reached", limit),
            }),
        };
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, body);
        }
        (status, Json(body)).into_response()
    }
}
