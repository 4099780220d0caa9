//! Error taxonomy shared by the planner and route providers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a planning cycle or a single provider call.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    /// Malformed coordinate entry or an unusable request (fewer than 2 waypoints, bad hazard).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The provider answered but had no route for the given waypoints/regions.
    #[error("no route: {0}")]
    NoRoute(String),
    /// Network/HTTP failure or a response that could not be understood.
    #[error("route provider unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteErrorKind {
    InvalidInput,
    NoRoute,
    ProviderUnavailable,
}

impl RouteError {
    pub fn kind(&self) -> RouteErrorKind {
        match self {
            RouteError::InvalidInput(_) => RouteErrorKind::InvalidInput,
            RouteError::NoRoute(_) => RouteErrorKind::NoRoute,
            RouteError::ProviderUnavailable(_) => RouteErrorKind::ProviderUnavailable,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RouteError::InvalidInput(message)
            | RouteError::NoRoute(message)
            | RouteError::ProviderUnavailable(message) => message,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        RouteError::InvalidInput(message.into())
    }

    pub fn no_route(message: impl Into<String>) -> Self {
        RouteError::NoRoute(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        RouteError::ProviderUnavailable(message.into())
    }
}

/// Wire form of a [`RouteError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteErrorBody {
    pub kind: RouteErrorKind,
    pub message: String,
}

impl From<&RouteError> for RouteErrorBody {
    fn from(err: &RouteError) -> Self {
        Self {
            kind: err.kind(),
            message: err.message().to_string(),
        }
    }
}
