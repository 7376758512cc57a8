//! Service-level errors that never enter fault containment.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::body::BodyError;
use crate::registry::RegistryError;

/// Errors the request pipeline answers directly, before an endpoint
/// runs.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// No endpoint is registered under the requested name.
    #[error("API Endpoint not found!")]
    UnknownEndpoint,

    /// The request input could not be parsed.
    #[error("{0}")]
    MalformedInput(#[from] BodyError),

    /// The request body could not be read off the connection.
    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl ServiceError {
    #[must_use]
    fn status(&self) -> StatusCode {
        match self {
            Self::UnknownEndpoint => StatusCode::NOT_FOUND,
            Self::MalformedInput(_) | Self::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Errors that abort server startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StartupError {
    /// An endpoint registration collided.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// An endpoint could not be constructed.
    #[error("endpoint setup failed: {0}")]
    Endpoint(#[from] drydock_endpoints::OpsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_endpoint_is_404_with_exact_text() {
        let error = ServiceError::UnknownEndpoint;
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "API Endpoint not found!");
    }

    #[test]
    fn malformed_input_is_400() {
        let inner = match serde_json::from_slice::<serde_json::Value>(b"{oops") {
            Err(e) => e,
            Ok(_) => panic!("input must be malformed"),
        };
        let error = ServiceError::MalformedInput(BodyError::Json(inner));
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn body_read_failure_is_400() {
        let error = ServiceError::BodyRead("connection reset".to_owned());
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("connection reset"));
    }
}
