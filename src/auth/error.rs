use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::auth::dto::ErrorResponse;

/// Everything a handler can answer with besides success. The `Internal`
/// variant carries the underlying fault for the server log while the
/// response body only ever sees the fixed public message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{public}")]
    Internal {
        public: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AuthError {
    pub fn internal(public: &'static str, source: anyhow::Error) -> Self {
        Self::Internal { public, source }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AuthError::Internal { public, source } => {
                error!(error = %source, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, public)
            }
        };
        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}
