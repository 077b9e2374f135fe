use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::cloud::ProviderError;

pub const INSTANCE_NOT_FOUND: &str = "Instance with this IP not found";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Upstream(#[from] ProviderError),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(msg) | ApiError::NotFound(msg) => *msg,
            ApiError::Upstream(_) => "Cloud provider request failed",
            ApiError::Timeout(_) => "Request timed out",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            ApiError::Upstream(_) | ApiError::Timeout(_) | ApiError::Internal(_)
        ) {
            error!("request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.public_message(),
        }));

        (self.status(), body).into_response()
    }
}
