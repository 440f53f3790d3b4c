//! Error responses.
//!
//! Every failure a handler can produce is an [`ApiError`]; this is the one
//! place that decides status codes and JSON bodies. Store errors are routed
//! through [`ApiError::write`] or [`ApiError::read`] so a classified conflict
//! becomes 409 on write paths and read failures surface as 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todo_core::ValidationError;

use crate::store::StoreError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid json payload")]
    InvalidPayload(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Id is required")]
    MissingPathId,

    #[error("id must be an integer")]
    InvalidPathId(String),

    #[error("title must be unique")]
    Conflict(#[source] StoreError),

    /// Store failure on a write path.
    #[error("{context}")]
    WriteFailed {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// Store failure on a read path.
    #[error("{context}")]
    ReadFailed {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("missing or invalid api key")]
    Unauthorized,

    #[error("resource not found")]
    NotFound,
}

impl ApiError {
    pub fn write(context: &'static str, source: StoreError) -> Self {
        if source.is_conflict() {
            ApiError::Conflict(source)
        } else {
            ApiError::WriteFailed { context, source }
        }
    }

    pub fn read(context: &'static str, source: StoreError) -> Self {
        ApiError::ReadFailed { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_)
            | ApiError::Validation(_)
            | ApiError::MissingPathId
            | ApiError::InvalidPathId(_)
            | ApiError::WriteFailed { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ReadFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::InvalidPayload(details) => Some(details.clone()),
            ApiError::WriteFailed { source, .. } | ApiError::ReadFailed { source, .. } => {
                Some(source.to_string())
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::ReadFailed { source, .. } => {
                tracing::error!(error = %source, kind = ?source.kind, "{}", self);
            }
            ApiError::WriteFailed { source, .. } | ApiError::Conflict(source) => {
                tracing::warn!(error = %source, kind = ?source.kind, "{}", self);
            }
            ApiError::Validation(err) => {
                tracing::debug!(index = ?err.index(), "rejected batch: {err}");
            }
            _ => tracing::debug!(%status, "{}", self),
        }

        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
