//! Shared-secret gate in front of the todo routes.
//!
//! When a key is configured, every request must carry it verbatim in the
//! `X-API-Key` header. [`crate::app`] decides whether to install the gate at
//! all and warns when it does not.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The configured secret, cheap to clone into each request.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn matches(&self, provided: Option<&str>) -> bool {
        matches!(provided, Some(value) if !value.is_empty() && value == &*self.0)
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

pub async fn require_api_key(State(key): State<ApiKey>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if !key.matches(provided) {
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}
