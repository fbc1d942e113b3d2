//! Admin authentication middleware

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim)
}

/// Reject admin requests without a configured bearer token
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = bearer_token(&request).is_some_and(|token| state.config.admin.accepts(token));
    if !authorized {
        warn!("Rejected admin request to {}", request.uri().path());
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}
