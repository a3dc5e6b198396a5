//! Operator authentication middleware
//!
//! Operator routes require `Authorization: Bearer <operator_token>`. With no
//! token configured the check is disabled.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Authentication middleware
///
/// Applied to operator routes only; `/health` and the submission and
/// leaderboard routes do not use it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(expected) = state.operator_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Malformed)?
        .trim();

    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        warn!(path = %request.uri().path(), "Rejected operator request with invalid token");
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    Malformed,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing Authorization header",
            AuthError::Malformed => "Authorization header must be 'Bearer <token>'",
            AuthError::InvalidToken => "Invalid operator token",
        };

        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}
