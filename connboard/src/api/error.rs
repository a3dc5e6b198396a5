//! Error responses for API handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use connboard_common::Error;
use serde_json::json;

/// Handler error mapped to an HTTP status
///
/// Bodies carry the internal description (`error`) and the text a chat
/// adapter should show the user (`reply`).
#[derive(Debug)]
pub enum ApiError {
    Leaderboard(Error),
    NotFound(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Leaderboard(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Leaderboard(Error::Parse(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Leaderboard(Error::DuplicateSubmission { .. })
            | ApiError::Leaderboard(Error::PeriodClosed { .. }) => StatusCode::CONFLICT,
            ApiError::Leaderboard(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Leaderboard(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, reply) = match self {
            ApiError::Leaderboard(e) => (e.to_string(), e.user_message()),
            ApiError::NotFound(what) => (format!("{} not found", what), format!("No {} found.", what)),
        };

        (status, Json(json!({ "error": error, "reply": reply }))).into_response()
    }
}
