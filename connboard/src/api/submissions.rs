//! Chat message submission endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use connboard_common::{Error, RotationPeriod};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub user_id: String,
    /// Raw chat message text
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub score: i64,
    pub total: i64,
    pub period: RotationPeriod,
    /// Reply text for the submitting user
    pub reply: String,
}

/// POST /api/communities/:community/submissions
///
/// 200 with the score when accepted, 204 when the message is not a
/// Connections share.
pub async fn submit(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> Result<Response, ApiError> {
    if request.user_id.trim().is_empty() {
        return Err(Error::InvalidInput("user_id must not be empty".to_string()).into());
    }

    let accepted = state
        .service
        .submit(&community_id, &request.user_id, &request.text)
        .await?;

    Ok(match accepted {
        Some(accepted) => Json(SubmitResponse {
            score: accepted.score,
            total: accepted.total,
            period: accepted.period,
            reply: accepted.reply(),
        })
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
