//! Leaderboard and winner queries

use axum::{
    extract::{Path, State},
    Json,
};
use connboard_common::submission::Leaderboard;
use connboard_common::RotationPeriod;
use serde::Serialize;

use super::ApiError;
use crate::AppState;

/// GET /api/communities/:community/leaderboard
pub async fn current_leaderboard(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Result<Json<Leaderboard>, ApiError> {
    Ok(Json(state.service.leaderboard(&community_id).await?))
}

/// GET /api/communities/:community/leaderboard/:year/:month
pub async fn period_leaderboard(
    State(state): State<AppState>,
    Path((community_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Json<Leaderboard>, ApiError> {
    let period = RotationPeriod::new(year, month)?;
    Ok(Json(
        state.service.leaderboard_for(&community_id, period).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct WinnerResponse {
    pub period: RotationPeriod,
    pub user_id: String,
    pub score: i64,
    /// Whether the period has been closed by the monthly rotation
    pub archived: bool,
}

/// GET /api/communities/:community/winner/:year/:month
///
/// Archived periods report the winner recorded at rotation time; open
/// periods report the current leader.
pub async fn period_winner(
    State(state): State<AppState>,
    Path((community_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Json<WinnerResponse>, ApiError> {
    let period = RotationPeriod::new(year, month)?;
    let store = state.service.store();

    let (winner, archived) = match store.archived(&community_id, period).await? {
        Some(record) => (record.winner, true),
        None => (store.winner(&community_id, period).await?, false),
    };

    let winner = winner.ok_or_else(|| ApiError::NotFound("winner".to_string()))?;
    Ok(Json(WinnerResponse {
        period,
        user_id: winner.user_id,
        score: winner.score,
        archived,
    }))
}
