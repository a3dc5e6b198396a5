//! Community registration and announcement configuration

use axum::{
    extract::{Path, State},
    Json,
};
use connboard_common::db::CommunityConfig;
use connboard_common::Error;
use serde::Deserialize;
use tracing::info;

use super::ApiError;
use crate::AppState;

/// POST /api/communities/:community
///
/// Idempotent; returns the community's current configuration.
pub async fn register_community(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> Result<Json<CommunityConfig>, ApiError> {
    state.registry.register_community(&community_id).await?;
    let config = state
        .registry
        .community(&community_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("community".to_string()))?;
    Ok(Json(config))
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    /// Webhook URL that receives winner announcements
    pub destination: String,
}

/// PUT /api/communities/:community/announcement (operator only)
pub async fn set_announcement_destination(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
    Json(request): Json<AnnouncementRequest>,
) -> Result<Json<CommunityConfig>, ApiError> {
    let destination = request.destination.trim();
    let url = reqwest::Url::parse(destination)
        .map_err(|e| Error::InvalidInput(format!("destination is not a URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidInput(format!(
            "destination must be http or https, got {}",
            url.scheme()
        ))
        .into());
    }

    state
        .registry
        .set_announcement_destination(&community_id, destination)
        .await?;
    info!(community = %community_id, "Announcement destination updated");

    Ok(Json(CommunityConfig {
        community_id,
        announcement_destination: Some(destination.to_string()),
    }))
}
