//! Database models

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::period::RotationPeriod;
use crate::ranking::ScoreEntry;

/// Accumulated score of one user in one community for one month
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub community_id: String,
    pub user_id: String,
    pub period: RotationPeriod,
    pub score: i64,
    pub submission_count: i64,
    pub last_submission_day: Option<NaiveDate>,
}

/// Community settings owned by the host integration
#[derive(Debug, Clone, Serialize)]
pub struct CommunityConfig {
    pub community_id: String,
    pub announcement_destination: Option<String>,
}

/// A finalized period and the winner resolved for it
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveRecord {
    pub community_id: String,
    pub period: RotationPeriod,
    pub winner: Option<ScoreEntry>,
    pub archived_at: DateTime<Utc>,
}
