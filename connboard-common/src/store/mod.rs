//! Leaderboard persistence contracts
//!
//! The submission pipeline and the rotation scheduler only talk to storage
//! through these traits. Two backends implement them:
//!
//! - [`SqliteStore`]: period-indexed rows keyed by (community, user, year,
//!   month). Starting a new month is just writing under a new key, and
//!   archiving records the resolved winner.
//! - [`MemoryStore`]: one mutable accumulator per community that is
//!   snapshotted and cleared when its period is archived. No persistence.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::{ArchiveRecord, CommunityConfig, SubmissionRecord};
use crate::period::RotationPeriod;
use crate::ranking::ScoreEntry;
use crate::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable per-(community, user, period) score accumulator
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Add a daily score to the user's total for the period containing `day`
    ///
    /// Returns the new total. At most one submission per user per community
    /// per day is accepted; the check and the increment happen atomically, so
    /// of two racing submissions for the same day exactly one succeeds and the
    /// other fails with [`crate::Error::DuplicateSubmission`].
    async fn record_submission(
        &self,
        community_id: &str,
        user_id: &str,
        score: i64,
        day: NaiveDate,
    ) -> Result<i64>;

    /// All entries of a period, highest score first
    ///
    /// Equal scores keep creation order (first to submit comes first).
    async fn standings(&self, community_id: &str, period: RotationPeriod)
        -> Result<Vec<ScoreEntry>>;

    /// Highest scoring entry of a period, `None` when nobody submitted
    async fn winner(&self, community_id: &str, period: RotationPeriod) -> Result<Option<ScoreEntry>> {
        Ok(self.standings(community_id, period).await?.into_iter().next())
    }

    /// One user's record for a period
    async fn user_record(
        &self,
        community_id: &str,
        user_id: &str,
        period: RotationPeriod,
    ) -> Result<Option<SubmissionRecord>>;

    /// Finalize a closed period, storing its winner
    ///
    /// Returns `true` if this call archived the period and `false` if it was
    /// already archived, in which case nothing changes.
    async fn archive_period(
        &self,
        community_id: &str,
        period: RotationPeriod,
        winner: Option<&ScoreEntry>,
    ) -> Result<bool>;

    /// Archive record of a period, if it has been finalized
    async fn archived(&self, community_id: &str, period: RotationPeriod)
        -> Result<Option<ArchiveRecord>>;
}

/// Registry of communities and their configuration
#[async_trait]
pub trait CommunityRegistry: Send + Sync {
    /// Every known community: registered ones plus any that have submissions
    async fn community_ids(&self) -> Result<Vec<String>>;

    /// Register a community (no-op if already known)
    async fn register_community(&self, community_id: &str) -> Result<()>;

    async fn community(&self, community_id: &str) -> Result<Option<CommunityConfig>>;

    /// Set where winner announcements for a community are delivered
    async fn set_announcement_destination(&self, community_id: &str, destination: &str)
        -> Result<()>;

    async fn announcement_destination(&self, community_id: &str) -> Result<Option<String>> {
        Ok(self
            .community(community_id)
            .await?
            .and_then(|c| c.announcement_destination))
    }
}
