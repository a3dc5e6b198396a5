//! Submission pipeline and leaderboard queries
//!
//! Host integrations hand raw chat messages to [`LeaderboardService::submit`]
//! and render [`Leaderboard`] for display. Every error stays scoped to the
//! request it came from.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error};

use crate::grid;
use crate::period::RotationPeriod;
use crate::ranking::{self, RankedEntry};
use crate::scoring;
use crate::store::LeaderboardStore;
use crate::time::Clock;
use crate::Result;

/// An accepted daily submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    /// Score earned by this submission
    pub score: i64,
    /// Running total for the period after this submission
    pub total: i64,
    pub period: RotationPeriod,
    pub day: NaiveDate,
}

impl Accepted {
    /// Reply text for the submitting user
    pub fn reply(&self) -> String {
        format!(
            "You earned {} points today!\nTotal score: {}",
            self.score, self.total
        )
    }
}

/// Ranked standings of one period
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub period: RotationPeriod,
    pub entries: Vec<RankedEntry>,
    /// Rendered display text
    pub text: String,
}

/// Parses, scores and records submissions; renders leaderboards
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn LeaderboardStore>,
    clock: Arc<dyn Clock>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn LeaderboardStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn LeaderboardStore> {
        &self.store
    }

    /// Period the clock is currently in
    pub fn current_period(&self) -> RotationPeriod {
        RotationPeriod::containing(self.clock.today())
    }

    /// Handle one chat message
    ///
    /// Returns `Ok(None)` when the message is not a Connections share.
    pub async fn submit(
        &self,
        community_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<Option<Accepted>> {
        if !grid::is_submission(text) {
            return Ok(None);
        }

        let grid = grid::parse(text).map_err(|e| {
            debug!(community = community_id, user = user_id, error = %e, "Rejected submission");
            e
        })?;
        let score = scoring::score(&grid);
        let day = self.clock.today();

        match self
            .store
            .record_submission(community_id, user_id, score, day)
            .await
        {
            Ok(total) => {
                debug!(
                    community = community_id,
                    user = user_id,
                    rows = grid.row_count(),
                    score,
                    total,
                    "Submission accepted"
                );
                Ok(Some(Accepted {
                    score,
                    total,
                    period: RotationPeriod::containing(day),
                    day,
                }))
            }
            Err(e) => {
                if e.is_fault() {
                    error!(
                        community = community_id,
                        user = user_id,
                        operation = "record_submission",
                        error = %e,
                        "Failed to record submission"
                    );
                } else {
                    debug!(community = community_id, user = user_id, error = %e, "Rejected submission");
                }
                Err(e)
            }
        }
    }

    /// Leaderboard of the current period
    pub async fn leaderboard(&self, community_id: &str) -> Result<Leaderboard> {
        self.leaderboard_for(community_id, self.current_period()).await
    }

    /// Leaderboard of any period
    pub async fn leaderboard_for(
        &self,
        community_id: &str,
        period: RotationPeriod,
    ) -> Result<Leaderboard> {
        let standings = self.store.standings(community_id, period).await.map_err(|e| {
            error!(
                community = community_id,
                period = %period,
                operation = "standings",
                error = %e,
                "Failed to load leaderboard"
            );
            e
        })?;
        let entries = ranking::rank(&standings);
        let text = ranking::format_leaderboard(&entries);
        Ok(Leaderboard {
            period,
            entries,
            text,
        })
    }
}
