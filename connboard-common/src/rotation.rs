//! Monthly leaderboard rotation
//!
//! Once per calendar month the scheduler closes the previous period for every
//! community: it resolves the winner, archives the period and announces the
//! winner where a destination is configured.
//!
//! The wait is re-derived from the wall clock on every wake instead of using
//! a fixed interval, and sleeps are capped at `max_sleep_secs`, so restarts,
//! suspends and clock changes self-correct. Each community is processed
//! independently: a failing store query, notifier or even a panic in one
//! community is logged and recorded in the [`RotationReport`] while the
//! others continue. Archive records make every step idempotent, so firing a
//! period twice never announces twice.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use futures::{stream, FutureExt, StreamExt};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RotationConfig;
use crate::period::{self, RotationPeriod};
use crate::ranking::{format_announcement, ScoreEntry};
use crate::store::{CommunityRegistry, LeaderboardStore};
use crate::time::Clock;
use crate::{Error, Result};

/// Delivers announcement text to a community's configured destination
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn announce(&self, destination: &str, message: &str) -> Result<()>;
}

/// What happened to one community during a firing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommunityOutcome {
    /// Period was archived by an earlier firing; nothing done
    AlreadyArchived,
    /// Nobody submitted during the period
    NoEntries,
    /// Archived, but the community has no announcement destination
    Archived { winner: ScoreEntry },
    /// Archived and announced
    Announced { winner: ScoreEntry },
}

/// Summary of one firing
#[derive(Debug, Clone, Serialize)]
pub struct RotationReport {
    pub period: RotationPeriod,
    pub outcomes: Vec<(String, CommunityOutcome)>,
    /// (community id, error) for communities whose processing failed
    pub failures: Vec<(String, String)>,
}

impl RotationReport {
    fn new(period: RotationPeriod) -> Self {
        Self {
            period,
            outcomes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn outcome(&self, community_id: &str) -> Option<&CommunityOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == community_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn announced(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, CommunityOutcome::Announced { .. }))
            .count()
    }
}

/// Background control loop that rotates leaderboards at month boundaries
pub struct RotationScheduler {
    store: Arc<dyn LeaderboardStore>,
    registry: Arc<dyn CommunityRegistry>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: RotationConfig,
}

impl RotationScheduler {
    pub fn new(
        store: Arc<dyn LeaderboardStore>,
        registry: Arc<dyn CommunityRegistry>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: RotationConfig,
    ) -> Self {
        Self {
            store,
            registry,
            notifier,
            clock,
            config,
        }
    }

    /// Next month boundary after the clock's current time
    pub fn next_boundary(&self) -> DateTime<FixedOffset> {
        period::next_boundary(&self.clock.now())
    }

    /// Wall-clock time left until the next month boundary
    pub fn time_until_next_firing(&self) -> Duration {
        let now = self.clock.now();
        (period::next_boundary(&now) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Close `closed` for every known community
    ///
    /// Never fails: enumeration and per-community errors end up in the report.
    pub async fn fire(&self, closed: RotationPeriod) -> RotationReport {
        info!(period = %closed, "Monthly rotation started");
        let mut report = RotationReport::new(closed);

        let community_ids = match self.registry.community_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(period = %closed, error = %e, "Failed to enumerate communities");
                report.failures.push(("*".to_string(), e.to_string()));
                return report;
            }
        };

        let results: Vec<(String, Result<CommunityOutcome>)> = stream::iter(community_ids)
            .map(|community_id| async move {
                let outcome = AssertUnwindSafe(self.process_community(&community_id, closed))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        Err(Error::Internal("community processing panicked".to_string()))
                    });
                (community_id, outcome)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for (community_id, result) in results {
            match result {
                Ok(outcome) => {
                    debug!(community = %community_id, period = %closed, ?outcome, "Community rotated");
                    report.outcomes.push((community_id, outcome));
                }
                Err(e) => {
                    error!(
                        community = %community_id,
                        period = %closed,
                        error = %e,
                        "Error processing monthly rotation for community"
                    );
                    report.failures.push((community_id, e.to_string()));
                }
            }
        }
        report.outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        report.failures.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            period = %closed,
            communities = report.outcomes.len() + report.failures.len(),
            announced = report.announced(),
            failed = report.failures.len(),
            "Monthly rotation completed"
        );
        report
    }

    async fn process_community(
        &self,
        community_id: &str,
        closed: RotationPeriod,
    ) -> Result<CommunityOutcome> {
        if self.store.archived(community_id, closed).await?.is_some() {
            return Ok(CommunityOutcome::AlreadyArchived);
        }

        let Some(winner) = self.store.winner(community_id, closed).await? else {
            return Ok(CommunityOutcome::NoEntries);
        };

        // Read the destination before archiving so a lookup failure leaves
        // the period open for the next attempt
        let destination = self.registry.announcement_destination(community_id).await?;

        if !self
            .store
            .archive_period(community_id, closed, Some(&winner))
            .await?
        {
            return Ok(CommunityOutcome::AlreadyArchived);
        }
        info!(
            community = %community_id,
            period = %closed,
            winner = %winner.user_id,
            score = winner.score,
            "Leaderboard archived"
        );

        let Some(destination) = destination else {
            return Ok(CommunityOutcome::Archived { winner });
        };

        self.notifier
            .announce(&destination, &format_announcement(&winner))
            .await?;
        info!(community = %community_id, period = %closed, "Winner announced");

        Ok(CommunityOutcome::Announced { winner })
    }

    /// Fire for the period before the current one
    ///
    /// Covers a boundary that passed while the process was down; communities
    /// already archived are skipped.
    pub async fn catch_up(&self) -> RotationReport {
        let previous = RotationPeriod::at(&self.clock.now()).previous();
        self.fire(previous).await
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        if self.config.catch_up_on_start {
            self.catch_up().await;
        }

        let max_sleep = Duration::from_secs(self.config.max_sleep_secs.max(1));
        let mut watched = RotationPeriod::at(&self.clock.now());
        let mut logged_boundary: Option<DateTime<FixedOffset>> = None;

        loop {
            let now = self.clock.now();
            let current = RotationPeriod::at(&now);

            if current < watched {
                warn!(
                    current = %current,
                    watched = %watched,
                    "Wall clock moved back across a month boundary"
                );
                watched = current;
            }

            if current > watched {
                // Normally one period; more if the process slept through several
                let mut closed = watched;
                while closed < current {
                    self.fire(closed).await;
                    closed = closed.next();
                }
                watched = current;
                continue;
            }

            let boundary = period::next_boundary(&now);
            if logged_boundary != Some(boundary) {
                let remaining = boundary - now;
                info!(
                    next = %boundary,
                    days = remaining.num_days(),
                    hours = remaining.num_hours() % 24,
                    "Monthly rotation scheduled"
                );
                logged_boundary = Some(boundary);
            }

            let wait = (boundary - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .clamp(Duration::from_millis(1), max_sleep);

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Rotation scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Spawn [`Self::run`] on the tokio runtime
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        if !self.config.enabled {
            info!("Rotation scheduler disabled by configuration");
            return tokio::spawn(async {});
        }
        tokio::spawn(self.run(shutdown))
    }
}
