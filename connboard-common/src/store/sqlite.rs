//! SQLite-backed leaderboard store
//!
//! Rows are keyed by (community, user, year, month). Nothing is ever reset:
//! a new month simply starts new rows, and closed months stay queryable.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{CommunityRegistry, LeaderboardStore};
use crate::db::{ArchiveRecord, CommunityConfig, SubmissionRecord};
use crate::period::RotationPeriod;
use crate::ranking::ScoreEntry;
use crate::{time, Error, Result};

/// Leaderboard store and community registry on a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_day(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            s.parse::<NaiveDate>()
                .map_err(|e| Error::Store(format!("Invalid last_submission_day '{}': {}", s, e)))
        })
        .transpose()
}

#[async_trait]
impl LeaderboardStore for SqliteStore {
    async fn record_submission(
        &self,
        community_id: &str,
        user_id: &str,
        score: i64,
        day: NaiveDate,
    ) -> Result<i64> {
        let period = RotationPeriod::containing(day);
        let now = time::now();

        // Single statement: insert the first submission of the period, or add
        // to the total only if the stored day differs. Nothing is selected
        // once the period is archived. Either rejection yields no row.
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO submissions (
                community_id, user_id, year, month, score, submission_count,
                last_submission_day, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?7
            WHERE NOT EXISTS (
                SELECT 1 FROM archived_periods
                WHERE community_id = ?1 AND year = ?3 AND month = ?4
            )
            ON CONFLICT (community_id, user_id, year, month) DO UPDATE SET
                score = score + excluded.score,
                submission_count = submission_count + 1,
                last_submission_day = excluded.last_submission_day,
                updated_at = excluded.updated_at
            WHERE last_submission_day IS NULL
               OR last_submission_day <> excluded.last_submission_day
            RETURNING score
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(period.year())
        .bind(period.month())
        .bind(score)
        .bind(day.to_string())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(total) = total {
            debug!(
                community = community_id,
                user = user_id,
                period = %period,
                score,
                total,
                "Recorded submission"
            );
            return Ok(total);
        }

        // Archive records are never removed, so a closed period stays closed
        if self.archived(community_id, period).await?.is_some() {
            return Err(Error::PeriodClosed {
                community: community_id.to_string(),
                period,
            });
        }
        Err(Error::DuplicateSubmission {
            community: community_id.to_string(),
            user: user_id.to_string(),
            day,
        })
    }

    async fn standings(
        &self,
        community_id: &str,
        period: RotationPeriod,
    ) -> Result<Vec<ScoreEntry>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT user_id, score FROM submissions
            WHERE community_id = ? AND year = ? AND month = ?
            ORDER BY score DESC, id ASC
            "#,
        )
        .bind(community_id)
        .bind(period.year())
        .bind(period.month())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, score)| ScoreEntry { user_id, score })
            .collect())
    }

    async fn winner(
        &self,
        community_id: &str,
        period: RotationPeriod,
    ) -> Result<Option<ScoreEntry>> {
        let row = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT user_id, score FROM submissions
            WHERE community_id = ? AND year = ? AND month = ?
            ORDER BY score DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(community_id)
        .bind(period.year())
        .bind(period.month())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, score)| ScoreEntry { user_id, score }))
    }

    async fn user_record(
        &self,
        community_id: &str,
        user_id: &str,
        period: RotationPeriod,
    ) -> Result<Option<SubmissionRecord>> {
        let row = sqlx::query_as::<_, (i64, i64, Option<String>)>(
            r#"
            SELECT score, submission_count, last_submission_day FROM submissions
            WHERE community_id = ? AND user_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(community_id)
        .bind(user_id)
        .bind(period.year())
        .bind(period.month())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(score, submission_count, last_day)| {
            Ok(SubmissionRecord {
                community_id: community_id.to_string(),
                user_id: user_id.to_string(),
                period,
                score,
                submission_count,
                last_submission_day: parse_day(last_day)?,
            })
        })
        .transpose()
    }

    async fn archive_period(
        &self,
        community_id: &str,
        period: RotationPeriod,
        winner: Option<&ScoreEntry>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO archived_periods (
                community_id, year, month, winner_user_id, winner_score, archived_at
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(community_id)
        .bind(period.year())
        .bind(period.month())
        .bind(winner.map(|w| w.user_id.as_str()))
        .bind(winner.map(|w| w.score))
        .bind(time::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn archived(
        &self,
        community_id: &str,
        period: RotationPeriod,
    ) -> Result<Option<ArchiveRecord>> {
        let row = sqlx::query_as::<_, (Option<String>, Option<i64>, DateTime<Utc>)>(
            r#"
            SELECT winner_user_id, winner_score, archived_at FROM archived_periods
            WHERE community_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(community_id)
        .bind(period.year())
        .bind(period.month())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, score, archived_at)| ArchiveRecord {
            community_id: community_id.to_string(),
            period,
            winner: user_id.zip(score).map(|(user_id, score)| ScoreEntry { user_id, score }),
            archived_at,
        }))
    }
}

#[async_trait]
impl CommunityRegistry for SqliteStore {
    async fn community_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT community_id FROM communities
            UNION
            SELECT community_id FROM submissions
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn register_community(&self, community_id: &str) -> Result<()> {
        let now = time::now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO communities (community_id, created_at, updated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(community_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn community(&self, community_id: &str) -> Result<Option<CommunityConfig>> {
        let row = sqlx::query_as::<_, (String, Option<String>)>(
            "SELECT community_id, announcement_destination FROM communities WHERE community_id = ?",
        )
        .bind(community_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(community_id, announcement_destination)| CommunityConfig {
            community_id,
            announcement_destination,
        }))
    }

    async fn set_announcement_destination(
        &self,
        community_id: &str,
        destination: &str,
    ) -> Result<()> {
        let now = time::now();
        sqlx::query(
            r#"
            INSERT INTO communities (community_id, announcement_destination, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (community_id) DO UPDATE SET
                announcement_destination = excluded.announcement_destination,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(community_id)
        .bind(destination)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
