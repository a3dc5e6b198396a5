//! In-memory leaderboard store
//!
//! Each community has one live accumulator. Archiving a period snapshots the
//! accumulator, clears it and moves it past the archived month, so the live
//! period only ever advances and late writes into a closed month are
//! rejected. A submission for a later month than the live accumulator holds
//! parks the old entries as an unarchived snapshot first, so a late rotation
//! still finds them. Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{CommunityRegistry, LeaderboardStore};
use crate::db::{ArchiveRecord, CommunityConfig, SubmissionRecord};
use crate::period::RotationPeriod;
use crate::ranking::ScoreEntry;
use crate::{time, Error, Result};

#[derive(Debug, Clone)]
struct Entry {
    user_id: String,
    score: i64,
    submission_count: i64,
    last_day: NaiveDate,
}

#[derive(Debug)]
struct Board {
    period: RotationPeriod,
    entries: Vec<Entry>,
}

#[derive(Debug, Default)]
struct Snapshot {
    entries: Vec<Entry>,
    archive: Option<ArchiveRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    communities: BTreeMap<String, Option<String>>,
    boards: HashMap<String, Board>,
    snapshots: HashMap<(String, RotationPeriod), Snapshot>,
}

impl Inner {
    fn is_archived(&self, community_id: &str, period: RotationPeriod) -> bool {
        self.snapshots
            .get(&(community_id.to_string(), period))
            .is_some_and(|s| s.archive.is_some())
    }

    fn entries(&self, community_id: &str, period: RotationPeriod) -> &[Entry] {
        match self.boards.get(community_id) {
            Some(board) if board.period == period => &board.entries,
            _ => self
                .snapshots
                .get(&(community_id.to_string(), period))
                .map(|s| s.entries.as_slice())
                .unwrap_or(&[]),
        }
    }
}

/// Single-accumulator store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))
    }
}

/// Move entries into a period's snapshot, keeping any already there
fn park(
    snapshots: &mut HashMap<(String, RotationPeriod), Snapshot>,
    community_id: &str,
    period: RotationPeriod,
    mut entries: Vec<Entry>,
) {
    snapshots
        .entry((community_id.to_string(), period))
        .or_default()
        .entries
        .append(&mut entries);
}

fn sorted(entries: &[Entry]) -> Vec<ScoreEntry> {
    let mut out: Vec<ScoreEntry> = entries
        .iter()
        .map(|e| ScoreEntry::new(e.user_id.clone(), e.score))
        .collect();
    out.sort_by(|a, b| b.score.cmp(&a.score));
    out
}

#[async_trait]
impl LeaderboardStore for MemoryStore {
    async fn record_submission(
        &self,
        community_id: &str,
        user_id: &str,
        score: i64,
        day: NaiveDate,
    ) -> Result<i64> {
        let period = RotationPeriod::containing(day);
        let closed = || Error::PeriodClosed {
            community: community_id.to_string(),
            period,
        };
        let mut inner = self.lock()?;
        let inner = &mut *inner;

        if inner.is_archived(community_id, period) {
            return Err(closed());
        }

        let board = inner
            .boards
            .entry(community_id.to_string())
            .or_insert_with(|| Board {
                period,
                entries: Vec::new(),
            });

        if period < board.period {
            return Err(closed());
        }
        if period > board.period {
            // Month rolled over before rotation ran: park the old board
            let parked = std::mem::take(&mut board.entries);
            park(&mut inner.snapshots, community_id, board.period, parked);
            board.period = period;
        }

        match board.entries.iter_mut().find(|e| e.user_id == user_id) {
            Some(entry) if entry.last_day == day => Err(Error::DuplicateSubmission {
                community: community_id.to_string(),
                user: user_id.to_string(),
                day,
            }),
            Some(entry) => {
                entry.score += score;
                entry.submission_count += 1;
                entry.last_day = day;
                Ok(entry.score)
            }
            None => {
                board.entries.push(Entry {
                    user_id: user_id.to_string(),
                    score,
                    submission_count: 1,
                    last_day: day,
                });
                Ok(score)
            }
        }
    }

    async fn standings(
        &self,
        community_id: &str,
        period: RotationPeriod,
    ) -> Result<Vec<ScoreEntry>> {
        let inner = self.lock()?;
        Ok(sorted(inner.entries(community_id, period)))
    }

    async fn user_record(
        &self,
        community_id: &str,
        user_id: &str,
        period: RotationPeriod,
    ) -> Result<Option<SubmissionRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .entries(community_id, period)
            .iter()
            .find(|e| e.user_id == user_id)
            .map(|e| SubmissionRecord {
                community_id: community_id.to_string(),
                user_id: e.user_id.clone(),
                period,
                score: e.score,
                submission_count: e.submission_count,
                last_submission_day: Some(e.last_day),
            }))
    }

    async fn archive_period(
        &self,
        community_id: &str,
        period: RotationPeriod,
        winner: Option<&ScoreEntry>,
    ) -> Result<bool> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;

        if inner.is_archived(community_id, period) {
            return Ok(false);
        }

        // Snapshot the live board if it has not moved past this period, then
        // clear it and advance it beyond the archived month
        match inner.boards.get_mut(community_id) {
            Some(board) if board.period <= period => {
                let entries = std::mem::take(&mut board.entries);
                park(&mut inner.snapshots, community_id, board.period, entries);
                board.period = period.next();
            }
            Some(_) => {}
            None => {
                inner.boards.insert(
                    community_id.to_string(),
                    Board {
                        period: period.next(),
                        entries: Vec::new(),
                    },
                );
            }
        }

        let snapshot = inner
            .snapshots
            .entry((community_id.to_string(), period))
            .or_default();
        snapshot.archive = Some(ArchiveRecord {
            community_id: community_id.to_string(),
            period,
            winner: winner.cloned(),
            archived_at: time::now(),
        });

        Ok(true)
    }

    async fn archived(
        &self,
        community_id: &str,
        period: RotationPeriod,
    ) -> Result<Option<ArchiveRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .snapshots
            .get(&(community_id.to_string(), period))
            .and_then(|s| s.archive.clone()))
    }
}

#[async_trait]
impl CommunityRegistry for MemoryStore {
    async fn community_ids(&self) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let mut ids: Vec<String> = inner
            .communities
            .keys()
            .chain(inner.boards.keys())
            .chain(inner.snapshots.keys().map(|(id, _)| id))
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn register_community(&self, community_id: &str) -> Result<()> {
        let mut inner = self.lock()?;
        inner
            .communities
            .entry(community_id.to_string())
            .or_insert(None);
        Ok(())
    }

    async fn community(&self, community_id: &str) -> Result<Option<CommunityConfig>> {
        let inner = self.lock()?;
        Ok(inner
            .communities
            .get(community_id)
            .map(|destination| CommunityConfig {
                community_id: community_id.to_string(),
                announcement_destination: destination.clone(),
            }))
    }

    async fn set_announcement_destination(
        &self,
        community_id: &str,
        destination: &str,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        inner
            .communities
            .insert(community_id.to_string(), Some(destination.to_string()));
        Ok(())
    }
}
