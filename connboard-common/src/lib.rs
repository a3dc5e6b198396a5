//! # connboard Common Library
//!
//! Shared code for the Connections leaderboard service:
//! - Share-text parsing and scoring
//! - Competition ranking and leaderboard text
//! - Rotation periods and the monthly rotation scheduler
//! - Leaderboard store contracts with SQLite and in-memory backends
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod grid;
pub mod period;
pub mod ranking;
pub mod rotation;
pub mod scoring;
pub mod store;
pub mod submission;
pub mod time;

pub use error::{Error, Result};
pub use period::RotationPeriod;
pub use ranking::{RankedEntry, ScoreEntry};
pub use rotation::{Notifier, RotationScheduler};
pub use store::{CommunityRegistry, LeaderboardStore};
pub use submission::LeaderboardService;
