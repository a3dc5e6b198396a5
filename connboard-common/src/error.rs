//! Common error types for connboard

use chrono::NaiveDate;
use thiserror::Error;

use crate::grid::ParseError;
use crate::period::RotationPeriod;

/// Common result type for connboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across connboard crates
#[derive(Error, Debug)]
pub enum Error {
    /// Submission text is not a valid grid (user input error)
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// User already has an accepted submission for this calendar day
    #[error("User {user} already submitted in community {community} on {day}")]
    DuplicateSubmission {
        community: String,
        user: String,
        day: NaiveDate,
    },

    /// Submission falls in a period that rotation has already archived
    #[error("Period {period} is closed for community {community}")]
    PeriodClosed {
        community: String,
        period: RotationPeriod,
    },

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-SQL store backend failure
    #[error("Store error: {0}")]
    Store(String),

    /// Announcement delivery failed
    #[error("Notifier error: {0}")]
    Notifier(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Reply text shown to the user whose request produced this error
    pub fn user_message(&self) -> String {
        match self {
            Error::Parse(e) => format!("Error: {}", e),
            Error::DuplicateSubmission { .. } => {
                "You have already submitted a score today.".to_string()
            }
            Error::PeriodClosed { .. } => {
                "This month's leaderboard has already closed.".to_string()
            }
            Error::InvalidInput(msg) => format!("Error: {}", msg),
            _ => "An error occurred. Please try again.".to_string(),
        }
    }

    /// True for failures operators need to hear about
    ///
    /// Parse errors, duplicate or late submissions and bad input are
    /// expected user outcomes and are not logged as faults.
    pub fn is_fault(&self) -> bool {
        !matches!(
            self,
            Error::Parse(_)
                | Error::DuplicateSubmission { .. }
                | Error::PeriodClosed { .. }
                | Error::InvalidInput(_)
        )
    }
}
