//! Connections share-text parsing
//!
//! A share message looks like:
//!
//! ```text
//! Connections
//! Puzzle #123
//! 🟨🟨🟨🟨
//! 🟩🟦🟩🟩
//! 🟩🟩🟩🟩
//! 🟦🟦🟦🟦
//! 🟪🟪🟪🟪
//! ```
//!
//! The first two lines are header and puzzle number and are discarded. Every
//! remaining non-empty line is one guess: four colored squares, one per
//! category of the guessed words.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker line every share message starts with
pub const SUBMISSION_MARKER: &str = "Connections";

/// Cells per guess row
pub const ROW_WIDTH: usize = 4;

/// Minimum number of guess rows in a finished puzzle
pub const MIN_ROWS: usize = 4;

/// Lines preceding the grid (marker + puzzle number)
const HEADER_LINES: usize = 2;

/// Puzzle category, identified by its color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Yellow = 0,
    Green = 1,
    Blue = 2,
    Purple = 3,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Yellow,
        Category::Green,
        Category::Blue,
        Category::Purple,
    ];

    /// Map a share-text symbol to its category
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '🟨' => Some(Category::Yellow),
            '🟩' => Some(Category::Green),
            '🟦' => Some(Category::Blue),
            '🟪' => Some(Category::Purple),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Category::Yellow => '🟨',
            Category::Green => '🟩',
            Category::Blue => '🟦',
            Category::Purple => '🟪',
        }
    }
}

/// Reasons a share message is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid emoji: {0}")]
    InvalidSymbol(char),

    #[error("Invalid grid format: expected at least {} rows, found {}", MIN_ROWS, .0)]
    TooFewRows(usize),

    #[error("Invalid grid format: row {} must contain exactly {} squares", .0 + 1, ROW_WIDTH)]
    MalformedRow(usize),
}

/// Validated guess grid: at least four rows of exactly four categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<[Category; ROW_WIDTH]>,
}

impl Grid {
    pub fn rows(&self) -> &[[Category; ROW_WIDTH]] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// True when the text is a Connections share message worth parsing
pub fn is_submission(text: &str) -> bool {
    text.trim().starts_with(SUBMISSION_MARKER)
}

/// Parse a share message into a validated grid
///
/// Symbols are validated first, then the row count, then each row's width.
pub fn parse(text: &str) -> Result<Grid, ParseError> {
    let lines: Vec<Vec<Category>> = text
        .trim()
        .lines()
        .skip(HEADER_LINES)
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect::<Result<_, _>>()?;

    if lines.len() < MIN_ROWS {
        return Err(ParseError::TooFewRows(lines.len()));
    }

    let rows = lines
        .into_iter()
        .enumerate()
        .map(|(index, cells)| {
            <[Category; ROW_WIDTH]>::try_from(cells).map_err(|_| ParseError::MalformedRow(index))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Grid { rows })
}

fn parse_line(line: &str) -> Result<Vec<Category>, ParseError> {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| Category::from_symbol(c).ok_or(ParseError::InvalidSymbol(c)))
        .collect()
}
