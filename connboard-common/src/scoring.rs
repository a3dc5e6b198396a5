//! Daily score calculation
//!
//! A row is solved when all four cells share one category. Solving every
//! category earns `8 - rows + 4`, so a perfect four-row game scores 8 and each
//! extra guess costs a point. The result is not floored: very long games can
//! score zero or less. Unfinished games earn one point per solved category.

use std::collections::BTreeSet;

use crate::grid::{Category, Grid, ROW_WIDTH};

/// Score for a game where every category was found in the minimum rows
pub const PERFECT_SCORE: i64 = 8;

/// Score a validated grid
pub fn score(grid: &Grid) -> i64 {
    let solved: BTreeSet<Category> = grid
        .rows()
        .iter()
        .filter(|row| is_solved(row))
        .map(|row| row[0])
        .collect();

    let success = solved.len() as i64;
    let rows = grid.row_count() as i64;

    if solved.len() == Category::ALL.len() {
        PERFECT_SCORE - rows + success
    } else {
        success
    }
}

/// True when all cells of a row carry the same category
pub fn is_solved(row: &[Category; ROW_WIDTH]) -> bool {
    row.iter().all(|cell| *cell == row[0])
}
