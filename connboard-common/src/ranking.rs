//! Leaderboard ranking and the text contracts built on it

use serde::{Deserialize, Serialize};

/// Header line of the rendered leaderboard
pub const LEADERBOARD_HEADER: &str = "Connections Leaderboard (This Month):";

/// Reply when the current period has no entries
pub const EMPTY_LEADERBOARD: &str = "No scores recorded this month yet!";

/// One user's accumulated score within a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user_id: String,
    pub score: i64,
}

impl ScoreEntry {
    pub fn new(user_id: impl Into<String>, score: i64) -> Self {
        Self {
            user_id: user_id.into(),
            score,
        }
    }
}

/// Score entry with its competition rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub user_id: String,
    pub score: i64,
}

/// Order entries by score and assign competition ranks
///
/// The sort is stable, so tied entries keep the order they were given in.
/// Tied scores share a rank and the next distinct score takes its position:
/// scores `[10, 10, 7]` rank `[1, 1, 3]`.
pub fn rank(entries: &[ScoreEntry]) -> Vec<RankedEntry> {
    let mut sorted: Vec<&ScoreEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let mut ranked: Vec<RankedEntry> = Vec::with_capacity(sorted.len());
    for (index, entry) in sorted.into_iter().enumerate() {
        let rank = match ranked.last() {
            Some(prev) if prev.score == entry.score => prev.rank,
            _ => index + 1,
        };
        ranked.push(RankedEntry {
            rank,
            user_id: entry.user_id.clone(),
            score: entry.score,
        });
    }
    ranked
}

/// Chat mention for a user id
pub fn mention(user_id: &str) -> String {
    format!("<@{}>", user_id)
}

/// Render ranked entries as leaderboard text
pub fn format_leaderboard(ranked: &[RankedEntry]) -> String {
    if ranked.is_empty() {
        return EMPTY_LEADERBOARD.to_string();
    }

    let mut text = String::from(LEADERBOARD_HEADER);
    text.push('\n');
    for entry in ranked {
        text.push_str(&format!(
            "{}. {}: {}\n",
            entry.rank,
            mention(&entry.user_id),
            entry.score
        ));
    }
    text
}

/// Winner announcement for a closed period
pub fn format_announcement(winner: &ScoreEntry) -> String {
    format!(
        "🎉 Congratulations {} for winning this month's Connections leaderboard with {} points! 🎉",
        mention(&winner.user_id),
        winner.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(ranked: &[RankedEntry]) -> Vec<(usize, &str, i64)> {
        ranked
            .iter()
            .map(|e| (e.rank, e.user_id.as_str(), e.score))
            .collect()
    }

    #[test]
    fn test_ties_share_rank_and_next_rank_jumps() {
        let entries = vec![
            ScoreEntry::new("A", 10),
            ScoreEntry::new("B", 10),
            ScoreEntry::new("C", 7),
        ];
        assert_eq!(
            ranks(&rank(&entries)),
            vec![(1, "A", 10), (1, "B", 10), (3, "C", 7)]
        );
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(ranks(&rank(&[ScoreEntry::new("A", 5)])), vec![(1, "A", 5)]);
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn test_unsorted_input_is_sorted_stably() {
        let entries = vec![
            ScoreEntry::new("low", 2),
            ScoreEntry::new("first", 9),
            ScoreEntry::new("mid", 5),
            ScoreEntry::new("second", 9),
            ScoreEntry::new("tail", 5),
        ];
        assert_eq!(
            ranks(&rank(&entries)),
            vec![
                (1, "first", 9),
                (1, "second", 9),
                (3, "mid", 5),
                (3, "tail", 5),
                (5, "low", 2),
            ]
        );
    }

    #[test]
    fn test_negative_scores_rank_last() {
        let entries = vec![ScoreEntry::new("neg", -1), ScoreEntry::new("zero", 0)];
        assert_eq!(ranks(&rank(&entries)), vec![(1, "zero", 0), (2, "neg", -1)]);
    }

    #[test]
    fn test_format_leaderboard() {
        let ranked = rank(&[
            ScoreEntry::new("111", 16),
            ScoreEntry::new("222", 16),
            ScoreEntry::new("333", 8),
        ]);
        assert_eq!(
            format_leaderboard(&ranked),
            "Connections Leaderboard (This Month):\n1. <@111>: 16\n1. <@222>: 16\n3. <@333>: 8\n"
        );
    }

    #[test]
    fn test_format_empty_leaderboard() {
        assert_eq!(format_leaderboard(&[]), EMPTY_LEADERBOARD);
    }

    #[test]
    fn test_format_announcement() {
        let text = format_announcement(&ScoreEntry::new("42", 57));
        assert_eq!(
            text,
            "🎉 Congratulations <@42> for winning this month's Connections leaderboard with 57 points! 🎉"
        );
    }
}
