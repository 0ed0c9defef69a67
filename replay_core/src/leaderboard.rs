//! Leaderboard decoding and ranking.
//!
//! The leaderboard service returns a bare JSON array of entries. Ranking
//! follows the simulator's score order: any successful run beats any
//! unsuccessful one, and among equals fewer ticks wins.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// A run's score as ranked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub successful: bool,

    /// Ticks until the run ended (finish, crash or timeout)
    pub time: i64,
}

impl Ord for Score {
    /// `Greater` means better.
    fn cmp(&self, other: &Self) -> Ordering {
        self.successful
            .cmp(&other.successful)
            // Reversed so that shorter times rank higher
            .then(other.time.cmp(&self.time))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One ranked submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: Score,

    /// The submitted source, when the service includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LeaderboardEntry {
    fn source_len(&self) -> usize {
        self.source.as_ref().map(|s| s.len()).unwrap_or(0)
    }

    /// Best-first comparison: higher score, then longer source.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(other.source_len().cmp(&self.source_len()))
    }
}

/// Decoded leaderboard, kept in best-first order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Builds a leaderboard from entries in any order.
    pub fn new(mut entries: Vec<LeaderboardEntry>) -> Self {
        // Stable, so equal entries keep service order
        entries.sort_by(|a, b| a.rank_cmp(b));
        Self { entries }
    }

    /// Decodes the service's JSON array.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let entries: Vec<LeaderboardEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// All entries, best first.
    pub fn ranked(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn top_n(&self, n: usize) -> impl Iterator<Item = &LeaderboardEntry> + '_ {
        self.entries.iter().take(n)
    }

    /// Entry at a 1-based rank, as shown in the table ("1st", "2nd", ...).
    pub fn entry_at_rank(&self, rank: usize) -> Option<&LeaderboardEntry> {
        rank.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, successful: bool, time: i64, source: Option<&str>) -> LeaderboardEntry {
        LeaderboardEntry {
            username: name.to_string(),
            score: Score { successful, time },
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn test_success_beats_faster_crash() {
        let crash = Score { successful: false, time: 10 };
        let finish = Score { successful: true, time: 5000 };
        assert!(finish > crash);
    }

    #[test]
    fn test_fewer_ticks_rank_higher() {
        let fast = Score { successful: true, time: 100 };
        let slow = Score { successful: true, time: 200 };
        assert!(fast > slow);
    }

    #[test]
    fn test_ranking_order() {
        let board = Leaderboard::new(vec![
            entry("crasher", false, 20, None),
            entry("slow", true, 900, None),
            entry("fast_long", true, 400, Some("a much longer program")),
            entry("fast_short", true, 400, Some("short")),
        ]);

        let names: Vec<&str> = board.ranked().iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["fast_long", "fast_short", "slow", "crasher"]);
        assert_eq!(board.entry_at_rank(1).unwrap().username, "fast_long");
        assert!(board.entry_at_rank(0).is_none());
        assert!(board.entry_at_rank(5).is_none());
        assert_eq!(board.top_n(2).count(), 2);
    }

    #[test]
    fn test_equal_scores_rank_longer_source_first() {
        let board = Leaderboard::new(vec![
            entry("short", true, 400, Some("ab")),
            entry("long", true, 400, Some("abcdefgh")),
            entry("hidden", true, 400, None),
        ]);

        let names: Vec<&str> = board.ranked().iter().map(|e| e.username.as_str()).collect();
        assert_eq!(names, vec!["long", "short", "hidden"]);
    }

    #[test]
    fn test_decode_service_array() {
        let json = r#"[
            {"username": "bob", "score": {"successful": false, "time": 33}},
            {"username": "alice", "score": {"successful": true, "time": 1290}, "source": "fn main() {}"}
        ]"#;

        let board = Leaderboard::from_json(json).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board.ranked()[0].username, "alice");
        assert_eq!(board.ranked()[1].source, None);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(matches!(
            Leaderboard::from_json(r#"{"entries": []}"#),
            Err(ReplayError::Payload(_))
        ));
    }
}
