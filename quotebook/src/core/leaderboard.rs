use std::fmt;

/// Number of quotees shown on the leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

/// One ranked leaderboard entry
///
/// Displays as a ranked line: `` `1:` <@42>: 5 ``.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    /// One-based position
    pub rank: usize,
    pub quotee: String,
    pub count: u64,
}

impl fmt::Display for LeaderboardRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}:` {}: {}", self.rank, self.quotee, self.count)
    }
}

/// Assign one-based ranks to rows already ordered by the store.
pub fn rank(rows: Vec<(String, u64)>) -> Vec<LeaderboardRow> {
    rows.into_iter()
        .enumerate()
        .map(|(index, (quotee, count))| LeaderboardRow {
            rank: index + 1,
            quotee,
            count,
        })
        .collect()
}

/// Render ranked rows one per line.
pub fn render(rows: &[LeaderboardRow]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
