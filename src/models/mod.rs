pub mod difficulty;
pub mod leaderboard;
pub mod target;

pub use difficulty::{ArtStyle, Difficulty, DifficultyConfig};
pub use leaderboard::{rank_entries, LeaderboardEntry};
pub use target::Target;
