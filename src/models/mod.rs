pub mod coin;

pub use coin::{CoinDirectoryEntry, CoinSummary, TrendingCategory, TrendingSet};
