//! Trending analysis: scoring, ranking and runtime-tunable weights.

pub mod rank;
pub mod scoring;
pub mod weights;

pub use rank::{rank, DEFAULT_FINAL_LIMIT};
pub use scoring::{score, ScoreBreakdown, ScoredListing, TrendWeights, DEFAULT_MIN_SALES};
pub use weights::HotReloadWeights;
