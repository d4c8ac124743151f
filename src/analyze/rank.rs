//! Ranker/limiter: order scored listings and cut to the requested size.

use std::cmp::Ordering;

use super::scoring::ScoredListing;

pub const DEFAULT_FINAL_LIMIT: usize = 20;

/// Descending by score with NaN pushed to the end.
fn by_score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Sort by `hot_score` descending and keep the first `final_limit`.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank(mut scored: Vec<ScoredListing>, final_limit: usize) -> Vec<ScoredListing> {
    scored.sort_by(|a, b| by_score_desc(a.hot_score, b.hot_score));
    scored.truncate(final_limit);
    scored
}
