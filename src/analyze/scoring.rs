//! Trending scorer.
//!
//! Each listing gets three sub-scores in [0,1], normalized against the maxima
//! of the listings that pass the minimum-sales gate:
//! - `sales`       : units sold / max units sold
//! - `commission`  : commission rate / max commission rate
//! - `price_value` : 0.7 * discount / max discount + 0.3 * rating / max rating
//!
//! hotScore = round(100 * (w_recent*sales + w_commission*commission + w_price_value*price_value), 2)

use serde::{Deserialize, Serialize};

use crate::ingest::types::ListingRecord;
use crate::normalize::{normalize, ListingMetrics};

pub const DEFAULT_MIN_SALES: u64 = 50;

// Normalization floors so all-zero inputs never divide by zero.
const MAX_SALES_FLOOR: f64 = 1.0;
const MAX_COMMISSION_FLOOR: f64 = 0.01;
const MAX_DISCOUNT_FLOOR: f64 = 1.0;
const MAX_RATING_FLOOR: f64 = 5.0;

const DISCOUNT_SHARE: f64 = 0.7;
const RATING_SHARE: f64 = 0.3;

/// Weights of the three sub-scores. Defaults sum to 1; overrides need not.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendWeights {
    #[serde(alias = "recent_weight")]
    pub recent: f64,
    #[serde(alias = "commission_weight")]
    pub commission: f64,
    #[serde(alias = "price_value", alias = "price_value_weight")]
    pub price_value: f64,
}

impl Default for TrendWeights {
    fn default() -> Self {
        Self {
            recent: 0.6,
            commission: 0.2,
            price_value: 0.2,
        }
    }
}

impl TrendWeights {
    /// All weights finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.recent, self.commission, self.price_value]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Per-factor contributions before weighting, each in [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub sales: f64,
    pub commission: f64,
    pub price_value: f64,
}

/// A listing that passed the sales gate, with its trending score.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredListing {
    #[serde(flatten)]
    pub listing: ListingRecord,
    pub hot_score: f64,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Clone, Copy, Debug)]
struct Maxima {
    sales: f64,
    commission: f64,
    discount: f64,
    rating: f64,
}

impl Maxima {
    fn over(metrics: &[ListingMetrics]) -> Self {
        metrics.iter().fold(
            Maxima {
                sales: MAX_SALES_FLOOR,
                commission: MAX_COMMISSION_FLOOR,
                discount: MAX_DISCOUNT_FLOOR,
                rating: MAX_RATING_FLOOR,
            },
            |acc, m| Maxima {
                sales: acc.sales.max(m.units_sold as f64),
                commission: acc.commission.max(m.commission_rate),
                discount: acc.discount.max(m.discount_rate),
                rating: acc.rating.max(m.rating),
            },
        )
    }
}

fn ratio(v: f64, max: f64) -> f64 {
    if max > 0.0 {
        (v / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn breakdown(m: &ListingMetrics, max: &Maxima) -> ScoreBreakdown {
    ScoreBreakdown {
        sales: ratio(m.units_sold as f64, max.sales),
        commission: ratio(m.commission_rate, max.commission),
        price_value: DISCOUNT_SHARE * ratio(m.discount_rate, max.discount)
            + RATING_SHARE * ratio(m.rating, max.rating),
    }
}

/// Round to two decimals and keep inside [0,100].
fn to_hot_score(total: f64) -> f64 {
    let pct = (total * 100.0 * 100.0).round() / 100.0;
    if pct.is_finite() {
        pct.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Score listings with at least `min_sales` units sold. Order of the input is kept.
pub fn score(records: Vec<ListingRecord>, min_sales: u64, w: &TrendWeights) -> Vec<ScoredListing> {
    let (kept, metrics): (Vec<ListingRecord>, Vec<ListingMetrics>) = records
        .into_iter()
        .map(|r| {
            let m = normalize(&r);
            (r, m)
        })
        .filter(|(_, m)| m.units_sold >= min_sales)
        .unzip();

    let max = Maxima::over(&metrics);

    kept.into_iter()
        .zip(metrics.iter())
        .map(|(listing, m)| {
            let b = breakdown(m, &max);
            let total =
                w.recent * b.sales + w.commission * b.commission + w.price_value * b.price_value;
            ScoredListing {
                listing,
                hot_score: to_hot_score(total),
                score_breakdown: b,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, sales: u64, commission: f64, discount: f64, rating: f64) -> ListingRecord {
        ListingRecord::new(id)
            .with_sales(sales)
            .with_commission(commission)
            .with_discount(discount)
            .with_rating(rating)
    }

    #[test]
    fn single_top_listing_scores_by_formula() {
        // Only listing: it is its own max on sales/commission/discount; rating max floors at 5.
        let out = score(vec![rec("1", 100, 0.1, 20.0, 4.0)], 50, &TrendWeights::default());
        assert_eq!(out.len(), 1);
        let b = out[0].score_breakdown;
        assert_eq!(b.sales, 1.0);
        assert_eq!(b.commission, 1.0);
        assert!((b.price_value - (0.7 + 0.3 * 0.8)).abs() < 1e-9);
        // 0.6 + 0.2 + 0.2 * 0.94 = 0.988
        assert_eq!(out[0].hot_score, 98.8);
    }

    #[test]
    fn below_min_sales_are_dropped_and_do_not_affect_maxima() {
        let recs = vec![rec("big-but-filtered", 40, 0.5, 0.0, 0.0), rec("a", 60, 0.05, 0.0, 0.0)];
        let out = score(recs, 50, &TrendWeights::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].listing.id(), Some("a"));
        assert_eq!(out[0].score_breakdown.commission, 1.0);
    }

    #[test]
    fn all_zero_inputs_do_not_divide_by_zero() {
        let out = score(vec![rec("z", 0, 0.0, 0.0, 0.0)], 0, &TrendWeights::default());
        assert_eq!(out[0].hot_score, 0.0);
        assert_eq!(out[0].score_breakdown, ScoreBreakdown::default());
    }

    #[test]
    fn oversized_weights_stay_in_range() {
        let w = TrendWeights {
            recent: 3.0,
            commission: 3.0,
            price_value: 3.0,
        };
        let out = score(vec![rec("1", 100, 0.1, 10.0, 5.0)], 50, &w);
        assert_eq!(out[0].hot_score, 100.0);
    }

    #[test]
    fn hot_score_is_rounded_to_two_decimals() {
        let recs = vec![rec("a", 300, 0.0, 0.0, 0.0), rec("b", 100, 0.0, 0.0, 0.0)];
        let out = score(recs, 50, &TrendWeights::default());
        // 0.6 * 100/300 = 0.2 → 20.0
        assert_eq!(out[1].hot_score, 20.0);
        let w = TrendWeights {
            recent: 1.0,
            commission: 0.0,
            price_value: 0.0,
        };
        let recs = vec![rec("a", 300, 0.0, 0.0, 0.0), rec("b", 100, 0.0, 0.0, 0.0)];
        let out = score(recs, 50, &w);
        assert_eq!(out[1].hot_score, 33.33);
    }

    #[test]
    fn weights_validation() {
        assert!(TrendWeights::default().is_valid());
        let bad = TrendWeights {
            recent: f64::NAN,
            ..TrendWeights::default()
        };
        assert!(!bad.is_valid());
        let neg = TrendWeights {
            commission: -0.1,
            ..TrendWeights::default()
        };
        assert!(!neg.is_valid());
    }

    #[test]
    fn weights_accept_partial_json() {
        let w: TrendWeights = serde_json::from_str(r#"{"recent": 1.0}"#).unwrap();
        assert_eq!(w.recent, 1.0);
        assert_eq!(w.commission, 0.2);
        let w: TrendWeights = serde_json::from_str(r#"{"priceValue": 0.5}"#).unwrap();
        assert_eq!(w.price_value, 0.5);
    }
}
