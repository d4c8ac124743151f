//! Record normalizer: the single place where loose upstream fields become numbers.
//!
//! Absent, non-numeric, negative and non-finite values all collapse to `0`.
//! Nothing here returns an error; a listing with garbage in a numeric field just
//! scores lower.

use crate::ingest::types::{ListingRecord, LooseNumber};

/// Typed view of a listing's numeric fields.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ListingMetrics {
    pub units_sold: u64,
    pub commission_rate: f64,
    pub discount_rate: f64,
    pub rating: f64,
    pub price_min: f64,
    pub price_max: f64,
}

/// Coerce a loose field to a non-negative finite float.
pub fn coerce_f64(v: Option<&LooseNumber>) -> f64 {
    let raw = match v {
        Some(LooseNumber::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(LooseNumber::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(LooseNumber::Other(_)) | None => 0.0,
    };
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}

/// Coerce a loose field to a whole count (fractional part truncated).
pub fn coerce_count(v: Option<&LooseNumber>) -> u64 {
    let f = coerce_f64(v);
    if f >= u64::MAX as f64 {
        u64::MAX
    } else {
        f.trunc() as u64
    }
}

pub fn normalize(rec: &ListingRecord) -> ListingMetrics {
    ListingMetrics {
        units_sold: coerce_count(rec.sales.as_ref()),
        commission_rate: coerce_f64(rec.commission_rate.as_ref()),
        discount_rate: coerce_f64(rec.price_discount_rate.as_ref()),
        rating: coerce_f64(rec.rating_star.as_ref()),
        price_min: coerce_f64(rec.price_min.as_ref()),
        price_max: coerce_f64(rec.price_max.as_ref()),
    }
}

impl From<&ListingRecord> for ListingMetrics {
    fn from(rec: &ListingRecord) -> Self {
        normalize(rec)
    }
}
