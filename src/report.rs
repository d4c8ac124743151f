//! Aggregation output: ranked listings plus summary metadata.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::analyze::ScoredListing;
use crate::ingest::SourceReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Listings returned by all sources together, before dedup.
    pub total_found: usize,
    pub unique_products: usize,
    pub trending_count: usize,
    pub keywords: Vec<String>,
    pub categories: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub products: Vec<ScoredListing>,
    pub metadata: Metadata,
    pub sources: Vec<SourceReport>,
}

pub fn summarize(
    total_fetched: usize,
    unique_count: usize,
    returned_count: usize,
    keywords: &[String],
    category_ids: &[String],
) -> Metadata {
    summarize_at(
        Utc::now(),
        total_fetched,
        unique_count,
        returned_count,
        keywords,
        category_ids,
    )
}

pub fn summarize_at(
    now: DateTime<Utc>,
    total_fetched: usize,
    unique_count: usize,
    returned_count: usize,
    keywords: &[String],
    category_ids: &[String],
) -> Metadata {
    Metadata {
        total_found: total_fetched,
        unique_products: unique_count,
        trending_count: returned_count,
        keywords: keywords.to_vec(),
        categories: category_ids.to_vec(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn echoes_inputs_and_counts() {
        let now = Utc.with_ymd_and_hms(2025, 3, 28, 12, 0, 0).unwrap();
        let m = summarize_at(now, 12, 9, 5, &["fone".into()], &["100".into()]);
        assert_eq!(m.total_found, 12);
        assert_eq!(m.unique_products, 9);
        assert_eq!(m.trending_count, 5);
        assert_eq!(m.keywords, vec!["fone".to_string()]);
        assert_eq!(m.categories, vec!["100".to_string()]);
        assert_eq!(m.timestamp, "2025-03-28T12:00:00.000Z");
    }

    #[test]
    fn serializes_camel_case() {
        let m = summarize(0, 0, 0, &[], &[]);
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["totalFound"], 0);
        assert_eq!(v["uniqueProducts"], 0);
        assert_eq!(v["trendingCount"], 0);
        assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
