//! Deduplication and existence filtering of fetched listings.

use indexmap::IndexMap;
use metrics::counter;
use std::collections::HashSet;

use crate::ingest::types::ListingRecord;

/// Key listings by identifier; the last occurrence of an id replaces earlier ones.
///
/// Keys keep the position of their first occurrence, which is the processing
/// order the ranker falls back to on equal scores. Records without an id are
/// dropped.
pub fn dedupe(records: Vec<ListingRecord>) -> IndexMap<String, ListingRecord> {
    let mut unique: IndexMap<String, ListingRecord> = IndexMap::with_capacity(records.len());
    let mut dropped = 0usize;

    for rec in records {
        match rec.id().map(str::to_string) {
            Some(id) => {
                unique.insert(id, rec);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(target: "trending", dropped, "listings without itemId dropped");
        counter!("trending_dropped_records_total").increment(dropped as u64);
    }
    unique
}

/// Drop every listing whose id is in `exists`.
pub fn filter_existing(records: Vec<ListingRecord>, exists: &HashSet<String>) -> Vec<ListingRecord> {
    if exists.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.id().is_some_and(|id| !exists.contains(id)))
        .collect()
}

/// Identifiers of a deduped working set, as handed to the existence oracle.
pub fn candidate_ids(records: &[ListingRecord]) -> HashSet<String> {
    records
        .iter()
        .filter_map(|r| r.id().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_occurrence_wins() {
        let recs = vec![
            ListingRecord::new("123").with_commission(0.05),
            ListingRecord::new("9"),
            ListingRecord::new("123").with_commission(0.11),
        ];
        let out = dedupe(recs);
        assert_eq!(out.len(), 2);
        assert_eq!(out["123"].commission_rate, Some(crate::ingest::types::LooseNumber::from(0.11)));
        // first-seen position is kept
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["123", "9"]);
    }

    #[test]
    fn records_without_id_are_dropped() {
        let recs = vec![
            ListingRecord::default().with_name("ghost"),
            ListingRecord::new("1"),
        ];
        let out = dedupe(recs);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("1"));
    }

    #[test]
    fn dedupe_is_idempotent() {
        let recs = vec![
            ListingRecord::new("a").with_sales(1u64),
            ListingRecord::new("b"),
            ListingRecord::new("a").with_sales(2u64),
        ];
        let once = dedupe(recs);
        let twice = dedupe(once.values().cloned().collect());
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_existing_removes_known_ids() {
        let recs = vec![ListingRecord::new("1"), ListingRecord::new("2"), ListingRecord::new("3")];
        let exists: HashSet<String> = ["2".to_string()].into_iter().collect();
        let out = filter_existing(recs, &exists);
        let ids: Vec<_> = out.iter().filter_map(|r| r.id()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn candidate_ids_collects_each_id() {
        let recs = vec![ListingRecord::new("x"), ListingRecord::new("y")];
        let ids = candidate_ids(&recs);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("x") && ids.contains("y"));
    }
}
