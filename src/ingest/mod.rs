// src/ingest/mod.rs
pub mod cache;
pub mod providers;
pub mod types;

use futures::future::join_all;
use metrics::{counter, histogram};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::ingest::types::{ListingRecord, ProductSource, QuerySpec, SortPreference};

/// Upstream sort used for every trending query.
pub const TRENDING_SORT: SortPreference = SortPreference::SalesDesc;

/// How one source query ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Failed { error: String },
    TimedOut,
}

/// Per-source record of a dispatch, kept so failures are visible to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub kind: &'static str,
    pub target: String,
    pub limit: usize,
    pub records: usize,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        self.status == SourceStatus::Ok
    }
}

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Keyword results first (input order), then category results (input order).
    pub records: Vec<ListingRecord>,
    pub reports: Vec<SourceReport>,
}

impl DispatchOutcome {
    pub fn failed_sources(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_ok()).count()
    }
}

/// One query per non-blank keyword (full limit), then one per non-blank
/// category (half limit).
pub fn plan_queries(
    keywords: &[String],
    category_ids: &[String],
    per_source_limit: usize,
) -> Vec<QuerySpec> {
    let kw = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| QuerySpec::keyword(k, TRENDING_SORT, per_source_limit));
    let cats = category_ids
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| QuerySpec::category(c, TRENDING_SORT, per_source_limit / 2));
    kw.chain(cats).collect()
}

async fn run_query(
    source: &dyn ProductSource,
    query: QuerySpec,
    timeout: Duration,
) -> (Vec<ListingRecord>, SourceReport) {
    let t0 = Instant::now();
    let result = tokio::time::timeout(timeout, source.search(&query)).await;
    let elapsed_ms = t0.elapsed().as_millis() as u64;
    histogram!("trending_dispatch_ms").record(elapsed_ms as f64);

    let kind = query.target.kind();
    let target = query.target.value().to_string();
    let (records, status) = match result {
        Ok(Ok(v)) => {
            tracing::debug!(target: "trending", kind, %target, count = v.len(), elapsed_ms, "source ok");
            (v, SourceStatus::Ok)
        }
        Ok(Err(e)) => {
            tracing::warn!(target: "trending", error = ?e, provider = source.name(), kind, %target, "source error");
            counter!("trending_source_errors_total").increment(1);
            (Vec::new(), SourceStatus::Failed { error: format!("{e:#}") })
        }
        Err(_) => {
            tracing::warn!(target: "trending", provider = source.name(), kind, %target, ?timeout, "source timed out");
            counter!("trending_source_timeouts_total").increment(1);
            (Vec::new(), SourceStatus::TimedOut)
        }
    };

    let report = SourceReport {
        kind,
        target,
        limit: query.limit,
        records: records.len(),
        elapsed_ms,
        status,
    };
    (records, report)
}

/// Fan out one query per keyword and per category, concurrently.
///
/// Each query has its own timeout; a failed or timed-out query contributes no
/// records and never fails the dispatch. Dropping the returned future cancels
/// all in-flight queries.
pub async fn dispatch(
    source: &dyn ProductSource,
    keywords: &[String],
    category_ids: &[String],
    per_source_limit: usize,
    timeout: Duration,
) -> DispatchOutcome {
    let plan = plan_queries(keywords, category_ids, per_source_limit);
    if plan.is_empty() {
        return DispatchOutcome::default();
    }

    // join_all yields in plan order, not completion order.
    let results = join_all(plan.into_iter().map(|q| run_query(source, q, timeout))).await;

    let mut out = DispatchOutcome::default();
    for (mut records, report) in results {
        out.records.append(&mut records);
        out.reports.push(report);
    }
    out
}
