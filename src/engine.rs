//! # Aggregation Engine
//! Runs one trending aggregation: dispatch → dedup → existence filter → score →
//! rank → metadata. Request-scoped; nothing is shared between calls except the
//! collaborators passed in.
//!
//! Policy: only invalid parameters fail the call. A failing source contributes
//! nothing; a failing existence check skips the filter stage.

use metrics::counter;
use serde::Deserialize;
use std::time::Duration;

use crate::analyze::{rank, score, TrendWeights, DEFAULT_FINAL_LIMIT, DEFAULT_MIN_SALES};
use crate::catalog::ExistenceOracle;
use crate::dedup::{candidate_ids, dedupe, filter_existing};
use crate::error::AggregateError;
use crate::ingest::{dispatch, types::ProductSource};
use crate::report::{summarize, AggregationResult};

pub const DEFAULT_PER_SOURCE_LIMIT: usize = 40;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

fn default_min_sales() -> i64 {
    DEFAULT_MIN_SALES as i64
}
fn default_limit_per_search() -> i64 {
    DEFAULT_PER_SOURCE_LIMIT as i64
}
fn default_limit() -> i64 {
    DEFAULT_FINAL_LIMIT as i64
}
fn default_true() -> bool {
    true
}

/// Request body of `POST /api/trending`. Integers are signed so that negative
/// values reach validation instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default = "default_min_sales")]
    pub min_sales: i64,
    #[serde(default = "default_limit_per_search")]
    pub limit_per_search: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_true")]
    pub exclude_existing: bool,
    #[serde(default)]
    pub weights: Option<TrendWeights>,
}

impl Default for TrendingRequest {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            category_ids: Vec::new(),
            min_sales: default_min_sales(),
            limit_per_search: default_limit_per_search(),
            limit: default_limit(),
            exclude_existing: true,
            weights: None,
        }
    }
}

impl TrendingRequest {
    pub fn new(keywords: &[&str], category_ids: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            category_ids: category_ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Knobs owned by the service rather than the caller.
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub source_timeout: Duration,
    /// Used when the request carries no weights.
    pub default_weights: TrendWeights,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            default_weights: TrendWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Params {
    min_sales: u64,
    per_source_limit: usize,
    final_limit: usize,
    weights: TrendWeights,
}

fn non_negative(name: &'static str, v: i64) -> Result<u64, AggregateError> {
    u64::try_from(v).map_err(|_| AggregateError::invalid(name, format!("must be >= 0, got {v}")))
}

fn validate(req: &TrendingRequest, opts: &AggregatorOptions) -> Result<Params, AggregateError> {
    let min_sales = non_negative("minSales", req.min_sales)?;
    let per_source_limit = non_negative("limitPerSearch", req.limit_per_search)? as usize;
    let final_limit = non_negative("limit", req.limit)? as usize;
    let weights = req.weights.unwrap_or(opts.default_weights);
    if !weights.is_valid() {
        return Err(AggregateError::invalid(
            "weights",
            "every weight must be finite and >= 0",
        ));
    }
    if opts.source_timeout.is_zero() {
        return Err(AggregateError::invalid("sourceTimeout", "must be > 0"));
    }
    Ok(Params {
        min_sales,
        per_source_limit,
        final_limit,
        weights,
    })
}

/// Compute the next trending candidate set.
pub async fn aggregate_trending(
    source: &dyn ProductSource,
    oracle: &dyn ExistenceOracle,
    req: &TrendingRequest,
    opts: &AggregatorOptions,
) -> Result<AggregationResult, AggregateError> {
    crate::metrics::ensure_metrics_described();
    let p = validate(req, opts)?;
    counter!("trending_requests_total").increment(1);

    // 1) Fan out to every keyword and category source
    let outcome = dispatch(
        source,
        &req.keywords,
        &req.category_ids,
        p.per_source_limit,
        opts.source_timeout,
    )
    .await;
    let failed_sources = outcome.failed_sources();
    let total_fetched = outcome.records.len();

    // 2) Unique by itemId, last occurrence wins
    let unique = dedupe(outcome.records);
    let unique_count = unique.len();
    let mut working: Vec<_> = unique.into_values().collect();

    // 3) Drop listings the caller already has
    if req.exclude_existing && !working.is_empty() {
        let ids = candidate_ids(&working);
        match oracle.existing_ids(&ids).await {
            Ok(exists) => {
                let before = working.len();
                working = filter_existing(working, &exists);
                tracing::debug!(target: "trending", removed = before - working.len(), "existing listings filtered");
            }
            Err(e) => {
                tracing::warn!(target: "trending", error = ?e, oracle = oracle.name(), "existence check failed; skipping filter");
                counter!("trending_oracle_errors_total").increment(1);
            }
        }
    }

    // 4) Score and rank
    let scored = score(working, p.min_sales, &p.weights);
    let products = rank(scored, p.final_limit);

    let metadata = summarize(
        total_fetched,
        unique_count,
        products.len(),
        &req.keywords,
        &req.category_ids,
    );

    tracing::info!(
        target: "trending",
        total = total_fetched,
        unique = unique_count,
        returned = products.len(),
        failed_sources,
        "trending aggregation done"
    );

    Ok(AggregationResult {
        products,
        metadata,
        sources: outcome.reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_match_documented_values() {
        let req: TrendingRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.min_sales, 50);
        assert_eq!(req.limit_per_search, 40);
        assert_eq!(req.limit, 20);
        assert!(req.exclude_existing);
        assert!(req.keywords.is_empty() && req.category_ids.is_empty());
    }

    #[test]
    fn request_reads_camel_case_body() {
        let req: TrendingRequest = serde_json::from_str(
            r#"{"keywords":["fone"],"categoryIds":["100"],"minSales":10,"limitPerSearch":8,"limit":3,"excludeExisting":false}"#,
        )
        .unwrap();
        assert_eq!(req.category_ids, vec!["100".to_string()]);
        assert_eq!(req.limit_per_search, 8);
        assert!(!req.exclude_existing);
    }

    #[test]
    fn negative_values_are_rejected() {
        let opts = AggregatorOptions::default();
        let req = TrendingRequest {
            limit: -1,
            ..TrendingRequest::default()
        };
        assert!(matches!(
            validate(&req, &opts),
            Err(AggregateError::InvalidParameter { name: "limit", .. })
        ));
        let req = TrendingRequest {
            limit_per_search: -5,
            ..TrendingRequest::default()
        };
        assert!(validate(&req, &opts).is_err());
        let req = TrendingRequest {
            min_sales: -1,
            ..TrendingRequest::default()
        };
        assert!(validate(&req, &opts).is_err());
    }

    #[test]
    fn request_weights_override_defaults() {
        let opts = AggregatorOptions::default();
        let w = TrendWeights {
            recent: 1.0,
            commission: 0.0,
            price_value: 0.0,
        };
        let req = TrendingRequest {
            weights: Some(w),
            ..TrendingRequest::default()
        };
        assert_eq!(validate(&req, &opts).unwrap().weights, w);
    }
}
