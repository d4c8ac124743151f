use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("trending_requests_total", "Trending aggregations started.");
        describe_counter!(
            "trending_source_errors_total",
            "Keyword/category queries that failed."
        );
        describe_counter!(
            "trending_source_timeouts_total",
            "Keyword/category queries that hit their timeout."
        );
        describe_counter!(
            "trending_dropped_records_total",
            "Listings dropped at dedup for lacking an itemId."
        );
        describe_counter!(
            "trending_oracle_errors_total",
            "Existence checks that failed (filter skipped)."
        );
        describe_counter!("trending_cache_hits_total", "Upstream responses served from cache.");
        describe_counter!("trending_cache_misses_total", "Upstream queries not found in cache.");
        describe_histogram!("trending_dispatch_ms", "Per-source query time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
            .context("prometheus: install recorder")?
            .clone();
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
