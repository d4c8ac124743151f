// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod catalog;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod report;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::engine::{aggregate_trending, AggregatorOptions, TrendingRequest};
pub use crate::error::AggregateError;
pub use crate::report::{AggregationResult, Metadata};

use anyhow::Result;
use axum::Router;
use std::sync::Arc;

use crate::analyze::weights::{start_hot_reload_thread, DEFAULT_RELOAD_POLL};
use crate::analyze::HotReloadWeights;
use crate::catalog::{ExistenceOracle, InMemoryCatalog};
use crate::config::{ServiceConfig, UpstreamConfig};
use crate::ingest::cache::CachedProductSource;
use crate::ingest::providers::{FixtureProductSource, HttpProductSource};
use crate::ingest::types::ProductSource;

/// Wire collaborators from config: upstream (behind the response cache),
/// existence catalog and hot-reload weights.
pub fn build_state(cfg: &ServiceConfig) -> Result<AppState> {
    let upstream: Arc<dyn ProductSource> = match &cfg.upstream {
        UpstreamConfig::Fixture { path } => Arc::new(FixtureProductSource::load_from_file(path)?),
        UpstreamConfig::Http { endpoint } => {
            Arc::new(HttpProductSource::new(endpoint.clone(), cfg.source_timeout())?)
        }
    };
    let source: Arc<dyn ProductSource> = if cfg.cache_ttl_secs > 0 && cfg.cache_capacity > 0 {
        Arc::new(CachedProductSource::new(
            upstream,
            cfg.cache_ttl(),
            cfg.cache_capacity,
        ))
    } else {
        upstream
    };

    let oracle: Arc<dyn ExistenceOracle> = match &cfg.known_ids_path {
        Some(p) => Arc::new(InMemoryCatalog::load_from_file(p)?),
        None => Arc::new(InMemoryCatalog::new()),
    };

    let weights = Arc::new(HotReloadWeights::new(Some(cfg.weights_path.as_path())));
    start_hot_reload_thread(&weights, DEFAULT_RELOAD_POLL);

    tracing::info!(
        target: "trending",
        upstream = source.name(),
        timeout_ms = cfg.source_timeout_ms,
        cache_ttl_secs = cfg.cache_ttl_secs,
        "collaborators ready"
    );

    Ok(AppState {
        source,
        oracle,
        weights,
        options: AggregatorOptions {
            source_timeout: cfg.source_timeout(),
            ..AggregatorOptions::default()
        },
    })
}

/// Build the full in-process app (API routes + `/metrics`) from a config.
pub fn app_with_config(cfg: &ServiceConfig) -> Result<Router> {
    let state = build_state(cfg)?;
    let metrics = crate::metrics::Metrics::init()?;
    Ok(create_router(state).merge(metrics.router()))
}

/// Build the app from `config/trending.toml` (or `$TRENDING_CONFIG_PATH`).
pub async fn app() -> Result<Router> {
    let cfg = ServiceConfig::load_default()?;
    app_with_config(&cfg)
}
