// src/ingest/cache.rs
//! Caller-owned response cache for a `ProductSource`.
//!
//! Entries are keyed by the full query (target, sort, limit), expire after a
//! fixed TTL (no sliding refresh) and the map never holds more than `capacity`
//! entries: the oldest entry is evicted first. Only successful responses are
//! stored.

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::ingest::types::{ListingRecord, ProductSource, QuerySpec, SortPreference};

struct CacheEntry {
    stored_at: Instant,
    records: Vec<ListingRecord>,
}

pub struct CachedProductSource {
    inner: Arc<dyn ProductSource>,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<QuerySpec, CacheEntry>>,
}

impl CachedProductSource {
    pub fn new(inner: Arc<dyn ProductSource>, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QuerySpec, CacheEntry>> {
        match self.entries.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn lookup(&self, query: &QuerySpec) -> Option<Vec<ListingRecord>> {
        let mut map = self.lock();
        match map.get(query) {
            Some(e) if e.stored_at.elapsed() < self.ttl => Some(e.records.clone()),
            Some(_) => {
                map.remove(query);
                None
            }
            None => None,
        }
    }

    fn store(&self, query: QuerySpec, records: Vec<ListingRecord>) {
        if self.capacity == 0 || self.ttl.is_zero() {
            return;
        }
        let mut map = self.lock();
        let ttl = self.ttl;
        map.retain(|_, e| e.stored_at.elapsed() < ttl);

        while map.len() >= self.capacity && !map.contains_key(&query) {
            let oldest = map
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    map.remove(&k);
                }
                None => break,
            }
        }
        map.insert(
            query,
            CacheEntry {
                stored_at: Instant::now(),
                records,
            },
        );
    }

    async fn cached(&self, query: QuerySpec) -> Result<Vec<ListingRecord>> {
        if let Some(hit) = self.lookup(&query) {
            counter!("trending_cache_hits_total").increment(1);
            tracing::debug!(target: "trending", kind = query.target.kind(), target = query.target.value(), "cache hit");
            return Ok(hit);
        }
        counter!("trending_cache_misses_total").increment(1);
        let records = self.inner.search(&query).await?;
        self.store(query, records.clone());
        Ok(records)
    }
}

#[async_trait]
impl ProductSource for CachedProductSource {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        self.cached(QuerySpec::keyword(keyword, sort, limit)).await
    }

    async fn search_by_category(
        &self,
        category_id: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        self.cached(QuerySpec::category(category_id, sort, limit))
            .await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
