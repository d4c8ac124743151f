// tests/ingest_dispatch.rs
//
// Source dispatcher: ordering, per-source limits, failure/timeout isolation
// and concurrent fan-out.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use trending_aggregator::ingest::dispatch;
use trending_aggregator::ingest::types::{ListingRecord, ProductSource, SortPreference};
use trending_aggregator::ingest::SourceStatus;

#[derive(Clone)]
enum Reply {
    Records(Vec<ListingRecord>),
    Delayed(Duration, Vec<ListingRecord>),
    Fail(&'static str),
    Hang,
}

#[derive(Default)]
struct ScriptedSource {
    replies: HashMap<(&'static str, String), Reply>,
    seen: Mutex<Vec<(&'static str, String, usize, SortPreference)>>,
}

impl ScriptedSource {
    fn on(mut self, kind: &'static str, target: &str, reply: Reply) -> Self {
        self.replies.insert((kind, target.to_string()), reply);
        self
    }

    fn seen(&self) -> Vec<(&'static str, String, usize, SortPreference)> {
        self.seen.lock().unwrap().clone()
    }

    async fn reply(
        &self,
        kind: &'static str,
        target: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        self.seen
            .lock()
            .unwrap()
            .push((kind, target.to_string(), limit, sort));
        let reply = self.replies.get(&(kind, target.to_string())).cloned();
        match reply {
            Some(Reply::Records(v)) => Ok(v),
            Some(Reply::Delayed(d, v)) => {
                tokio::time::sleep(d).await;
                Ok(v)
            }
            Some(Reply::Fail(msg)) => Err(anyhow!(msg)),
            Some(Reply::Hang) => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl ProductSource for ScriptedSource {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        self.reply("keyword", keyword, sort, limit).await
    }

    async fn search_by_category(
        &self,
        category_id: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        self.reply("category", category_id, sort, limit).await
    }

    fn name(&self) -> &'static str {
        "Scripted"
    }
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn ids(v: &[ListingRecord]) -> Vec<&str> {
    v.iter().filter_map(|r| r.id()).collect()
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn keyword_results_come_before_category_results_regardless_of_speed() {
    let src = ScriptedSource::default()
        .on(
            "keyword",
            "slow",
            Reply::Delayed(Duration::from_millis(60), vec![ListingRecord::new("k1")]),
        )
        .on("keyword", "fast", Reply::Records(vec![ListingRecord::new("k2")]))
        .on("category", "100", Reply::Records(vec![ListingRecord::new("c1")]));

    let out = dispatch(&src, &strings(&["slow", "fast"]), &strings(&["100"]), 40, TIMEOUT).await;

    assert_eq!(ids(&out.records), vec!["k1", "k2", "c1"]);
    let targets: Vec<_> = out.reports.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["slow", "fast", "100"]);
}

#[tokio::test]
async fn categories_get_half_the_limit_and_sales_sort() {
    let src = ScriptedSource::default();
    dispatch(&src, &strings(&["fone"]), &strings(&["100", "200"]), 40, TIMEOUT).await;

    let mut seen = src.seen();
    seen.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(seen.len(), 3);
    for (kind, _target, limit, sort) in &seen {
        assert_eq!(*sort, SortPreference::SalesDesc);
        match *kind {
            "keyword" => assert_eq!(*limit, 40),
            _ => assert_eq!(*limit, 20),
        }
    }
}

#[tokio::test]
async fn blank_keywords_are_not_queried() {
    let src = ScriptedSource::default();
    let out = dispatch(&src, &strings(&["", "   ", "ok"]), &[], 10, TIMEOUT).await;
    assert_eq!(src.seen().len(), 1);
    assert_eq!(out.reports.len(), 1);
}

#[tokio::test]
async fn failing_source_contributes_nothing_and_is_reported() {
    let src = ScriptedSource::default()
        .on("keyword", "bad", Reply::Fail("upstream 502"))
        .on("keyword", "good", Reply::Records(vec![ListingRecord::new("g1")]))
        .on("category", "7", Reply::Records(vec![ListingRecord::new("c7")]));

    let out = dispatch(&src, &strings(&["bad", "good"]), &strings(&["7"]), 40, TIMEOUT).await;

    assert_eq!(ids(&out.records), vec!["g1", "c7"]);
    assert_eq!(out.failed_sources(), 1);
    match &out.reports[0].status {
        SourceStatus::Failed { error } => assert!(error.contains("upstream 502")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(out.reports[1].is_ok());
    assert_eq!(out.reports[1].records, 1);
}

#[tokio::test]
async fn hanging_source_times_out_without_blocking_others() {
    let src = ScriptedSource::default()
        .on("keyword", "stuck", Reply::Hang)
        .on("keyword", "fine", Reply::Records(vec![ListingRecord::new("f1")]));

    let t0 = Instant::now();
    let out = dispatch(
        &src,
        &strings(&["stuck", "fine"]),
        &[],
        40,
        Duration::from_millis(80),
    )
    .await;

    assert!(t0.elapsed() < Duration::from_secs(2));
    assert_eq!(ids(&out.records), vec!["f1"]);
    assert_eq!(out.reports[0].status, SourceStatus::TimedOut);
    assert_eq!(out.reports[0].records, 0);
}

#[tokio::test]
async fn sources_are_queried_concurrently() {
    let delay = Duration::from_millis(150);
    let src = ScriptedSource::default()
        .on("keyword", "a", Reply::Delayed(delay, vec![ListingRecord::new("1")]))
        .on("keyword", "b", Reply::Delayed(delay, vec![ListingRecord::new("2")]))
        .on("category", "c", Reply::Delayed(delay, vec![ListingRecord::new("3")]));

    let t0 = Instant::now();
    let out = dispatch(&src, &strings(&["a", "b"]), &strings(&["c"]), 40, TIMEOUT).await;
    let elapsed = t0.elapsed();

    assert_eq!(out.records.len(), 3);
    // Sequential would take ~450ms.
    assert!(elapsed < Duration::from_millis(400), "took {elapsed:?}");
}

#[tokio::test]
async fn no_inputs_no_calls() {
    let src = ScriptedSource::default();
    let out = dispatch(&src, &[], &[], 40, TIMEOUT).await;
    assert!(out.records.is_empty());
    assert!(out.reports.is_empty());
    assert!(src.seen().is_empty());
}
