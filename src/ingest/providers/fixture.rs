use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::ingest::types::{ListingRecord, ProductSource, SortPreference};
use crate::normalize::normalize;

/// Fixture document shape:
/// `{"keywords": {"<keyword>": [listing...]}, "categories": {"<id>": [listing...]}}`
#[derive(Debug, Default, Deserialize)]
struct FixtureDoc {
    #[serde(default)]
    keywords: HashMap<String, Vec<ListingRecord>>,
    #[serde(default)]
    categories: HashMap<String, Vec<ListingRecord>>,
}

/// Serves canned search results from a JSON document. Used for local runs and tests.
pub struct FixtureProductSource {
    doc: FixtureDoc,
}

impl FixtureProductSource {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: FixtureDoc = serde_json::from_str(s).context("parsing listing fixtures")?;
        Ok(Self { doc })
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading listing fixtures from {}", path.display()))?;
        Self::from_json_str(&content)
    }

    fn lookup<'a>(
        table: &'a HashMap<String, Vec<ListingRecord>>,
        key: &str,
    ) -> &'a [ListingRecord] {
        let key = key.trim();
        table
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_slice())
            .unwrap_or_default()
    }
}

/// Apply the requested ordering and limit the way the upstream would.
fn sorted_page(items: &[ListingRecord], sort: SortPreference, limit: usize) -> Vec<ListingRecord> {
    let mut out: Vec<ListingRecord> = items.to_vec();
    match sort {
        SortPreference::Relevance => {}
        SortPreference::SalesDesc => {
            out.sort_by_key(|r| std::cmp::Reverse(normalize(r).units_sold));
        }
        SortPreference::PriceAsc => {
            out.sort_by(|a, b| normalize(a).price_min.total_cmp(&normalize(b).price_min));
        }
        SortPreference::PriceDesc => {
            out.sort_by(|a, b| normalize(b).price_min.total_cmp(&normalize(a).price_min));
        }
        SortPreference::CommissionDesc => {
            out.sort_by(|a, b| {
                normalize(b)
                    .commission_rate
                    .total_cmp(&normalize(a).commission_rate)
            });
        }
    }
    out.truncate(limit);
    out
}

#[async_trait]
impl ProductSource for FixtureProductSource {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        Ok(sorted_page(
            Self::lookup(&self.doc.keywords, keyword),
            sort,
            limit,
        ))
    }

    async fn search_by_category(
        &self,
        category_id: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        Ok(sorted_page(
            Self::lookup(&self.doc.categories, category_id),
            sort,
            limit,
        ))
    }

    fn name(&self) -> &'static str {
        "Fixture"
    }
}
