// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// A numeric field as the upstream sends it.
///
/// The search API is inconsistent: the same field arrives as a JSON number in
/// one response and as a string (`"0.07"`, `"1234"`) in the next. Anything else
/// (bools, objects, `null`) is kept as `Other` and normalizes to zero. Numbers
/// stay `serde_json::Number` so integers go back out as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(Number),
    Text(String),
    Other(Value),
}

impl From<f64> for LooseNumber {
    fn from(v: f64) -> Self {
        Number::from_f64(v)
            .map(LooseNumber::Number)
            .unwrap_or(LooseNumber::Other(Value::Null))
    }
}

impl From<u64> for LooseNumber {
    fn from(v: u64) -> Self {
        LooseNumber::Number(v.into())
    }
}

impl From<&str> for LooseNumber {
    fn from(v: &str) -> Self {
        LooseNumber::Text(v.to_string())
    }
}

/// Listing identifier: the value exactly as received plus the key used for
/// dedup and existence checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemId {
    raw: Value,
    key: Option<String>,
}

impl ItemId {
    /// Trimmed string form; `None` for blank strings and non-scalar values.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl From<Value> for ItemId {
    fn from(raw: Value) -> Self {
        let key = id_from_value(&raw);
        Self { raw, key }
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Value::String(s).into()
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Value::from(s).into()
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        Value::from(n).into()
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ItemId::from)
    }
}

/// One candidate product as returned by an upstream search.
///
/// Read-only once fetched: serializing a record gives back the upstream
/// fields with their original JSON types, absent fields stay absent and
/// fields this type does not know about ride along in `extra`. Numeric fields
/// are coerced only in `crate::normalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "de_loose", skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<LooseNumber>,
    #[serde(default, deserialize_with = "de_loose", skip_serializing_if = "Option::is_none")]
    pub sales: Option<LooseNumber>,
    #[serde(default, deserialize_with = "de_loose", skip_serializing_if = "Option::is_none")]
    pub price_min: Option<LooseNumber>,
    #[serde(default, deserialize_with = "de_loose", skip_serializing_if = "Option::is_none")]
    pub price_max: Option<LooseNumber>,
    #[serde(default, deserialize_with = "de_loose", skip_serializing_if = "Option::is_none")]
    pub rating_star: Option<LooseNumber>,
    #[serde(default, deserialize_with = "de_loose", skip_serializing_if = "Option::is_none")]
    pub price_discount_rate: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_cat_ids: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListingRecord {
    pub fn new(item_id: impl Into<ItemId>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            ..Self::default()
        }
    }

    /// Identifier used for dedup and existence checks (trimmed, never empty).
    pub fn id(&self) -> Option<&str> {
        self.item_id.as_ref().and_then(ItemId::key)
    }

    /// Category ids as strings; non-scalar entries are skipped.
    pub fn category_ids(&self) -> Vec<String> {
        match &self.product_cat_ids {
            Some(Value::Array(items)) => items.iter().filter_map(id_from_value).collect(),
            Some(other) => id_from_value(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_sales(mut self, sales: impl Into<LooseNumber>) -> Self {
        self.sales = Some(sales.into());
        self
    }

    pub fn with_commission(mut self, rate: impl Into<LooseNumber>) -> Self {
        self.commission_rate = Some(rate.into());
        self
    }

    pub fn with_discount(mut self, rate: impl Into<LooseNumber>) -> Self {
        self.price_discount_rate = Some(rate.into());
        self
    }

    pub fn with_rating(mut self, stars: impl Into<LooseNumber>) -> Self {
        self.rating_star = Some(stars.into());
        self
    }

    pub fn with_price(mut self, min: impl Into<LooseNumber>, max: impl Into<LooseNumber>) -> Self {
        self.price_min = Some(min.into());
        self.price_max = Some(max.into());
        self
    }
}

fn id_from_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// A present `null` stays `Some(Other(Null))` so it is echoed back as `null`.
fn de_loose<'de, D>(deserializer: D) -> Result<Option<LooseNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    LooseNumber::deserialize(deserializer).map(Some)
}

/// Ordering requested from the upstream search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPreference {
    Relevance,
    SalesDesc,
    PriceDesc,
    PriceAsc,
    CommissionDesc,
}

impl SortPreference {
    /// `sortType` code understood by the upstream `productOfferV2` query.
    pub fn sort_type(self) -> i32 {
        match self {
            SortPreference::Relevance => 1,
            SortPreference::SalesDesc => 2,
            SortPreference::PriceDesc => 3,
            SortPreference::PriceAsc => 4,
            SortPreference::CommissionDesc => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryTarget {
    Keyword(String),
    Category(String),
}

impl QueryTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryTarget::Keyword(_) => "keyword",
            QueryTarget::Category(_) => "category",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            QueryTarget::Keyword(s) | QueryTarget::Category(s) => s,
        }
    }
}

/// One upstream query: what to search, how to sort, how many to ask for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuerySpec {
    pub target: QueryTarget,
    pub sort: SortPreference,
    pub limit: usize,
}

impl QuerySpec {
    pub fn keyword(keyword: &str, sort: SortPreference, limit: usize) -> Self {
        Self {
            target: QueryTarget::Keyword(keyword.to_string()),
            sort,
            limit,
        }
    }

    pub fn category(category_id: &str, sort: SortPreference, limit: usize) -> Self {
        Self {
            target: QueryTarget::Category(category_id.to_string()),
            sort,
            limit,
        }
    }
}

/// Upstream product search. Implementations may fail per call; the dispatcher
/// isolates those failures.
#[async_trait::async_trait]
pub trait ProductSource: Send + Sync {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>>;

    async fn search_by_category(
        &self,
        category_id: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>>;

    fn name(&self) -> &'static str;

    /// Run a planned query against the matching search method.
    async fn search(&self, query: &QuerySpec) -> Result<Vec<ListingRecord>> {
        match &query.target {
            QueryTarget::Keyword(k) => self.search_by_keyword(k, query.sort, query.limit).await,
            QueryTarget::Category(c) => self.search_by_category(c, query.sort, query.limit).await,
        }
    }
}
