use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::ingest::types::{ListingRecord, ProductSource, SortPreference};

const OFFER_FIELDS: &str = "nodes { productName itemId commissionRate sales imageUrl shopName offerLink priceMin priceMax ratingStar priceDiscountRate productCatIds }";

fn keyword_query() -> String {
    format!(
        "query SearchProducts($keyword: String!, $sortType: Int!, $limit: Int!) {{ productOfferV2(keyword: $keyword, sortType: $sortType, limit: $limit) {{ {OFFER_FIELDS} }} }}"
    )
}

fn category_query() -> String {
    format!(
        "query ProductsByCategory($categoryId: String!, $sortType: Int!, $limit: Int!) {{ productOfferV2(categoryId: $categoryId, sortType: $sortType, limit: $limit) {{ {OFFER_FIELDS} }} }}"
    )
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<OfferData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct OfferData {
    #[serde(rename = "productOfferV2")]
    product_offer_v2: Option<OfferPage>,
}

#[derive(Debug, Deserialize)]
struct OfferPage {
    #[serde(default)]
    nodes: Vec<ListingRecord>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

/// Extract listings from a `productOfferV2` response body.
///
/// GraphQL-level errors are reported as `Err`; a response without the offer
/// page is an empty result.
pub fn parse_offer_nodes(body: &str) -> Result<Vec<ListingRecord>> {
    let resp: GraphqlResponse = serde_json::from_str(body).context("parsing productOfferV2 json")?;
    if !resp.errors.is_empty() {
        let msgs: Vec<&str> = resp.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(anyhow!("upstream graphql errors: {}", msgs.join("; ")));
    }
    Ok(resp
        .data
        .and_then(|d| d.product_offer_v2)
        .map(|p| p.nodes)
        .unwrap_or_default())
}

/// Product search over the upstream GraphQL endpoint.
///
/// Requests go out unsigned; deployments that need signing put an
/// authenticating gateway at `endpoint`.
pub struct HttpProductSource {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpProductSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building upstream http client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    async fn post(&self, query: String, variables: serde_json::Value) -> Result<Vec<ListingRecord>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("upstream http post()")?
            .error_for_status()
            .context("upstream http status")?;
        let body = resp.text().await.context("upstream http .text()")?;
        parse_offer_nodes(&body)
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    async fn search_by_keyword(
        &self,
        keyword: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        let vars = json!({ "keyword": keyword, "sortType": sort.sort_type(), "limit": limit });
        self.post(keyword_query(), vars).await
    }

    async fn search_by_category(
        &self,
        category_id: &str,
        sort: SortPreference,
        limit: usize,
    ) -> Result<Vec<ListingRecord>> {
        let vars = json!({ "categoryId": category_id, "sortType": sort.sort_type(), "limit": limit });
        self.post(category_query(), vars).await
    }

    fn name(&self) -> &'static str {
        "GraphqlOffers"
    }
}
