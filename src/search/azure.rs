//! Azure AI Search REST client.
//!
//! Every operation is a `POST` to the index's `docs/search` endpoint.
//! Request bodies are built by pure functions so their shape can be tested
//! without a network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::error::SearchError;

use super::config::VECTOR_FIELD;
use super::filter::{FilterValue, build_filter, conjoin, eq_clause};
use super::{
    CaseDocument, CaseQuery, CaseSearch, Embedder, ProvidenceDocument, ProvidenceListQuery,
    ProvidenceListing, ProvidenceQuery, SearchConfig,
};

/// Fields returned by providence lookups (everything except the vector).
const PROVIDENCE_SELECT: &str = "id,title,content,source,date,year,relevance,tema_subtema_raw,temas";
/// Fields fetched for the per-ruling sample in listings.
const SAMPLE_SELECT: &str = "source,date,year,relevance,tema_subtema_raw";
/// Facet field that enumerates rulings.
const TITLE_FIELD: &str = "title";
/// Characters of an error body kept in [`SearchError::Status`].
const ERROR_BODY_CHARS: usize = 500;

/// [`CaseSearch`] over the Azure AI Search REST API.
pub struct AzureSearchClient {
    http: reqwest::Client,
    config: SearchConfig,
    embedder: Arc<dyn Embedder>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
    #[serde(rename = "@search.facets", default)]
    facets: HashMap<String, Vec<FacetBucket>>,
}

#[derive(Debug, Deserialize)]
struct FacetBucket {
    value: Value,
    #[serde(default)]
    count: u64,
}

impl AzureSearchClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig, embedder: Arc<dyn Embedder>) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            embedder,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    async fn post(&self, body: &Value) -> Result<SearchResponse, SearchError> {
        debug!(index = %self.config.index, body = %body, "search request");
        let response = self
            .http
            .post(self.config.search_url())
            .header("api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "search service error");
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))
    }
}

impl std::fmt::Debug for AzureSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSearchClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Body of a hybrid free-text query.
///
/// # Errors
///
/// Propagates filter rendering failures.
pub fn case_search_body(
    config: &SearchConfig,
    query: &CaseQuery,
    vector: &[f32],
) -> Result<Value, SearchError> {
    let mut body = json!({
        "search": query.query,
        "top": query.top_k,
        "vectorQueries": [{
            "kind": "vector",
            "vector": vector,
            "fields": VECTOR_FIELD,
            "k": query.top_k,
        }],
    });
    if let Some(filter) = build_filter(query.filters.as_ref())? {
        body["filter"] = Value::String(filter);
    }
    if config.use_semantic_ranker {
        body["queryType"] = json!("semantic");
        body["semanticConfiguration"] = json!(config.semantic_config);
        body["answers"] = json!("extractive");
        body["captions"] = json!("extractive");
    }
    Ok(body)
}

/// Body of an exact-ruling lookup.
///
/// # Errors
///
/// Propagates filter rendering failures.
pub fn providence_body(query: &ProvidenceQuery) -> Result<Value, SearchError> {
    let leading = eq_clause(TITLE_FIELD, &FilterValue::Text(query.providence.clone()))?;
    let filter = conjoin(leading, query.additional_filters.as_ref())?;
    Ok(json!({
        "search": "*",
        "filter": filter,
        "top": query.top_k,
        "select": PROVIDENCE_SELECT,
    }))
}

/// Filter built from a listing's source/year restriction.
fn listing_filter(query: &ProvidenceListQuery) -> Result<Option<String>, SearchError> {
    let mut clauses = Vec::new();
    if let Some(source) = query.source.as_ref().filter(|s| !s.is_empty()) {
        clauses.push(eq_clause("source", &FilterValue::Text(source.clone()))?);
    }
    if let Some(year) = query.year {
        clauses.push(eq_clause("year", &FilterValue::Integer(year))?);
    }
    Ok((!clauses.is_empty()).then(|| clauses.join(" and ")))
}

/// Body of the facet query that enumerates rulings.
///
/// # Errors
///
/// Propagates filter rendering failures.
pub fn facet_body(query: &ProvidenceListQuery) -> Result<Value, SearchError> {
    let mut body = json!({
        "search": "*",
        "top": 0,
        "facets": [format!("{TITLE_FIELD},count:{}", query.limit)],
    });
    if let Some(filter) = listing_filter(query)? {
        body["filter"] = Value::String(filter);
    }
    Ok(body)
}

fn sample_body(providence: &str, restriction: Option<&str>) -> Result<Value, SearchError> {
    let mut filter = eq_clause(TITLE_FIELD, &FilterValue::Text(providence.to_string()))?;
    if let Some(rest) = restriction {
        filter = format!("{filter} and {rest}");
    }
    Ok(json!({
        "search": "*",
        "filter": filter,
        "top": 1,
        "select": SAMPLE_SELECT,
    }))
}

fn text(doc: &Map<String, Value>, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn integer(doc: &Map<String, Value>, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            n.as_f64().map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(doc: &Map<String, Value>, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn strings(doc: &Map<String, Value>, key: &str) -> Vec<String> {
    match doc.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn search_score(doc: &Map<String, Value>) -> f64 {
    float(doc, "@search.score").unwrap_or(0.0).max(0.0)
}

fn decode_case(doc: &Map<String, Value>) -> Option<CaseDocument> {
    Some(CaseDocument {
        id: text(doc, "id")?,
        score: search_score(doc),
        title: text(doc, "title"),
        content: text(doc, "content"),
        source: text(doc, "source"),
        date: text(doc, "date"),
    })
}

fn decode_providence(doc: &Map<String, Value>) -> Option<ProvidenceDocument> {
    Some(ProvidenceDocument {
        id: text(doc, "id")?,
        title: text(doc, "title"),
        content: text(doc, "content"),
        source: text(doc, "source"),
        date: text(doc, "date"),
        year: integer(doc, "year"),
        relevance: float(doc, "relevance"),
        tema_subtema_raw: text(doc, "tema_subtema_raw"),
        temas: strings(doc, "temas"),
        search_score: search_score(doc),
    })
}

fn decode_all<T>(
    docs: &[Map<String, Value>],
    decode: impl Fn(&Map<String, Value>) -> Option<T>,
) -> Vec<T> {
    let decoded: Vec<T> = docs.iter().filter_map(decode).collect();
    if decoded.len() < docs.len() {
        warn!(
            skipped = docs.len() - decoded.len(),
            "search results without an id were skipped"
        );
    }
    decoded
}

#[async_trait]
impl CaseSearch for AzureSearchClient {
    async fn search_cases(&self, query: &CaseQuery) -> Result<Vec<CaseDocument>, SearchError> {
        let vector = self.embedder.embed(&query.query).await?;
        let body = case_search_body(&self.config, query, &vector)?;
        let response = self.post(&body).await?;
        let docs = decode_all(&response.value, decode_case);
        debug!(results = docs.len(), "search_cases");
        Ok(docs)
    }

    async fn search_by_providence(
        &self,
        query: &ProvidenceQuery,
    ) -> Result<Vec<ProvidenceDocument>, SearchError> {
        let body = providence_body(query)?;
        let response = self.post(&body).await?;
        let docs = decode_all(&response.value, decode_providence);
        debug!(providence = %query.providence, results = docs.len(), "search_by_providence");
        Ok(docs)
    }

    async fn list_providences(
        &self,
        query: &ProvidenceListQuery,
    ) -> Result<Vec<ProvidenceListing>, SearchError> {
        let restriction = listing_filter(query)?;
        let response = self.post(&facet_body(query)?).await?;
        let buckets = response
            .facets
            .get(TITLE_FIELD)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut listings = Vec::with_capacity(buckets.len().min(query.limit));
        for bucket in buckets.iter().take(query.limit) {
            let providence = match &bucket.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let sample = self
                .post(&sample_body(&providence, restriction.as_deref())?)
                .await?
                .value
                .into_iter()
                .next()
                .unwrap_or_default();
            listings.push(ProvidenceListing {
                providence,
                document_count: bucket.count,
                source: text(&sample, "source"),
                date: text(&sample, "date"),
                year: integer(&sample, "year"),
                relevance: float(&sample, "relevance"),
                tema_subtema: text(&sample, "tema_subtema_raw"),
            });
        }
        Ok(listings)
    }
}
