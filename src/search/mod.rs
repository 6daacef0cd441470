//! Case-law retrieval.
//!
//! The agent reaches the search index only through the [`CaseSearch`]
//! trait. [`AzureSearchClient`] implements it over the Azure AI Search REST
//! API, using an [`Embedder`] for the vector half of hybrid queries.
//!
//! # Architecture
//!
//! ```text
//! ToolExecutor
//!   └── dyn CaseSearch
//!         ├── search_cases        → hybrid (lexical + vector [+ semantic rerank])
//!         ├── search_by_providence → filter `title eq '<id>'` [+ extra filters]
//!         ├── providence_summary  → search_by_providence(top 100) + aggregation
//!         └── list_providences    → `title` facet + one sample per ruling
//! ```

pub mod azure;
pub mod config;
pub mod embedder;
pub mod filter;
pub mod summary;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

pub use azure::AzureSearchClient;
pub use config::SearchConfig;
pub use embedder::{Embedder, OpenAiEmbedder};
pub use filter::{FilterValue, Filters};
pub use summary::{ProvidenceSummary, summarize_providence};

/// Number of fragments fetched to build a providence summary.
pub const SUMMARY_FETCH_LIMIT: usize = 100;
/// Default number of rulings returned by `list_providences`.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Free-text hybrid query.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseQuery {
    /// Query text (also embedded for the vector half).
    pub query: String,
    /// Maximum results.
    pub top_k: usize,
    /// Optional equality filters.
    pub filters: Option<Filters>,
}

/// Exact lookup of one ruling's fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvidenceQuery {
    /// Ruling identifier, e.g. `T-123/2024`.
    pub providence: String,
    /// Maximum fragments.
    pub top_k: usize,
    /// Filters conjoined with the identifier match.
    pub additional_filters: Option<Filters>,
}

/// Parameters for listing distinct rulings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidenceListQuery {
    /// Maximum rulings.
    pub limit: usize,
    /// Restrict to one source.
    pub source: Option<String>,
    /// Restrict to one year.
    pub year: Option<i64>,
}

impl Default for ProvidenceListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            source: None,
            year: None,
        }
    }
}

/// A fragment returned by free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDocument {
    /// Document key.
    pub id: String,
    /// Backend relevance score (non-negative).
    pub score: f64,
    /// Ruling title / identifier.
    pub title: Option<String>,
    /// Fragment text.
    pub content: Option<String>,
    /// Source URL or collection.
    pub source: Option<String>,
    /// Decision date.
    pub date: Option<String>,
}

/// A fragment returned by providence lookup (every field except the vector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidenceDocument {
    /// Document key.
    pub id: String,
    /// Ruling identifier.
    pub title: Option<String>,
    /// Fragment text.
    pub content: Option<String>,
    /// Source URL or collection.
    pub source: Option<String>,
    /// Decision date.
    pub date: Option<String>,
    /// Decision year.
    pub year: Option<i64>,
    /// Editorial relevance score stored in the index.
    pub relevance: Option<f64>,
    /// Raw topic / subtopic tag text.
    pub tema_subtema_raw: Option<String>,
    /// Topic list.
    pub temas: Vec<String>,
    /// Backend search score.
    pub search_score: f64,
}

/// One distinct ruling in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidenceListing {
    /// Ruling identifier.
    pub providence: String,
    /// Number of indexed fragments.
    pub document_count: u64,
    /// Source of a sample fragment.
    pub source: Option<String>,
    /// Date of a sample fragment.
    pub date: Option<String>,
    /// Year of a sample fragment.
    pub year: Option<i64>,
    /// Relevance of a sample fragment.
    pub relevance: Option<f64>,
    /// Topic tag text of a sample fragment.
    pub tema_subtema: Option<String>,
}

/// Read-only access to the case-law index.
///
/// Implementations must be safe to share across concurrent consultations.
#[async_trait]
pub trait CaseSearch: Send + Sync {
    /// Hybrid free-text search.
    async fn search_cases(&self, query: &CaseQuery) -> Result<Vec<CaseDocument>, SearchError>;

    /// Every fragment of one ruling, filtered server-side.
    async fn search_by_providence(
        &self,
        query: &ProvidenceQuery,
    ) -> Result<Vec<ProvidenceDocument>, SearchError>;

    /// Distinct rulings with a sample of their metadata.
    async fn list_providences(
        &self,
        query: &ProvidenceListQuery,
    ) -> Result<Vec<ProvidenceListing>, SearchError>;

    /// Aggregate statistics for one ruling.
    async fn providence_summary(&self, providence: &str) -> Result<ProvidenceSummary, SearchError> {
        let documents = self
            .search_by_providence(&ProvidenceQuery {
                providence: providence.to_string(),
                top_k: SUMMARY_FETCH_LIMIT,
                additional_filters: None,
            })
            .await?;
        Ok(summarize_providence(providence, &documents))
    }
}
