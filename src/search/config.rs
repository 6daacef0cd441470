//! Search backend configuration.
//!
//! Resolved like [`AgentConfig`](crate::agent::AgentConfig): explicit
//! values → environment variables → defaults.

use std::time::Duration;

use crate::error::SearchError;

/// Default Azure AI Search REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-07-01";
/// Default semantic configuration name.
pub const DEFAULT_SEMANTIC_CONFIG: &str = "legal-semantic";
/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-004";
/// Default embedding dimensions (must match the index's vector field).
pub const DEFAULT_EMBED_DIM: u32 = 768;
/// Name of the vector field in the index.
pub const VECTOR_FIELD: &str = "content_vector";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`AzureSearchClient`](super::AzureSearchClient).
#[derive(Clone)]
pub struct SearchConfig {
    /// Service endpoint, e.g. `https://<name>.search.windows.net`.
    pub endpoint: String,
    /// Index name.
    pub index: String,
    /// Query or admin key.
    pub api_key: String,
    /// REST API version.
    pub api_version: String,
    /// Enable semantic reranking on free-text search.
    pub use_semantic_ranker: bool,
    /// Semantic configuration name in the index.
    pub semantic_config: String,
    /// Embedding model used for query vectors.
    pub embed_model: String,
    /// Embedding dimensions requested from the model.
    pub embed_dim: u32,
    /// HTTP timeout for every search request.
    pub timeout: Duration,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("endpoint", &self.endpoint)
            .field("index", &self.index)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("use_semantic_ranker", &self.use_semantic_ranker)
            .field("semantic_config", &self.semantic_config)
            .field("embed_model", &self.embed_model)
            .field("embed_dim", &self.embed_dim)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SearchConfig {
    /// Creates a new builder for `SearchConfig`.
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if endpoint, index or key is missing.
    pub fn from_env() -> Result<Self, SearchError> {
        Self::builder().from_env().build()
    }

    /// URL of the index's `docs/search` endpoint.
    #[must_use]
    pub fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.index,
            self.api_version
        )
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    endpoint: Option<String>,
    index: Option<String>,
    api_key: Option<String>,
    api_version: Option<String>,
    use_semantic_ranker: Option<bool>,
    semantic_config: Option<String>,
    embed_model: Option<String>,
    embed_dim: Option<u32>,
    timeout: Option<Duration>,
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl SearchConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.endpoint.is_none() {
            self.endpoint = std::env::var("AZURE_SEARCH_ENDPOINT").ok();
        }
        if self.index.is_none() {
            self.index = std::env::var("AZURE_SEARCH_INDEX").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("AZURE_SEARCH_API_KEY").ok();
        }
        if self.api_version.is_none() {
            self.api_version = std::env::var("AZURE_SEARCH_API_VERSION").ok();
        }
        if self.use_semantic_ranker.is_none() {
            self.use_semantic_ranker = env_bool("USE_SEMANTIC_RANKER");
        }
        if self.semantic_config.is_none() {
            self.semantic_config = std::env::var("SEMANTIC_CONFIG_NAME").ok();
        }
        if self.embed_model.is_none() {
            self.embed_model = std::env::var("GEMINI_EMBED_MODEL").ok();
        }
        if self.embed_dim.is_none() {
            self.embed_dim = std::env::var("EMBED_DIM")
                .ok()
                .and_then(|v| v.trim().parse().ok());
        }
        self
    }

    /// Sets the service endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the index name.
    #[must_use]
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the REST API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Enables or disables semantic reranking.
    #[must_use]
    pub const fn use_semantic_ranker(mut self, enabled: bool) -> Self {
        self.use_semantic_ranker = Some(enabled);
        self
    }

    /// Sets the semantic configuration name.
    #[must_use]
    pub fn semantic_config(mut self, name: impl Into<String>) -> Self {
        self.semantic_config = Some(name.into());
        self
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = Some(model.into());
        self
    }

    /// Sets the embedding dimensions.
    #[must_use]
    pub const fn embed_dim(mut self, dim: u32) -> Self {
        self.embed_dim = Some(dim);
        self
    }

    /// Sets the HTTP timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`SearchConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] naming the first missing setting.
    pub fn build(self) -> Result<SearchConfig, SearchError> {
        fn required(value: Option<String>, var: &str) -> Result<String, SearchError> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| SearchError::Config(format!("{var} is not set")))
        }

        Ok(SearchConfig {
            endpoint: required(self.endpoint, "AZURE_SEARCH_ENDPOINT")?,
            index: required(self.index, "AZURE_SEARCH_INDEX")?,
            api_key: required(self.api_key, "AZURE_SEARCH_API_KEY")?,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            use_semantic_ranker: self.use_semantic_ranker.unwrap_or(true),
            semantic_config: self
                .semantic_config
                .unwrap_or_else(|| DEFAULT_SEMANTIC_CONFIG.to_string()),
            embed_model: self
                .embed_model
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            embed_dim: self.embed_dim.unwrap_or(DEFAULT_EMBED_DIM),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SearchConfigBuilder {
        SearchConfig::builder()
            .endpoint("https://legal.search.windows.net/")
            .index("casos")
            .api_key("secret")
    }

    #[test]
    fn test_builder_defaults() {
        let config = base().build().unwrap_or_else(|_| unreachable!());
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert!(config.use_semantic_ranker);
        assert_eq!(config.semantic_config, DEFAULT_SEMANTIC_CONFIG);
        assert_eq!(config.embed_dim, DEFAULT_EMBED_DIM);
    }

    #[test]
    fn test_builder_missing_endpoint() {
        let result = SearchConfig::builder().index("x").api_key("k").build();
        assert!(
            matches!(result, Err(SearchError::Config(ref m)) if m.contains("AZURE_SEARCH_ENDPOINT"))
        );
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        let config = base().build().unwrap_or_else(|_| unreachable!());
        assert_eq!(
            config.search_url(),
            "https://legal.search.windows.net/indexes/casos/docs/search?api-version=2024-07-01"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = base().build().unwrap_or_else(|_| unreachable!());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }
}
