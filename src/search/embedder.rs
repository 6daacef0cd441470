//! Query embedding for the vector half of hybrid search.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;
use tracing::debug;

use crate::agent::AgentConfig;
use crate::error::SearchError;

use super::SearchConfig;

/// Turns query text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError>;
}

/// Embedder backed by an `OpenAI`-compatible `/embeddings` endpoint.
///
/// Shares credentials and base URL with the chat provider, so one Gemini
/// key drives both.
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: u32,
}

impl OpenAiEmbedder {
    /// Creates an embedder from the agent's credentials and the search
    /// configuration's model settings.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Embedding`] if the HTTP client cannot be built.
    pub fn new(agent: &AgentConfig, search: &SearchConfig) -> Result<Self, SearchError> {
        let config = OpenAIConfig::new()
            .with_api_key(&agent.api_key)
            .with_api_base(agent.base_url.trim_end_matches('/'));
        let http = reqwest::Client::builder()
            .timeout(search.timeout)
            .build()
            .map_err(|e| SearchError::Embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Client::with_config(config).with_http_client(http),
            model: search.embed_model.clone(),
            dimensions: search.embed_dim,
        })
    }
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .dimensions(self.dimensions)
            .build()
            .map_err(|e| SearchError::Embedding(e.to_string()))?;

        debug!(model = %self.model, chars = text.len(), "embedding query");

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| SearchError::Embedding(e.to_string()))?;

        let vector = response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| SearchError::Embedding("empty embedding response".to_string()))?;

        if vector.len() != self.dimensions as usize {
            return Err(SearchError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_embedder_uses_search_settings() {
        let agent = AgentConfig::builder()
            .api_key("k")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let search = SearchConfig::builder()
            .endpoint("https://x.search.windows.net")
            .index("casos")
            .api_key("s")
            .embed_dim(256)
            .build()
            .unwrap_or_else(|_| unreachable!());
        let embedder = OpenAiEmbedder::new(&agent, &search).unwrap_or_else(|_| unreachable!());
        assert_eq!(embedder.dimensions, 256);
        assert_eq!(embedder.model, "text-embedding-004");
    }
}
