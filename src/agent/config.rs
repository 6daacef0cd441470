//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";
/// Default session result-count limit.
pub const DEFAULT_TOP_K: usize = 6;
/// Default cap on `agent → tools → agent` rounds.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;

/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.2;
/// Default max tokens for the agent step.
const DEFAULT_AGENT_MAX_TOKENS: u32 = 1024;
/// Default max tokens for the finalization step. The JSON answer carries
/// citations as well as the text, so it gets more room.
const DEFAULT_FINAL_MAX_TOKENS: u32 = 2048;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai" for any OpenAI-compatible API).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model for the agent (tool-calling) step.
    pub chat_model: String,
    /// Model for the finalization step.
    pub final_model: String,
    /// Sampling temperature for both steps.
    pub temperature: f32,
    /// Maximum tokens for agent-step responses.
    pub agent_max_tokens: u32,
    /// Maximum tokens for the final JSON answer.
    pub final_max_tokens: u32,
    /// Request timeout applied to every provider call.
    pub timeout: Duration,
    /// Maximum `agent → tools` rounds before finalization is forced.
    pub max_tool_iterations: usize,
    /// Session result-count limit used when a request does not set one.
    pub default_top_k: usize,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    chat_model: Option<String>,
    final_model: Option<String>,
    temperature: Option<f32>,
    agent_max_tokens: Option<u32>,
    final_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    max_tool_iterations: Option<usize>,
    default_top_k: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("LEGAL_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("LEGAL_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("LEGAL_BASE_URL").ok();
        }
        if self.chat_model.is_none() {
            self.chat_model = std::env::var("GEMINI_CHAT_MODEL").ok();
        }
        if self.final_model.is_none() {
            self.final_model = std::env::var("LEGAL_FINAL_MODEL").ok();
        }
        if self.timeout.is_none() {
            self.timeout = env_parse("LEGAL_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.max_tool_iterations.is_none() {
            self.max_tool_iterations = env_parse("LEGAL_MAX_TOOL_ITERATIONS");
        }
        if self.default_top_k.is_none() {
            self.default_top_k = env_parse("LEGAL_DEFAULT_TOP_K");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("LEGAL_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the agent-step model.
    #[must_use]
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Sets the finalization model.
    #[must_use]
    pub fn final_model(mut self, model: impl Into<String>) -> Self {
        self.final_model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the agent-step max tokens.
    #[must_use]
    pub const fn agent_max_tokens(mut self, n: u32) -> Self {
        self.agent_max_tokens = Some(n);
        self
    }

    /// Sets the finalization max tokens.
    #[must_use]
    pub const fn final_max_tokens(mut self, n: u32) -> Self {
        self.final_max_tokens = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the maximum tool-calling rounds.
    #[must_use]
    pub const fn max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = Some(n);
        self
    }

    /// Sets the default session result-count limit.
    #[must_use]
    pub const fn default_top_k(mut self, n: usize) -> Self {
        self.default_top_k = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, and
    /// [`AgentError::InvalidRequest`] if the default `top_k` is zero.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let default_top_k = self.default_top_k.unwrap_or(DEFAULT_TOP_K);
        if default_top_k == 0 {
            return Err(AgentError::InvalidRequest {
                message: "default top_k must be a positive integer".to_string(),
            });
        }

        let chat_model = self
            .chat_model
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            final_model: self.final_model.unwrap_or_else(|| chat_model.clone()),
            chat_model,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            agent_max_tokens: self.agent_max_tokens.unwrap_or(DEFAULT_AGENT_MAX_TOKENS),
            final_max_tokens: self.final_max_tokens.unwrap_or(DEFAULT_FINAL_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_tool_iterations: self
                .max_tool_iterations
                .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS),
            default_top_k,
            prompt_dir: self.prompt_dir,
        })
    }
}
