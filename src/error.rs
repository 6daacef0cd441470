//! Error types for legal-consultor.
//!
//! Each layer owns an error enum: [`AgentError`] for the model provider and
//! tool execution, [`SearchError`] for the search index and embeddings, and
//! [`CommandError`] for the CLI. [`Error`] unifies them for callers that
//! cross layers.

use thiserror::Error;

/// Convenience alias for results that use the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent / provider failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Search backend failure.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure (prompt files, stdin).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the language-model provider and the tool layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured for the model provider.
    #[error("API key missing: set GEMINI_API_KEY or LEGAL_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// The provider API call failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error detail from the SDK or transport.
        message: String,
    },

    /// A tool call could not be executed.
    #[error("tool `{name}` failed: {message}")]
    ToolExecution {
        /// Tool name requested by the model.
        name: String,
        /// What went wrong.
        message: String,
    },

    /// The incoming consultation request is invalid.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with it.
        message: String,
    },
}

/// Errors raised by the search index client and the embedder.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Required search configuration is missing or invalid.
    #[error("search configuration error: {0}")]
    Config(String),

    /// A filter field name or value cannot be expressed safely.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Transport-level HTTP failure (connect, timeout, TLS).
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The search service answered with a non-success status.
    #[error("search service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode search response: {0}")]
    Decode(String),

    /// Query embedding failed.
    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// A command-line argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}
