//! # legal-consultor
//!
//! Conversational legal assistant. A tool-augmented language model searches
//! a case-law index (Azure AI Search) and answers in Spanish with a JSON
//! payload carrying the answer, citations, cited cases and a disclaimer.
//!
//! ## Layout
//!
//! - [`agent`]: the `agent → tools → final` loop, prompts, provider
//!   abstraction and answer normalization.
//! - [`search`]: the [`CaseSearch`](search::CaseSearch) seam and its Azure
//!   REST implementation.
//! - [`cli`]: the `legal-consultor` binary's commands.
//! - [`error`]: error types for every layer.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use legal_consultor::agent::{AgentConfig, ConsultRequest, LegalAssistant, PromptSet, create_provider};
//! use legal_consultor::search::{AzureSearchClient, OpenAiEmbedder, SearchConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let search_config = SearchConfig::from_env()?;
//! let embedder = OpenAiEmbedder::new(&config, &search_config)?;
//! let search = AzureSearchClient::new(search_config, Arc::new(embedder))?;
//!
//! let assistant = LegalAssistant::new(
//!     Arc::from(create_provider(&config)?),
//!     Arc::new(search),
//!     &config,
//!     &PromptSet::load(None),
//! );
//! let consultation = assistant.consult(&ConsultRequest::new("¿Qué es una tutela?")).await?;
//! let _json = consultation.reply();
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;
pub mod search;

pub use error::{Error, Result};
