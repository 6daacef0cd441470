//! Legal-assistant agent.
//!
//! A tool-augmented model loop that retrieves case law through
//! [`CaseSearch`](crate::search::CaseSearch) and returns a citation-backed
//! JSON answer. Uses a pluggable provider abstraction backed by
//! OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! ConsultRequest → LegalAssistant (blank / length checks, seed state)
//!   └── Orchestrator
//!         ├── Agent      AgentStep: model call with tools on payload_view(state)
//!         ├── Tools      ToolDispatcher: inject top_k / filters, run calls concurrently
//!         │               └── ToolExecutor → dyn CaseSearch
//!         └── Final      Finalizer: JSON-mode call, normalize → FinalAnswer
//! ```

pub mod answer;
pub mod assistant;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod finalizer;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod state;
pub mod step;
pub mod tool;
pub mod traits;

// Re-export key types
pub use answer::{CaseRef, Citation, FinalAnswer, normalize, render_reply};
pub use assistant::{ConsultRequest, Consultation, LegalAssistant, MAX_QUERY_LEN};
pub use client::create_provider;
pub use config::AgentConfig;
pub use dispatch::{ToolDispatcher, inject_session_params};
pub use executor::ToolExecutor;
pub use finalizer::Finalizer;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::{Node, Orchestrator, RunOutcome, route};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use state::{ConversationState, payload_view};
pub use step::AgentStep;
pub use tool::{ToolCall, ToolDefinition, ToolResult, ToolSet};
pub use traits::Agent;
