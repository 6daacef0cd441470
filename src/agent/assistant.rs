//! Consultation entry point.
//!
//! Validates a chat request, seeds the conversation and runs the loop.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AgentError;
use crate::search::{CaseSearch, Filters};

use super::config::AgentConfig;
use super::orchestrator::{Orchestrator, RunOutcome};
use super::prompt::{PromptSet, REJECTION_TEXT};
use super::provider::LlmProvider;
use super::state::ConversationState;

/// Maximum accepted message length in bytes.
pub const MAX_QUERY_LEN: usize = 10_000;

/// An incoming consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultRequest {
    /// The user's question.
    pub message: String,
    /// Session result-count limit. `None` or `0` uses the configured default.
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Session filters applied to retrieval tools.
    #[serde(default)]
    pub filters: Option<Filters>,
}

impl ConsultRequest {
    /// A request with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Outcome of a consultation.
#[derive(Debug, Clone)]
pub enum Consultation {
    /// Blank input; the text asks the user to resend.
    Rejected(String),
    /// The loop ran to completion.
    Answered(Box<RunOutcome>),
}

impl Consultation {
    /// Text to hand back to the caller: the rejection prompt or the final
    /// answer JSON.
    #[must_use]
    pub fn reply(&self) -> &str {
        match self {
            Self::Rejected(text) => text,
            Self::Answered(outcome) => &outcome.answer,
        }
    }
}

/// The legal assistant: policy, loop and defaults behind one call.
#[derive(Debug)]
pub struct LegalAssistant {
    orchestrator: Orchestrator,
    policy: String,
    default_top_k: usize,
}

impl LegalAssistant {
    /// Creates an assistant.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn CaseSearch>,
        config: &AgentConfig,
        prompts: &PromptSet,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(provider, search, config, prompts),
            policy: prompts.system.clone(),
            default_top_k: config.default_top_k,
        }
    }

    /// Runs one consultation.
    ///
    /// Blank messages are rejected with [`REJECTION_TEXT`] before any model
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidRequest`] if the message exceeds
    /// [`MAX_QUERY_LEN`].
    pub async fn consult(&self, request: &ConsultRequest) -> Result<Consultation, AgentError> {
        let message = request.message.trim();
        if message.is_empty() {
            debug!("blank consultation rejected");
            return Ok(Consultation::Rejected(REJECTION_TEXT.to_string()));
        }
        if message.len() > MAX_QUERY_LEN {
            return Err(AgentError::InvalidRequest {
                message: format!(
                    "message exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                    message.len()
                ),
            });
        }

        let top_k = request
            .top_k
            .filter(|&k| k > 0)
            .unwrap_or(self.default_top_k);
        info!(
            chars = message.len(),
            top_k,
            filters = request.filters.as_ref().map_or(0, Filters::len),
            "consultation started"
        );

        let state = ConversationState::seed(&self.policy, message, top_k, request.filters.clone());
        let outcome = self.orchestrator.run(state).await;
        Ok(Consultation::Answered(Box::new(outcome)))
    }
}
