//! Agent step: one tool-calling model invocation.

use std::sync::Arc;

use tracing::{debug, warn};

use super::config::AgentConfig;
use super::message::{ChatMessage, assistant_message};
use super::prompt::{AGENT_FALLBACK_TEXT, APOLOGY_TEXT};
use super::provider::LlmProvider;
use super::state::ConversationState;
use super::tool::{ToolDefinition, ToolSet};
use super::traits::Agent;

/// Invokes the model with the legal tool set and appends its reply.
pub struct AgentStep {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    tools: ToolSet,
}

impl AgentStep {
    /// Creates the step from configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: &AgentConfig, tools: ToolSet) -> Self {
        Self {
            provider,
            model: config.chat_model.clone(),
            temperature: config.temperature,
            max_tokens: config.agent_max_tokens,
            tools,
        }
    }

    /// Appends exactly one assistant message to `state`.
    ///
    /// With nothing eligible to send, appends [`APOLOGY_TEXT`] without
    /// calling the model. A failed call appends [`AGENT_FALLBACK_TEXT`].
    pub async fn run(&self, state: &mut ConversationState) {
        let payload = state.payload();
        if payload.is_empty() {
            debug!("no eligible messages, skipping model call");
            state.push(assistant_message(APOLOGY_TEXT, Vec::new()));
            return;
        }

        let request = self.request(payload);
        match self.provider.chat(&request).await {
            Ok(response) => {
                debug!(
                    tool_calls = response.tool_calls.len(),
                    chars = response.content.len(),
                    finish_reason = ?response.finish_reason,
                    total_tokens = response.usage.total_tokens,
                    "agent step complete"
                );
                state.push(assistant_message(&response.content, response.tool_calls));
            }
            Err(e) => {
                warn!(
                    error = %e,
                    messages = request.messages.len(),
                    lengths = ?content_lengths(&request.messages),
                    "agent model call failed"
                );
                state.push(assistant_message(AGENT_FALLBACK_TEXT, Vec::new()));
            }
        }
    }
}

impl Agent for AgentStep {
    fn name(&self) -> &'static str {
        "agent"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        self.tools.definitions().to_vec()
    }
}

impl std::fmt::Debug for AgentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentStep")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("tools", &self.tools.len())
            .finish()
    }
}

fn content_lengths(messages: &[ChatMessage]) -> Vec<usize> {
    messages.iter().map(|m| m.content.len()).collect()
}
