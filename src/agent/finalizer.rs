//! Finalization step: forces a schema-conformant JSON answer.

use std::sync::Arc;

use tracing::{debug, error};

use super::answer::{FinalAnswer, normalize};
use super::config::AgentConfig;
use super::message::{ChatMessage, Role, assistant_message, user_message};
use super::prompt::build_tool_summary_request;
use super::provider::LlmProvider;
use super::state::ConversationState;
use super::traits::Agent;

/// Characters of each outgoing message logged when finalization fails.
const LOG_PREVIEW_CHARS: usize = 200;

/// Produces the terminal answer of a consultation.
pub struct Finalizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    instructions: String,
}

impl Finalizer {
    /// Creates the step from configuration and the synthesis instruction.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: &AgentConfig,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: config.final_model.clone(),
            temperature: config.temperature,
            max_tokens: config.final_max_tokens,
            instructions: instructions.into(),
        }
    }

    /// Builds the finalization payload, or `None` when nothing at all
    /// survives filtering.
    #[must_use]
    pub fn payload(&self, state: &ConversationState) -> Option<Vec<ChatMessage>> {
        let mut payload = state.payload();
        if payload.is_empty() {
            let tool_contents: Vec<&str> = state
                .messages()
                .iter()
                .filter(|m| m.role == Role::Tool && m.is_eligible())
                .map(|m| m.content.as_str())
                .collect();
            if tool_contents.is_empty() {
                return None;
            }
            payload.push(user_message(&build_tool_summary_request(&tool_contents)));
        }
        payload.push(user_message(&self.instructions));
        Some(payload)
    }

    /// Appends the final answer JSON to `state` and returns it.
    ///
    /// The returned text always parses as a [`FinalAnswer`].
    pub async fn run(&self, state: &mut ConversationState) -> String {
        let answer = match self.payload(state) {
            None => {
                debug!("nothing to finalize, returning default payload");
                FinalAnswer::default_payload()
            }
            Some(payload) => {
                let request = self.request(payload);
                match self.provider.chat(&request).await {
                    Ok(response) => {
                        debug!(
                            chars = response.content.len(),
                            total_tokens = response.usage.total_tokens,
                            "finalization complete"
                        );
                        normalize(&response.content)
                    }
                    Err(e) => {
                        error!(error = %e, messages = request.messages.len(), "finalization model call failed");
                        for (i, msg) in request.messages.iter().enumerate() {
                            let preview: String =
                                msg.content.chars().take(LOG_PREVIEW_CHARS).collect();
                            error!(index = i, role = ?msg.role, content = %preview, "outgoing message");
                        }
                        FinalAnswer::fallback()
                    }
                }
            }
        };

        let json = answer.to_json();
        state.push(assistant_message(&json, Vec::new()));
        json
    }
}

impl Agent for Finalizer {
    fn name(&self) -> &'static str {
        "finalizer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl std::fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finalizer")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
