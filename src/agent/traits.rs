//! Agent trait definition.
//!
//! Both model-calling steps (the tool-calling agent step and the
//! finalizer) implement this trait, which fixes how their requests are
//! built.

use super::message::{ChatMessage, ChatRequest};
use super::tool::ToolDefinition;

/// A model-calling step with a fixed model configuration.
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// Whether to request JSON-formatted output.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature.
    fn temperature(&self) -> f32 {
        0.2
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        1024
    }

    /// Tool definitions offered to the model. None by default.
    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Builds a [`ChatRequest`] carrying `messages` and this agent's
    /// configuration.
    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model().to_string(),
            messages,
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            json_mode: self.json_mode(),
            tools: self.tools(),
        }
    }
}
