//! Orchestration loop: `agent → (tools → agent)* → final`.
//!
//! An explicit state machine over [`Node`] with a tool-round counter. Once
//! the counter reaches the configured cap the loop finalizes even if the
//! model is still asking for tools.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::search::CaseSearch;

use super::config::AgentConfig;
use super::dispatch::ToolDispatcher;
use super::executor::ToolExecutor;
use super::finalizer::Finalizer;
use super::message::Role;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::state::ConversationState;
use super::step::AgentStep;

/// States of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// Invoke the model with tools.
    Agent,
    /// Execute the pending tool calls.
    Tools,
    /// Produce the final answer (terminal).
    Final,
}

/// Routing decision after an agent step.
///
/// `Tools` when the latest message is an assistant turn with at least one
/// tool call and fewer than `max_tool_rounds` rounds have run; `Final`
/// otherwise.
#[must_use]
pub fn route(state: &ConversationState, tool_rounds: usize, max_tool_rounds: usize) -> Node {
    let wants_tools = state
        .last()
        .is_some_and(|m| m.role == Role::Assistant && m.has_tool_calls());
    if wants_tools && tool_rounds < max_tool_rounds {
        Node::Tools
    } else {
        Node::Final
    }
}

/// Result of one orchestration run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The state after finalization (its last message is the answer).
    pub state: ConversationState,
    /// Final answer JSON text.
    pub answer: String,
    /// Completed `tools` rounds.
    pub tool_rounds: usize,
    /// Whether the iteration cap forced finalization.
    pub capped: bool,
}

/// Drives a conversation from seed to final answer.
pub struct Orchestrator {
    step: AgentStep,
    dispatcher: ToolDispatcher,
    finalizer: Finalizer,
    max_tool_iterations: usize,
}

impl Orchestrator {
    /// Creates an orchestrator over the given provider and search backend.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn CaseSearch>,
        config: &AgentConfig,
        prompts: &PromptSet,
    ) -> Self {
        let executor = ToolExecutor::new(search);
        let step = AgentStep::new(Arc::clone(&provider), config, executor.tools().clone());
        Self {
            step,
            dispatcher: ToolDispatcher::new(executor),
            finalizer: Finalizer::new(provider, config, prompts.final_instructions.clone()),
            max_tool_iterations: config.max_tool_iterations,
        }
    }

    /// Configured cap on tool rounds.
    #[must_use]
    pub const fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }

    /// Runs the loop to completion. Never fails: provider and tool errors
    /// are absorbed by the individual steps.
    pub async fn run(&self, mut state: ConversationState) -> RunOutcome {
        let mut node = Node::Agent;
        let mut tool_rounds = 0usize;
        let mut capped = false;

        loop {
            match node {
                Node::Agent => {
                    self.step.run(&mut state).await;
                    node = route(&state, tool_rounds, self.max_tool_iterations);
                    if node == Node::Final
                        && state.last().is_some_and(|m| m.has_tool_calls())
                    {
                        capped = true;
                        warn!(
                            tool_rounds,
                            max = self.max_tool_iterations,
                            "tool round cap reached, forcing finalization"
                        );
                    }
                    debug!(from = "agent", to = ?node, tool_rounds, "transition");
                }
                Node::Tools => {
                    let executed = self.dispatcher.dispatch(&mut state).await;
                    tool_rounds += 1;
                    debug!(from = "tools", to = "agent", executed, tool_rounds, "transition");
                    node = Node::Agent;
                }
                Node::Final => {
                    let answer = self.finalizer.run(&mut state).await;
                    info!(
                        tool_rounds,
                        capped,
                        messages = state.messages().len(),
                        "consultation finalized"
                    );
                    return RunOutcome {
                        state,
                        answer,
                        tool_rounds,
                        capped,
                    };
                }
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("step", &self.step)
            .field("finalizer", &self.finalizer)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .finish_non_exhaustive()
    }
}
