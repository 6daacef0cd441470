//! Tool dispatch step.
//!
//! Runs every tool call of the latest assistant message, after injecting
//! the session `top_k` and filters where the model left them out, and
//! appends one `tool` message per call in call order.

use futures_util::future::join_all;
use serde_json::{Map, Value};
use tracing::debug;

use crate::search::Filters;

use super::executor::ToolExecutor;
use super::message::{Role, tool_message};
use super::state::ConversationState;
use super::tool::{ToolCall, filter_argument, is_retrieval_tool};

/// Executes the pending tool calls of a conversation.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    executor: ToolExecutor,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given executor.
    #[must_use]
    pub const fn new(executor: ToolExecutor) -> Self {
        Self { executor }
    }

    /// The underlying executor.
    #[must_use]
    pub const fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Executes the tool calls of the latest message and appends their
    /// results. Returns the number of calls executed.
    ///
    /// Calls in the batch run concurrently; results are appended in call
    /// order, one per call, whatever the outcome.
    pub async fn dispatch(&self, state: &mut ConversationState) -> usize {
        let calls: Vec<ToolCall> = match state.last() {
            Some(last) if last.role == Role::Assistant => last
                .tool_calls
                .iter()
                .map(|c| inject_session_params(c, state.top_k(), state.active_filters()))
                .collect(),
            _ => return 0,
        };

        let results = join_all(calls.iter().map(|call| self.executor.execute(call))).await;

        for (call, result) in calls.iter().zip(results) {
            debug!(
                tool = %call.name,
                call_id = %call.id,
                is_error = result.is_error,
                bytes = result.content.len(),
                "tool execution complete"
            );
            state.push(tool_message(&call.id, &result.content));
        }
        calls.len()
    }
}

/// Returns `call` with the session parameters filled in.
///
/// Only retrieval tools are touched. An absent (or `null`) `top_k` takes
/// the session limit; an explicit value is kept as is. The filter argument
/// is injected only when the session has a non-empty filter map and the
/// call did not supply one. Arguments that are not a JSON object are left
/// alone for the executor to report.
#[must_use]
pub fn inject_session_params(call: &ToolCall, top_k: usize, filters: Option<&Filters>) -> ToolCall {
    if !is_retrieval_tool(&call.name) {
        return call.clone();
    }
    let raw = if call.arguments.trim().is_empty() {
        "{}"
    } else {
        call.arguments.as_str()
    };
    let Ok(Value::Object(mut args)) = serde_json::from_str::<Value>(raw) else {
        return call.clone();
    };

    let mut changed = false;
    if is_absent(&args, "top_k") {
        args.insert("top_k".to_string(), Value::from(top_k));
        changed = true;
    }
    if let (Some(filters), Some(key)) = (filters.filter(|f| !f.is_empty()), filter_argument(&call.name))
        && is_absent(&args, key)
        && let Ok(value) = serde_json::to_value(filters)
    {
        args.insert(key.to_string(), value);
        changed = true;
    }

    if !changed {
        return call.clone();
    }
    ToolCall {
        id: call.id.clone(),
        name: call.name.clone(),
        arguments: Value::Object(args).to_string(),
    }
}

fn is_absent(args: &Map<String, Value>, key: &str) -> bool {
    args.get(key).is_none_or(Value::is_null)
}
