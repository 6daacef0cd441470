//! Per-consultation conversation state and the call-payload projection.
//!
//! The message log is append-only. What is actually sent to the model is
//! a derived view computed by [`payload_view`]: ineligible turns are left
//! out and tool-call pairing is repaired so that every `tool` message
//! answers a call and every call is answered.

use std::collections::{HashMap, VecDeque};

use crate::search::Filters;

use super::message::{ChatMessage, Role, system_message, user_message};
use super::prompt::{build_contextual_user_message, session_params_line};

/// Ordered message log plus the session search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    top_k: usize,
    filters: Option<Filters>,
}

impl ConversationState {
    /// Seeds a state with the policy and the user's message.
    #[must_use]
    pub fn seed(policy: &str, user: &str, top_k: usize, filters: Option<Filters>) -> Self {
        Self {
            messages: vec![system_message(policy), user_message(user)],
            top_k,
            filters,
        }
    }

    /// Builds a state from an existing log.
    #[must_use]
    pub const fn from_messages(
        messages: Vec<ChatMessage>,
        top_k: usize,
        filters: Option<Filters>,
    ) -> Self {
        Self {
            messages,
            top_k,
            filters,
        }
    }

    /// The full log.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Latest message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Appends a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Session result-count limit.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Session filter map, if one was supplied.
    #[must_use]
    pub const fn filters(&self) -> Option<&Filters> {
        self.filters.as_ref()
    }

    /// Session filter map when it is present and non-empty.
    #[must_use]
    pub fn active_filters(&self) -> Option<&Filters> {
        self.filters.as_ref().filter(|f| !f.is_empty())
    }

    /// Consumes the state, returning the log.
    #[must_use]
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    /// Model payload for this state: [`payload_view`] with the system
    /// policy folded into the first user turn.
    #[must_use]
    pub fn payload(&self) -> Vec<ChatMessage> {
        let params = session_params_line(self.top_k, self.active_filters());
        fold_system(payload_view(&self.messages), params.as_deref())
    }
}

/// Projects the log onto a payload a chat backend will accept.
///
/// - messages with neither text nor tool calls are dropped;
/// - `tool` messages whose id was never requested earlier are dropped;
/// - tool calls that never received a `tool` message are stripped, and an
///   assistant message left empty by that is dropped.
///
/// The input is never modified.
#[must_use]
pub fn payload_view(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let eligible: Vec<&ChatMessage> = messages.iter().filter(|m| m.is_eligible()).collect();

    // Each tool message answers the oldest still-open call with its id, so
    // ids reused across rounds pair up correctly.
    let mut answered: Vec<Vec<bool>> = eligible
        .iter()
        .map(|m| vec![false; m.tool_calls.len()])
        .collect();
    let mut open: HashMap<&str, VecDeque<(usize, usize)>> = HashMap::new();
    let mut keep = vec![true; eligible.len()];

    for (i, msg) in eligible.iter().enumerate() {
        match msg.role {
            Role::Assistant => {
                for (j, call) in msg.tool_calls.iter().enumerate() {
                    open.entry(call.id.as_str()).or_default().push_back((i, j));
                }
            }
            Role::Tool => {
                let slot = msg
                    .tool_call_id
                    .as_deref()
                    .and_then(|id| open.get_mut(id))
                    .and_then(VecDeque::pop_front);
                match slot {
                    Some((m, c)) => answered[m][c] = true,
                    None => keep[i] = false,
                }
            }
            Role::System | Role::User => {}
        }
    }

    eligible
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep[*i])
        .filter_map(|(i, msg)| {
            if msg.role != Role::Assistant || msg.tool_calls.is_empty() {
                return Some(msg.clone());
            }
            let mut repaired = msg.clone();
            let mut flags = answered[i].iter();
            repaired
                .tool_calls
                .retain(|_| flags.next().copied().unwrap_or(false));
            repaired.is_eligible().then_some(repaired)
        })
        .collect()
}

/// Folds `system` messages into the payload.
///
/// When the first non-system message is a user turn, the policy text (and
/// the session parameter line, if any) is prefixed to it and the system
/// messages are removed. Otherwise a single system message carrying the
/// policy is kept at the front.
#[must_use]
pub fn fold_system(view: Vec<ChatMessage>, params: Option<&str>) -> Vec<ChatMessage> {
    let (system, mut rest): (Vec<ChatMessage>, Vec<ChatMessage>) =
        view.into_iter().partition(|m| m.role == Role::System);

    let policy = system
        .iter()
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    match rest.first_mut() {
        Some(first) if first.role == Role::User => {
            if !policy.is_empty() || params.is_some() {
                first.content = build_contextual_user_message(&policy, params, &first.content);
            }
            rest
        }
        _ => {
            if policy.is_empty() {
                return rest;
            }
            let mut out = Vec::with_capacity(rest.len() + 1);
            out.push(system_message(&policy));
            out.extend(rest);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{assistant_message, assistant_tool_calls_message, tool_message};
    use crate::agent::tool::ToolCall;
    use crate::search::FilterValue;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "search_cases".to_string(),
            arguments: "{}".to_string(),
        }
    }

    #[test]
    fn test_view_drops_blank_messages() {
        let log = vec![
            system_message("política"),
            user_message("   "),
            assistant_message("", Vec::new()),
            user_message("hola"),
        ];
        let view = payload_view(&log);
        assert_eq!(view.len(), 2);
        assert_eq!(view[1].content, "hola");
    }

    #[test]
    fn test_view_does_not_mutate_log() {
        let log = vec![user_message(""), user_message("hola")];
        let before = log.clone();
        let _ = payload_view(&log);
        assert_eq!(log, before);
    }

    #[test]
    fn test_view_drops_orphan_tool_message() {
        let log = vec![user_message("hola"), tool_message("ghost", "[]")];
        let view = payload_view(&log);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].role, Role::User);
    }

    #[test]
    fn test_view_strips_unanswered_calls() {
        let log = vec![
            user_message("hola"),
            assistant_tool_calls_message(vec![call("a"), call("b")]),
            tool_message("a", "[]"),
        ];
        let view = payload_view(&log);
        assert_eq!(view.len(), 3);
        assert_eq!(view[1].tool_calls.len(), 1);
        assert_eq!(view[1].tool_calls[0].id, "a");
    }

    #[test]
    fn test_view_drops_assistant_left_empty() {
        let log = vec![
            user_message("hola"),
            assistant_tool_calls_message(vec![call("a")]),
        ];
        let view = payload_view(&log);
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_view_keeps_text_of_stripped_assistant() {
        let log = vec![
            user_message("hola"),
            assistant_message("buscando", vec![call("a")]),
        ];
        let view = payload_view(&log);
        assert_eq!(view.len(), 2);
        assert!(view[1].tool_calls.is_empty());
        assert_eq!(view[1].content, "buscando");
    }

    #[test]
    fn test_tool_before_its_call_is_dropped() {
        let log = vec![
            user_message("hola"),
            tool_message("a", "early"),
            assistant_tool_calls_message(vec![call("a")]),
        ];
        let view = payload_view(&log);
        // The early result is an orphan, so the call is unanswered too.
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_reused_ids_pair_in_order() {
        let log = vec![
            user_message("hola"),
            assistant_tool_calls_message(vec![call("call_0")]),
            tool_message("call_0", "[1]"),
            assistant_tool_calls_message(vec![call("call_0")]),
        ];
        let view = payload_view(&log);
        // Second round never got its result, so that assistant turn goes.
        assert_eq!(view.len(), 3);
        assert_eq!(view[2].role, Role::Tool);
    }

    #[test]
    fn test_duplicate_tool_answer_dropped() {
        let log = vec![
            user_message("hola"),
            assistant_tool_calls_message(vec![call("a")]),
            tool_message("a", "first"),
            tool_message("a", "second"),
        ];
        let view = payload_view(&log);
        assert_eq!(view.len(), 3);
        assert_eq!(view[2].content, "first");
    }

    #[test]
    fn test_fold_into_first_user() {
        let view = vec![system_message("POLÍTICA"), user_message("¿tutela?")];
        let folded = fold_system(view, None);
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].role, Role::User);
        assert!(folded[0].content.starts_with("POLÍTICA"));
        assert!(folded[0].content.ends_with("¿tutela?"));
    }

    #[test]
    fn test_fold_keeps_system_role_when_first_is_not_user() {
        let view = vec![
            system_message("POLÍTICA"),
            assistant_message("hola", Vec::new()),
        ];
        let folded = fold_system(view, None);
        assert_eq!(folded.len(), 2);
        assert_eq!(folded[0].role, Role::System);
    }

    #[test]
    fn test_payload_includes_non_default_params() {
        let mut filters = Filters::new();
        filters.insert("year".into(), FilterValue::Integer(2024));
        let state = ConversationState::seed("POLÍTICA", "¿despido?", 3, Some(filters));
        let payload = state.payload();
        assert_eq!(payload.len(), 1);
        assert!(payload[0].content.contains("top_k=3"));
        assert!(payload[0].content.contains("year"));
    }

    #[test]
    fn test_payload_omits_default_params() {
        let state = ConversationState::seed("POLÍTICA", "¿despido?", 6, Some(Filters::new()));
        let payload = state.payload();
        assert!(!payload[0].content.contains("top_k"));
        assert!(state.active_filters().is_none());
    }
}
