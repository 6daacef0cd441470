//! Tool executor that dispatches tool calls to the case-law index.
//!
//! Maps tool names to [`CaseSearch`] operations. Results are serialized as
//! JSON for the model; every failure becomes an error [`ToolResult`].

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::AgentError;
use crate::search::{CaseQuery, CaseSearch, Filters, ProvidenceListQuery, ProvidenceQuery};

use super::tool::{
    GET_PROVIDENCE_SUMMARY, LIST_PROVIDENCES, PROVIDENCE_DEFAULT_TOP_K, SEARCH_BY_PROVIDENCE,
    SEARCH_CASES, SEARCH_CASES_DEFAULT_TOP_K, ToolCall, ToolResult, ToolSet,
};

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;
/// Maximum `top_k` for the retrieval tools.
const MAX_TOP_K: usize = 50;
/// Maximum `limit` for `list_providences`.
const MAX_LIST_LIMIT: usize = 200;

/// Executes tool calls against a [`CaseSearch`] backend.
#[derive(Clone)]
pub struct ToolExecutor {
    search: Arc<dyn CaseSearch>,
    tools: ToolSet,
}

impl ToolExecutor {
    /// Creates an executor over the given backend with the legal tool set.
    #[must_use]
    pub fn new(search: Arc<dyn CaseSearch>) -> Self {
        Self {
            search,
            tools: ToolSet::legal_tools(),
        }
    }

    /// Tools this executor can run.
    #[must_use]
    pub const fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Executes one tool call.
    ///
    /// Validates raw argument size before dispatch. Unknown tools and
    /// backend failures are reported in the result, never raised.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self.run(call).await {
            Ok(content) => ToolResult {
                tool_call_id: call.id.clone(),
                content,
                is_error: false,
            },
            Err(e) => ToolResult {
                tool_call_id: call.id.clone(),
                content: e.to_string(),
                is_error: true,
            },
        }
    }

    async fn run(&self, call: &ToolCall) -> Result<String, AgentError> {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return Err(tool_error(
                &call.name,
                format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
            ));
        }

        match call.name.as_str() {
            SEARCH_CASES => self.tool_search_cases(&call.arguments).await,
            SEARCH_BY_PROVIDENCE => self.tool_search_by_providence(&call.arguments).await,
            GET_PROVIDENCE_SUMMARY => self.tool_providence_summary(&call.arguments).await,
            LIST_PROVIDENCES => self.tool_list_providences(&call.arguments).await,
            other => {
                let available: Vec<&str> = self
                    .tools
                    .definitions()
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect();
                Err(tool_error(
                    other,
                    format!("unknown tool; available: {}", available.join(", ")),
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tool implementations
    // -----------------------------------------------------------------------

    async fn tool_search_cases(&self, args: &str) -> Result<String, AgentError> {
        #[derive(Deserialize)]
        struct Args {
            query: String,
            top_k: Option<usize>,
            filters: Option<Filters>,
        }
        let args: Args = parse_args(SEARCH_CASES, args)?;
        if args.query.trim().is_empty() {
            return Err(tool_error(SEARCH_CASES, "query must not be empty"));
        }

        let query = CaseQuery {
            query: args.query,
            top_k: clamp_top_k(args.top_k, SEARCH_CASES_DEFAULT_TOP_K),
            filters: args.filters,
        };
        let docs = self
            .search
            .search_cases(&query)
            .await
            .map_err(|e| tool_error(SEARCH_CASES, e))?;
        to_json(SEARCH_CASES, &docs)
    }

    async fn tool_search_by_providence(&self, args: &str) -> Result<String, AgentError> {
        #[derive(Deserialize)]
        struct Args {
            providence: String,
            top_k: Option<usize>,
            additional_filters: Option<Filters>,
        }
        let args: Args = parse_args(SEARCH_BY_PROVIDENCE, args)?;
        let providence = args.providence.trim();
        if providence.is_empty() {
            return Err(tool_error(SEARCH_BY_PROVIDENCE, "providence must not be empty"));
        }

        let query = ProvidenceQuery {
            providence: providence.to_string(),
            top_k: clamp_top_k(args.top_k, PROVIDENCE_DEFAULT_TOP_K),
            additional_filters: args.additional_filters,
        };
        let docs = self
            .search
            .search_by_providence(&query)
            .await
            .map_err(|e| tool_error(SEARCH_BY_PROVIDENCE, e))?;
        to_json(SEARCH_BY_PROVIDENCE, &docs)
    }

    async fn tool_providence_summary(&self, args: &str) -> Result<String, AgentError> {
        #[derive(Deserialize)]
        struct Args {
            providence: String,
        }
        let args: Args = parse_args(GET_PROVIDENCE_SUMMARY, args)?;
        let summary = self
            .search
            .providence_summary(args.providence.trim())
            .await
            .map_err(|e| tool_error(GET_PROVIDENCE_SUMMARY, e))?;
        to_json(GET_PROVIDENCE_SUMMARY, &summary)
    }

    async fn tool_list_providences(&self, args: &str) -> Result<String, AgentError> {
        #[derive(Deserialize)]
        struct Args {
            limit: Option<usize>,
            source_filter: Option<String>,
            year_filter: Option<i64>,
        }
        let args: Args = parse_args(LIST_PROVIDENCES, args)?;
        let defaults = ProvidenceListQuery::default();
        let query = ProvidenceListQuery {
            limit: args
                .limit
                .filter(|&n| n > 0)
                .unwrap_or(defaults.limit)
                .min(MAX_LIST_LIMIT),
            source: args.source_filter.filter(|s| !s.trim().is_empty()),
            year: args.year_filter,
        };
        let listings = self
            .search
            .list_providences(&query)
            .await
            .map_err(|e| tool_error(LIST_PROVIDENCES, e))?;
        to_json(LIST_PROVIDENCES, &listings)
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

fn tool_error(name: &str, message: impl ToString) -> AgentError {
    AgentError::ToolExecution {
        name: name.to_string(),
        message: message.to_string(),
    }
}

/// Parses tool arguments. An empty string is read as `{}`.
fn parse_args<T: DeserializeOwned>(name: &str, args: &str) -> Result<T, AgentError> {
    let args = if args.trim().is_empty() { "{}" } else { args };
    serde_json::from_str(args).map_err(|e| tool_error(name, format!("invalid arguments: {e}")))
}

fn to_json<T: serde::Serialize>(name: &str, value: &T) -> Result<String, AgentError> {
    serde_json::to_string(value).map_err(|e| tool_error(name, format!("serialization error: {e}")))
}

/// Zero is read as "use the tool default"; anything above the cap is
/// clamped.
fn clamp_top_k(requested: Option<usize>, default: usize) -> usize {
    requested
        .filter(|&k| k > 0)
        .unwrap_or(default)
        .min(MAX_TOP_K)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::search::{CaseDocument, ProvidenceDocument, ProvidenceListing};

    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Records every query and returns canned results.
    #[derive(Default)]
    pub(crate) struct RecordingSearch {
        pub(crate) cases: Mutex<Vec<CaseQuery>>,
        pub(crate) providences: Mutex<Vec<ProvidenceQuery>>,
        pub(crate) fail: bool,
    }

    impl RecordingSearch {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn case_queries(&self) -> Vec<CaseQuery> {
            self.cases.lock().map(|g| g.clone()).unwrap_or_default()
        }

        pub(crate) fn providence_queries(&self) -> Vec<ProvidenceQuery> {
            self.providences.lock().map(|g| g.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl CaseSearch for RecordingSearch {
        async fn search_cases(&self, query: &CaseQuery) -> Result<Vec<CaseDocument>, SearchError> {
            if let Ok(mut g) = self.cases.lock() {
                g.push(query.clone());
            }
            if self.fail {
                return Err(SearchError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(vec![CaseDocument {
                id: "doc-1".to_string(),
                score: 2.5,
                title: Some("T-123/2024".to_string()),
                content: Some("despido de trabajadora embarazada".to_string()),
                source: Some("https://corte.example/T-123-24".to_string()),
                date: Some("2024-03-01".to_string()),
            }])
        }

        async fn search_by_providence(
            &self,
            query: &ProvidenceQuery,
        ) -> Result<Vec<ProvidenceDocument>, SearchError> {
            if let Ok(mut g) = self.providences.lock() {
                g.push(query.clone());
            }
            if self.fail {
                return Err(SearchError::Decode("bad".to_string()));
            }
            Ok(Vec::new())
        }

        async fn list_providences(
            &self,
            query: &ProvidenceListQuery,
        ) -> Result<Vec<ProvidenceListing>, SearchError> {
            Ok((0..query.limit.min(2))
                .map(|i| ProvidenceListing {
                    providence: format!("T-{i}/2024"),
                    document_count: 3,
                    source: None,
                    date: None,
                    year: Some(2024),
                    relevance: None,
                    tema_subtema: None,
                })
                .collect())
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_cases_defaults_and_serializes() {
        let search = Arc::new(RecordingSearch::default());
        let executor = ToolExecutor::new(search.clone());
        let result = executor
            .execute(&call(SEARCH_CASES, r#"{"query":"despido"}"#))
            .await;
        assert!(!result.is_error, "{}", result.content);
        assert_eq!(result.tool_call_id, "call_1");
        assert!(result.content.contains("doc-1"));
        assert_eq!(search.case_queries()[0].top_k, SEARCH_CASES_DEFAULT_TOP_K);
    }

    #[tokio::test]
    async fn test_top_k_clamped() {
        let search = Arc::new(RecordingSearch::default());
        let executor = ToolExecutor::new(search.clone());
        let _ = executor
            .execute(&call(SEARCH_CASES, r#"{"query":"x","top_k":999}"#))
            .await;
        assert_eq!(search.case_queries()[0].top_k, MAX_TOP_K);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::default()));
        let result = executor.execute(&call("list_recent_cases", "{}")).await;
        assert!(result.is_error);
        assert!(result.content.contains("list_recent_cases"));
        assert!(result.content.contains("unknown tool"));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::default()));
        let result = executor.execute(&call(SEARCH_CASES, "[1,2]")).await;
        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments"));
    }

    #[tokio::test]
    async fn test_oversized_arguments() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::default()));
        let big = format!(r#"{{"query":"{}"}}"#, "a".repeat(MAX_TOOL_ARGS_LEN));
        let result = executor.execute(&call(SEARCH_CASES, &big)).await;
        assert!(result.is_error);
        assert!(result.content.contains("too large"));
    }

    #[tokio::test]
    async fn test_backend_failure_names_tool() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::failing()));
        let result = executor
            .execute(&call(SEARCH_CASES, r#"{"query":"x"}"#))
            .await;
        assert!(result.is_error);
        assert!(result.content.starts_with("tool `search_cases` failed:"));
    }

    #[tokio::test]
    async fn test_summary_not_found() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::default()));
        let result = executor
            .execute(&call(GET_PROVIDENCE_SUMMARY, r#"{"providence":"T-9/2030"}"#))
            .await;
        assert!(!result.is_error);
        assert!(result.content.contains("\"found\":false"));
    }

    #[tokio::test]
    async fn test_list_providences_empty_arguments() {
        let executor = ToolExecutor::new(Arc::new(RecordingSearch::default()));
        let result = executor.execute(&call(LIST_PROVIDENCES, "")).await;
        assert!(!result.is_error, "{}", result.content);
        assert!(result.content.contains("T-0/2024"));
    }

    #[test]
    fn test_clamp_top_k() {
        assert_eq!(clamp_top_k(None, 6), 6);
        assert_eq!(clamp_top_k(Some(0), 10), 10);
        assert_eq!(clamp_top_k(Some(3), 6), 3);
        assert_eq!(clamp_top_k(Some(51), 6), MAX_TOP_K);
    }
}
