//! Tool type definitions for function-calling.
//!
//! Provides provider-agnostic types for tool definitions, calls, and results.
//! The registered tools expose the case-law search index to the agent.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Free-text hybrid search over case fragments.
pub const SEARCH_CASES: &str = "search_cases";
/// Exact lookup of every fragment of one ruling.
pub const SEARCH_BY_PROVIDENCE: &str = "search_by_providence";
/// Aggregated statistics for one ruling.
pub const GET_PROVIDENCE_SUMMARY: &str = "get_providence_summary";
/// Distinct rulings present in the index.
pub const LIST_PROVIDENCES: &str = "list_providences";

/// Default `top_k` for [`SEARCH_CASES`].
pub const SEARCH_CASES_DEFAULT_TOP_K: usize = 6;
/// Default `top_k` for [`SEARCH_BY_PROVIDENCE`].
pub const PROVIDENCE_DEFAULT_TOP_K: usize = 10;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match dispatch table in executor).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content (JSON string on success, error message on failure).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// The set of tools offered to the agent.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
}

impl ToolSet {
    /// Returns the tool definitions in this set.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }

    /// Tool set for the legal research agent.
    #[must_use]
    pub fn legal_tools() -> Self {
        Self {
            definitions: vec![
                def_search_cases(),
                def_search_by_providence(),
                def_get_providence_summary(),
                def_list_providences(),
            ],
        }
    }

    /// Empty tool set (no tools available).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Returns `true` for tools that accept the session `top_k` and filters.
#[must_use]
pub fn is_retrieval_tool(name: &str) -> bool {
    name == SEARCH_CASES || name == SEARCH_BY_PROVIDENCE
}

/// Name of the filter argument for a retrieval tool.
#[must_use]
pub fn filter_argument(name: &str) -> Option<&'static str> {
    match name {
        SEARCH_CASES => Some("filters"),
        SEARCH_BY_PROVIDENCE => Some("additional_filters"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tool schema definitions
// ---------------------------------------------------------------------------

fn filter_schema(description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "description": description,
        "additionalProperties": {
            "type": ["string", "number", "integer", "boolean"]
        }
    })
}

/// Defines the `search_cases` tool.
fn def_search_cases() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_CASES.to_string(),
        description: "Busca casos en el índice (híbrido léxico + vectorial) y devuelve \
                       fragmentos con id, score, title, content, source y date. Úsala para \
                       consultas generales sin un identificador de providencia."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Texto de la consulta."
                },
                "top_k": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Número de resultados. Por defecto 6."
                },
                "filters": filter_schema(
                    "Filtros de igualdad campo → valor, p. ej. {\"year\": 2024}."
                )
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}

/// Defines the `search_by_providence` tool.
fn def_search_by_providence() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_BY_PROVIDENCE.to_string(),
        description: "Devuelve todos los fragmentos de una providencia concreta (p. ej. \
                       T-123/2024). Prefiérela cuando el usuario cite un identificador."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "providence": {
                    "type": "string",
                    "description": "Identificador exacto de la providencia."
                },
                "top_k": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Máximo de fragmentos. Por defecto 10."
                },
                "additional_filters": filter_schema(
                    "Filtros adicionales campo → valor (año, fuente, ...)."
                )
            },
            "required": ["providence"],
            "additionalProperties": false
        }),
    }
}

/// Defines the `get_providence_summary` tool.
fn def_get_providence_summary() -> ToolDefinition {
    ToolDefinition {
        name: GET_PROVIDENCE_SUMMARY.to_string(),
        description: "Resume una providencia: número de fragmentos, fuentes, fechas, años, \
                       relevancia y temas."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "providence": {
                    "type": "string",
                    "description": "Identificador exacto de la providencia."
                }
            },
            "required": ["providence"],
            "additionalProperties": false
        }),
    }
}

/// Defines the `list_providences` tool.
fn def_list_providences() -> ToolDefinition {
    ToolDefinition {
        name: LIST_PROVIDENCES.to_string(),
        description: "Lista las providencias disponibles en el índice con su número de \
                       fragmentos y datos básicos."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Máximo de providencias. Por defecto 50."
                },
                "source_filter": {
                    "type": "string",
                    "description": "Restringe a una fuente concreta."
                },
                "year_filter": {
                    "type": "integer",
                    "description": "Restringe a un año concreto."
                }
            },
            "additionalProperties": false
        }),
    }
}
