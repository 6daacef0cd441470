//! The final answer contract and its normalization.
//!
//! Whatever the model returns from the finalization call is coerced into
//! [`FinalAnswer`], so the text handed back to callers always parses as
//! the fixed schema.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Disclaimer carried by every answer.
pub const DISCLAIMER: &str = "Esto no constituye asesoría legal.";
/// Answer used when there was nothing to work with.
pub const DEFAULT_ANSWER: &str = "No pude procesar la consulta.";
/// Answer used when the finalization call failed.
pub const FINAL_ERROR_ANSWER: &str =
    "Lo siento, ocurrió un error al generar la respuesta final. Por favor, inténtalo de nuevo.";

const DEFAULT_PAYLOAD_JSON: &str = r#"{"answer":"No pude procesar la consulta.","citations":[],"cases":[],"disclaimer":"Esto no constituye asesoría legal."}"#;

/// Structured, citation-backed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    /// Answer text.
    pub answer: String,
    /// Documents cited in the answer.
    pub citations: Vec<Citation>,
    /// Rulings referenced by the answer.
    pub cases: Vec<CaseRef>,
    /// Fixed legal notice.
    pub disclaimer: String,
}

/// A cited document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Document id.
    pub id: String,
    /// Title.
    pub title: Option<String>,
    /// Source URL or collection.
    pub source: Option<String>,
}

/// A referenced ruling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRef {
    /// Ruling or document id.
    pub id: String,
    /// Title.
    pub title: Option<String>,
    /// Decision date.
    pub date: Option<String>,
}

impl FinalAnswer {
    /// An answer with the given text and no citations.
    #[must_use]
    pub fn text_only(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            citations: Vec::new(),
            cases: Vec::new(),
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// Payload returned when no message survived filtering.
    #[must_use]
    pub fn default_payload() -> Self {
        Self::text_only(DEFAULT_ANSWER)
    }

    /// Payload returned when the finalization call failed.
    #[must_use]
    pub fn fallback() -> Self {
        Self::text_only(FINAL_ERROR_ANSWER)
    }

    /// Serializes to compact JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| DEFAULT_PAYLOAD_JSON.to_string())
    }
}

/// Coerces model output into a [`FinalAnswer`].
///
/// Code fences are stripped and the first complete JSON object is taken,
/// ignoring any prose after it. Lists keep only entries with an `id`;
/// numeric ids become strings. An object without a usable `answer`, or
/// empty text, yields [`FinalAnswer::fallback`]. Other non-JSON text
/// becomes the answer verbatim, without fences.
#[must_use]
pub fn normalize(text: &str) -> FinalAnswer {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return FinalAnswer::fallback();
    }

    let unfenced = strip_code_fence(trimmed);
    match outermost_object(unfenced) {
        Some(object) => from_object(&object),
        None => FinalAnswer::text_only(unfenced),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// First `{` at which a whole JSON object parses; trailing text is ignored.
fn outermost_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next()? {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    })
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn entries<T>(value: Option<&Value>, build: impl Fn(String, &Map<String, Value>) -> T) -> Vec<T> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let id = scalar(obj.get("id")).filter(|id| !id.trim().is_empty())?;
            Some(build(id, obj))
        })
        .collect()
}

fn from_object(object: &Map<String, Value>) -> FinalAnswer {
    let Some(answer) = scalar(object.get("answer")).filter(|a| !a.trim().is_empty()) else {
        return FinalAnswer::fallback();
    };

    let citations = entries(object.get("citations"), |id, obj| Citation {
        id,
        title: scalar(obj.get("title")),
        source: scalar(obj.get("source")),
    });
    let cases = entries(object.get("cases"), |id, obj| CaseRef {
        id,
        title: scalar(obj.get("title")),
        date: scalar(obj.get("date")),
    });

    FinalAnswer {
        answer,
        citations,
        cases,
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Renders a final-answer JSON text for chat-style display.
///
/// Text that does not parse as an answer object is returned unchanged.
#[must_use]
pub fn render_reply(text: &str) -> String {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text.trim()) else {
        return text.to_string();
    };
    if !object.contains_key("answer") {
        return text.to_string();
    }
    let answer = from_object(&object);

    let mut out = answer.answer.clone();
    if !answer.citations.is_empty() {
        out.push_str("\n\nFuentes:");
        for (i, c) in answer.citations.iter().enumerate() {
            let _ = write!(out, "\n[{}] id={}", i + 1, c.id);
            if let Some(title) = &c.title {
                let _ = write!(out, "; {title}");
            }
            if let Some(source) = &c.source {
                let _ = write!(out, "; source={source}");
            }
        }
    }
    if !answer.cases.is_empty() {
        out.push_str("\n\nCasos:");
        for case in &answer.cases {
            let _ = write!(out, "\n- {}", case.id);
            if let Some(title) = &case.title {
                let _ = write!(out, " ({title})");
            }
            if let Some(date) = &case.date {
                let _ = write!(out, ", {date}");
            }
        }
    }
    let _ = write!(out, "\n\n{}", answer.disclaimer);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn test_default_payload_shape() {
        let json = FinalAnswer::default_payload().to_json();
        assert_eq!(json, DEFAULT_PAYLOAD_JSON);
    }

    #[test]
    fn test_normalize_well_formed() {
        let raw = r#"{"answer":"Sí [1]","citations":[{"id":"doc-1","title":"T-1/2024","source":null}],"cases":[{"id":"T-1/2024","date":"2024-01-01"}],"disclaimer":"otro"}"#;
        let answer = normalize(raw);
        assert_eq!(answer.answer, "Sí [1]");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].title.as_deref(), Some("T-1/2024"));
        assert_eq!(answer.citations[0].source, None);
        assert_eq!(answer.cases[0].date.as_deref(), Some("2024-01-01"));
        assert_eq!(answer.disclaimer, DISCLAIMER);
    }

    #[test_case("```json\n{\"answer\":\"a\"}\n```" ; "json fence")]
    #[test_case("```\n{\"answer\":\"a\"}\n```" ; "bare fence")]
    #[test_case("Aquí está: {\"answer\":\"a\"} gracias" ; "surrounding prose")]
    fn test_normalize_extracts_object(raw: &str) {
        let answer = normalize(raw);
        assert_eq!(answer.answer, "a");
        assert!(answer.citations.is_empty());
    }

    #[test]
    fn test_normalize_coerces_ids_and_drops_missing() {
        let raw = r#"{"answer":"x","citations":[{"id":7},{"title":"sin id"},"texto"],"cases":"no"}"#;
        let answer = normalize(raw);
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].id, "7");
        assert!(answer.cases.is_empty());
    }

    #[test]
    fn test_normalize_plain_text() {
        let answer = normalize("  La tutela procede cuando...  ");
        assert_eq!(answer.answer, "La tutela procede cuando...");
        assert!(answer.cases.is_empty());
    }

    #[test]
    fn test_normalize_empty_is_fallback() {
        assert_eq!(normalize("  \n"), FinalAnswer::fallback());
    }

    #[test_case(r#"{"citations":[{"id":"d1"}]}"# ; "missing")]
    #[test_case(r#"{"answer":"  ","citations":[{"id":"d1"}]}"# ; "blank")]
    #[test_case(r#"{"answer":null,"cases":[{"id":"T-1/2024"}]}"# ; "null")]
    fn test_normalize_without_answer_is_fallback(raw: &str) {
        assert_eq!(normalize(raw), FinalAnswer::fallback());
    }

    #[test]
    fn test_normalize_object_followed_by_braces() {
        let raw = r#"Aquí tienes: {"answer":"Procede [1]","citations":[{"id":"d1"}],"cases":[]} (ver art. {86})"#;
        let answer = normalize(raw);
        assert_eq!(answer.answer, "Procede [1]");
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].id, "d1");
    }

    #[test]
    fn test_normalize_skips_braces_before_object() {
        let raw = r#"Según {art. 86}: {"answer":"Sí","cases":[{"id":"T-2/2023"}]}"#;
        let answer = normalize(raw);
        assert_eq!(answer.answer, "Sí");
        assert_eq!(answer.cases[0].id, "T-2/2023");
    }

    #[test]
    fn test_normalize_broken_fenced_json_drops_fences() {
        let answer = normalize("```json\n{\"answer\": \"x\",}\n```");
        assert_eq!(answer.answer, "{\"answer\": \"x\",}");
        assert!(!answer.answer.contains("```"));
    }

    #[test]
    fn test_render_reply_formats_sections() {
        let json = r#"{"answer":"Procede [1]","citations":[{"id":"d1","title":"T-1/2024","source":"https://x"}],"cases":[{"id":"T-1/2024","title":null,"date":"2024"}],"disclaimer":"Esto no constituye asesoría legal."}"#;
        let rendered = render_reply(json);
        assert!(rendered.starts_with("Procede [1]"));
        assert!(rendered.contains("[1] id=d1; T-1/2024; source=https://x"));
        assert!(rendered.contains("- T-1/2024, 2024"));
        assert!(rendered.ends_with(DISCLAIMER));
    }

    #[test]
    fn test_render_reply_raw_on_parse_failure() {
        assert_eq!(render_reply("texto libre"), "texto libre");
        assert_eq!(render_reply(r#"{"foo":1}"#), r#"{"foo":1}"#);
    }

    proptest! {
        #[test]
        fn prop_normalize_always_yields_schema(s in ".*") {
            let json = normalize(&s).to_json();
            let value: Value = serde_json::from_str(&json).unwrap_or(Value::Null);
            prop_assert!(value["answer"].is_string());
            prop_assert!(value["citations"].is_array());
            prop_assert!(value["cases"].is_array());
            prop_assert_eq!(value["disclaimer"].as_str(), Some(DISCLAIMER));
            for c in value["citations"].as_array().into_iter().flatten() {
                prop_assert!(c["id"].is_string());
            }
        }

        #[test]
        fn prop_normalize_arbitrary_objects(answer in "[a-zA-Z][a-zA-Z ]{0,30}", ids in proptest::collection::vec(any::<i64>(), 0..5)) {
            let citations: Vec<Value> = ids.iter().map(|id| serde_json::json!({"id": id})).collect();
            let raw = serde_json::json!({"answer": answer, "citations": citations}).to_string();
            let normalized = normalize(&raw);
            prop_assert_eq!(normalized.citations.len(), ids.len());
        }
    }
}
