//! Output formatting for CLI commands.
//!
//! Every command renders either human-readable text or pretty JSON.

use std::fmt::Write as _;

use serde::Serialize;

use crate::agent::render_reply;
use crate::agent::tool::ToolSet;
use crate::search::{CaseDocument, ProvidenceDocument, ProvidenceListing, ProvidenceSummary};

/// Characters of fragment content shown in text listings.
const PREVIEW_CHARS: usize = 160;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything unrecognized is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON, or an error object if that fails.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {e}"}}"#))
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}

/// Renders a consultation reply. JSON output is the answer text verbatim.
#[must_use]
pub fn format_reply(reply: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", render_reply(reply)),
        OutputFormat::Json => format!("{reply}\n"),
    }
}

/// Renders free-text search hits.
#[must_use]
pub fn format_cases(docs: &[CaseDocument], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(docs);
    }
    if docs.is_empty() {
        return "No results.\n".to_string();
    }
    let mut out = String::new();
    for (i, doc) in docs.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. [{:.3}] {} {}",
            i + 1,
            doc.score,
            doc.id,
            doc.title.as_deref().unwrap_or("-")
        );
        if let Some(date) = &doc.date {
            let _ = writeln!(out, "    date: {date}");
        }
        if let Some(content) = &doc.content {
            let _ = writeln!(out, "    {}", preview(content));
        }
    }
    out
}

/// Renders the fragments of one ruling.
#[must_use]
pub fn format_providence_docs(docs: &[ProvidenceDocument], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(docs);
    }
    if docs.is_empty() {
        return "No fragments found.\n".to_string();
    }
    let mut out = String::new();
    for doc in docs {
        let _ = write!(out, "{}", doc.id);
        if let Some(relevance) = doc.relevance {
            let _ = write!(out, " (relevance {relevance:.2})");
        }
        out.push('\n');
        if !doc.temas.is_empty() {
            let _ = writeln!(out, "    temas: {}", doc.temas.join(", "));
        }
        if let Some(content) = &doc.content {
            let _ = writeln!(out, "    {}", preview(content));
        }
    }
    out
}

/// Renders a ruling summary.
#[must_use]
pub fn format_summary(summary: &ProvidenceSummary, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(summary);
    }
    if !summary.found {
        return format!(
            "{}: {}\n",
            summary.providence,
            summary.error.as_deref().unwrap_or("not found")
        );
    }
    let mut out = format!("Providence: {}\n", summary.providence);
    let _ = writeln!(out, "Fragments:  {}", summary.total_chunks);
    let _ = writeln!(out, "Sources:    {}", summary.sources.join(", "));
    let _ = writeln!(out, "Dates:      {}", summary.dates.join(", "));
    let _ = writeln!(
        out,
        "Relevance:  avg {:.2}, max {:.2}, min {:.2}",
        summary.average_relevance, summary.max_relevance, summary.min_relevance
    );
    let _ = writeln!(out, "Temas ({}): {}", summary.tema_count, summary.unique_temas.join(", "));
    if let Some(top) = &summary.most_relevant_content {
        let _ = writeln!(out, "\nMost relevant ({:.2}):\n{}", top.relevance, top.content);
    }
    out
}

/// Renders the list of rulings.
#[must_use]
pub fn format_listings(listings: &[ProvidenceListing], format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(listings);
    }
    if listings.is_empty() {
        return "No rulings found.\n".to_string();
    }
    let mut out = String::new();
    for item in listings {
        let _ = write!(out, "{:<20} {:>5} fragments", item.providence, item.document_count);
        if let Some(year) = item.year {
            let _ = write!(out, "  {year}");
        }
        if let Some(source) = &item.source {
            let _ = write!(out, "  {source}");
        }
        out.push('\n');
    }
    out
}

/// Renders the registered tool definitions.
#[must_use]
pub fn format_tools(tools: &ToolSet, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return format.to_json(tools.definitions());
    }
    let mut out = String::new();
    for def in tools.definitions() {
        let _ = writeln!(out, "{}\n    {}", def.name, def.description);
    }
    out
}
