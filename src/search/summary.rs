//! Aggregation of one ruling's fragments into a summary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ProvidenceDocument;

/// Characters of content kept in [`MostRelevantContent`].
const SUMMARY_CONTENT_CHARS: usize = 500;

/// Aggregate view of a ruling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvidenceSummary {
    /// Ruling identifier.
    pub providence: String,
    /// Whether any fragment was found.
    pub found: bool,
    /// Why nothing was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of fragments.
    pub total_chunks: usize,
    /// Distinct sources.
    pub sources: Vec<String>,
    /// Distinct dates.
    pub dates: Vec<String>,
    /// Distinct years.
    pub years: Vec<i64>,
    /// Mean relevance over fragments that carry one (0 when none do).
    pub average_relevance: f64,
    /// Highest relevance.
    pub max_relevance: f64,
    /// Lowest relevance.
    pub min_relevance: f64,
    /// Distinct topics across fragments.
    pub unique_temas: Vec<String>,
    /// Number of distinct topics.
    pub tema_count: usize,
    /// Excerpt of the most relevant fragment.
    pub most_relevant_content: Option<MostRelevantContent>,
}

/// Excerpt of the highest-relevance fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostRelevantContent {
    /// Content truncated to 500 characters.
    pub content: String,
    /// Its relevance.
    pub relevance: f64,
    /// Its topic tag text.
    pub tema_subtema: Option<String>,
}

/// Builds a [`ProvidenceSummary`] from the fragments of a ruling.
#[must_use]
pub fn summarize_providence(providence: &str, documents: &[ProvidenceDocument]) -> ProvidenceSummary {
    if documents.is_empty() {
        return ProvidenceSummary {
            providence: providence.to_string(),
            found: false,
            error: Some("No documents found".to_string()),
            total_chunks: 0,
            sources: Vec::new(),
            dates: Vec::new(),
            years: Vec::new(),
            average_relevance: 0.0,
            max_relevance: 0.0,
            min_relevance: 0.0,
            unique_temas: Vec::new(),
            tema_count: 0,
            most_relevant_content: None,
        };
    }

    let sources: BTreeSet<&str> = documents
        .iter()
        .filter_map(|d| d.source.as_deref())
        .filter(|s| !s.is_empty())
        .collect();
    let dates: BTreeSet<&str> = documents
        .iter()
        .filter_map(|d| d.date.as_deref())
        .filter(|s| !s.is_empty())
        .collect();
    let years: BTreeSet<i64> = documents.iter().filter_map(|d| d.year).collect();
    let temas: BTreeSet<&str> = documents
        .iter()
        .flat_map(|d| d.temas.iter().map(String::as_str))
        .collect();
    let relevances: Vec<f64> = documents.iter().filter_map(|d| d.relevance).collect();

    #[allow(clippy::cast_precision_loss)]
    let average_relevance = if relevances.is_empty() {
        0.0
    } else {
        relevances.iter().sum::<f64>() / relevances.len() as f64
    };
    let max_relevance = relevances.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let min_relevance = relevances.iter().copied().reduce(f64::min).unwrap_or(0.0);

    let most_relevant_content = if relevances.is_empty() {
        None
    } else {
        documents
            .iter()
            .max_by(|a, b| {
                a.relevance
                    .unwrap_or(0.0)
                    .total_cmp(&b.relevance.unwrap_or(0.0))
            })
            .map(|doc| MostRelevantContent {
                content: excerpt(doc.content.as_deref().unwrap_or_default()),
                relevance: doc.relevance.unwrap_or(0.0),
                tema_subtema: doc.tema_subtema_raw.clone(),
            })
    };

    let unique_temas: Vec<String> = temas.into_iter().map(str::to_string).collect();

    ProvidenceSummary {
        providence: providence.to_string(),
        found: true,
        error: None,
        total_chunks: documents.len(),
        sources: sources.into_iter().map(str::to_string).collect(),
        dates: dates.into_iter().map(str::to_string).collect(),
        years: years.into_iter().collect(),
        average_relevance,
        max_relevance,
        min_relevance,
        tema_count: unique_temas.len(),
        unique_temas,
        most_relevant_content,
    }
}

fn excerpt(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let mut out: String = content.chars().take(SUMMARY_CONTENT_CHARS).collect();
    out.push_str("...");
    out
}
