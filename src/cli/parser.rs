//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::agent::tool::{PROVIDENCE_DEFAULT_TOP_K, SEARCH_CASES_DEFAULT_TOP_K};
use crate::search::DEFAULT_LIST_LIMIT;

/// Legal consultor: conversational legal assistant over a case-law index.
///
/// Answers questions in Spanish with citations to the rulings it retrieved.
#[derive(Parser, Debug)]
#[command(name = "legal-consultor")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Log format on stderr (text, json).
    #[arg(long, default_value = "text", global = true, env = "LEGAL_LOG_FORMAT")]
    pub log_format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the assistant a legal question.
    ///
    /// Runs the full tool-calling loop and prints the final answer.
    #[command(after_help = r#"Examples:
  legal-consultor ask "¿Me pueden despedir estando embarazada?"
  legal-consultor ask "tutela salud" -k 3 --filter year=2024
  legal-consultor ask "pensión" --filters-json '{"source":"corte"}'
  legal-consultor --format json ask "¿Qué es una tutela?" | jq .citations
"#)]
    Ask {
        /// The question.
        message: String,

        /// Result-count limit applied to retrieval tools.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Equality filter (`field=value`), repeatable.
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,

        /// Filters as a JSON object; merged under `--filter` entries.
        #[arg(long, value_name = "JSON")]
        filters_json: Option<String>,

        /// Maximum tool-calling rounds before the answer is forced.
        #[arg(long)]
        max_tool_iterations: Option<usize>,

        /// Directory containing prompt template files.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,
    },

    /// Hybrid search over the case-law index.
    #[command(after_help = r#"Examples:
  legal-consultor search "despido sin justa causa"
  legal-consultor search "derecho a la salud" -k 10 --filter year=2023
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'k', long, default_value_t = SEARCH_CASES_DEFAULT_TOP_K)]
        top_k: usize,

        /// Equality filter (`field=value`), repeatable.
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
    },

    /// Fetch the fragments of one ruling.
    Providence {
        /// Ruling identifier, e.g. `T-123/2024`.
        id: String,

        /// Maximum number of fragments.
        #[arg(short = 'k', long, default_value_t = PROVIDENCE_DEFAULT_TOP_K)]
        top_k: usize,

        /// Additional equality filter (`field=value`), repeatable.
        #[arg(long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
    },

    /// Summarize one ruling.
    Summary {
        /// Ruling identifier.
        id: String,
    },

    /// List distinct rulings in the index.
    Providences {
        /// Maximum rulings to list.
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,

        /// Restrict to one source.
        #[arg(long)]
        source: Option<String>,

        /// Restrict to one year.
        #[arg(long)]
        year: Option<i64>,
    },

    /// List the tools offered to the model.
    Tools,

    /// Write default prompt templates to disk for customization.
    ///
    /// Existing files are never overwritten.
    #[command(after_help = r#"Examples:
  legal-consultor init-prompts                     # Write to ~/.config/legal-consultor/prompts/
  legal-consultor init-prompts --dir ./prompts     # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/legal-consultor/prompts/`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
