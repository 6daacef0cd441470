//! CLI command implementations.
//!
//! Each command resolves its configuration, bridges into the async agent
//! and search layers on a private runtime, and renders the result.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use crate::agent::prompt::REJECTION_TEXT;
use crate::agent::tool::ToolSet;
use crate::agent::{AgentConfig, ConsultRequest, LegalAssistant, PromptSet, create_provider};
use crate::cli::output::{
    OutputFormat, format_cases, format_listings, format_providence_docs, format_reply,
    format_summary, format_tools,
};
use crate::cli::parser::{Cli, Commands};
use crate::error::{AgentError, CommandError, Result};
use crate::search::{
    AzureSearchClient, CaseQuery, CaseSearch, FilterValue, Filters, OpenAiEmbedder,
    ProvidenceListQuery, ProvidenceQuery, SearchConfig,
};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if configuration is missing, an argument is malformed
/// or a backend call fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ask {
            message,
            top_k,
            filters,
            filters_json,
            max_tool_iterations,
            prompt_dir,
        } => {
            let request = ConsultRequest {
                message: message.clone(),
                top_k: *top_k,
                filters: parse_filters(filters, filters_json.as_deref())?,
            };
            cmd_ask(&request, *max_tool_iterations, prompt_dir.as_deref(), format)
        }
        Commands::Search {
            query,
            top_k,
            filters,
        } => {
            let query = CaseQuery {
                query: query.clone(),
                top_k: *top_k,
                filters: parse_filters(filters, None)?,
            };
            let search = build_search()?;
            let docs = block_on(search.search_cases(&query))??;
            Ok(format_cases(&docs, format))
        }
        Commands::Providence { id, top_k, filters } => {
            let query = ProvidenceQuery {
                providence: id.clone(),
                top_k: *top_k,
                additional_filters: parse_filters(filters, None)?,
            };
            let search = build_search()?;
            let docs = block_on(search.search_by_providence(&query))??;
            Ok(format_providence_docs(&docs, format))
        }
        Commands::Summary { id } => {
            let search = build_search()?;
            let summary = block_on(search.providence_summary(id))??;
            Ok(format_summary(&summary, format))
        }
        Commands::Providences {
            limit,
            source,
            year,
        } => {
            let query = ProvidenceListQuery {
                limit: *limit,
                source: source.clone(),
                year: *year,
            };
            let search = build_search()?;
            let listings = block_on(search.list_providences(&query))??;
            Ok(format_listings(&listings, format))
        }
        Commands::Tools => Ok(format_tools(&ToolSet::legal_tools(), format)),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

// ==================== Helpers ====================

/// Runs a future to completion on a fresh runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;
    Ok(rt.block_on(future))
}

fn agent_config(
    max_tool_iterations: Option<usize>,
    prompt_dir: Option<&Path>,
) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder();
    if let Some(n) = max_tool_iterations {
        builder = builder.max_tool_iterations(n);
    }
    if let Some(dir) = prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into()
    })
}

fn build_search() -> Result<Arc<dyn CaseSearch>> {
    let agent = agent_config(None, None)?;
    build_search_with(&agent)
}

fn build_search_with(agent: &AgentConfig) -> Result<Arc<dyn CaseSearch>> {
    let search = SearchConfig::from_env()?;
    let embedder = OpenAiEmbedder::new(agent, &search)?;
    let client = AzureSearchClient::new(search, Arc::new(embedder))?;
    Ok(Arc::new(client))
}

/// Parses one `field=value` argument.
fn parse_filter_pair(raw: &str) -> Result<(String, FilterValue)> {
    let (field, value) = raw.split_once('=').ok_or_else(|| {
        CommandError::InvalidArgument(format!("filter `{raw}` must look like field=value"))
    })?;
    let field = field.trim();
    if field.is_empty() {
        return Err(CommandError::InvalidArgument(format!("filter `{raw}` has no field name")).into());
    }
    Ok((field.to_string(), FilterValue::parse_loose(value.trim())))
}

/// Merges `--filters-json` and `--filter` arguments; pairs win on conflict.
/// Returns `None` when no filter was given.
fn parse_filters(pairs: &[String], json: Option<&str>) -> Result<Option<Filters>> {
    let mut filters = match json {
        Some(raw) => serde_json::from_str::<Filters>(raw).map_err(|e| {
            CommandError::InvalidArgument(format!(
                "--filters-json must be an object of scalar values: {e}"
            ))
        })?,
        None => Filters::new(),
    };
    for pair in pairs {
        let (field, value) = parse_filter_pair(pair)?;
        filters.insert(field, value);
    }
    Ok((!filters.is_empty()).then_some(filters))
}

// ==================== Commands ====================

fn cmd_ask(
    request: &ConsultRequest,
    max_tool_iterations: Option<usize>,
    prompt_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    // Blank input never needs credentials.
    if request.message.trim().is_empty() {
        return Ok(format!("{REJECTION_TEXT}\n"));
    }

    let config = agent_config(max_tool_iterations, prompt_dir)?;
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let search = build_search_with(&config)?;
    let prompts = PromptSet::load(config.prompt_dir.as_deref());
    let assistant = LegalAssistant::new(Arc::from(provider), search, &config, &prompts);

    let consultation = block_on(assistant.consult(request))?.map_err(|e| match e {
        AgentError::InvalidRequest { message } => CommandError::InvalidArgument(message),
        other => CommandError::ExecutionFailed(format!("Consultation failed: {other}")),
    })?;

    Ok(format_reply(consultation.reply(), format))
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(Path::to_path_buf)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                output.push_str("  ");
                output.push_str(name);
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize the assistant's prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>(),
            });
            Ok(format.to_json(&json))
        }
    }
}
