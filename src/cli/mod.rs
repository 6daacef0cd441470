//! CLI layer for legal-consultor.
//!
//! Provides the command-line interface using clap: one-shot consultations
//! plus direct access to the search tools.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
