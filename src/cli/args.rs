//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    ask::AskArgs, claims::ClaimsArgs, completions::CompletionsArgs, config::ConfigCommands,
    sentiment::SentimentArgs, shell::ShellArgs, show::ShowArgs,
};
use crate::core::claim::StatusFilter;

#[derive(Parser)]
#[command(name = "cca")]
#[command(author, version, about = "Claims Assistant")]
#[command(long_about = "Browse AI-enriched healthcare claims, review sentiment statistics \
and ask questions answered by an LLM completion service.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Claim status filter: ALL, APPROVED, DENIED or PENDING
    #[arg(long, short = 's', global = true, default_value = "ALL")]
    pub status: StatusFilter,

    /// SQLite claims warehouse (default: from config, then ./claims.db)
    #[arg(long, global = true, env = "CCA_DATABASE")]
    pub database: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Headline metrics for the selected claims
    Overview,

    /// AI-enriched claims table
    Claims(ClaimsArgs),

    /// Full provider notes, summary and recommendation for one claim
    Show(ShowArgs),

    /// Sentiment statistics by status and label
    Sentiment(SentimentArgs),

    /// Ask a free-text question about the selected claims
    Ask(AskArgs),

    /// Interactive session that keeps results cached between commands
    Shell(ShellArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically pick a human-readable format
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just claim IDs, one per line
    Id,
}
