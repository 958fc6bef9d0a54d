//! CLI transport adapter over the pipeline.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use output::OutputFormat;

/// Personal second-brain chat assistant.
#[derive(Debug, Parser)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        value_enum,
        help = "Output format: text or json"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest text for an owner (chunk, embed, store)
    Ingest(commands::IngestArgs),

    /// Ask a question grounded in an owner's stored content
    Chat(commands::ChatArgs),

    /// List an owner's stored documents
    Sources(commands::SourcesArgs),

    /// Check store health and capability configuration
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
