//! Sources command implementation: list an owner's stored documents.

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::models::{Config, ContentSource};
use crate::store::{DocumentStore, create_store};

#[derive(Debug, Args)]
pub struct SourcesArgs {
    #[arg(long, short = 'o', env = "MIRROR_OWNER", help = "Owner whose documents to list")]
    pub owner: String,

    #[arg(long, short = 's', help = "Only documents from this source tag")]
    pub source: Option<ContentSource>,
}

pub async fn handle_sources(args: SourcesArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    // Listing only touches the store; no capability clients needed.
    let store = create_store(&config.storage, config.embedding.dimension)
        .await
        .context("failed to open document store")?;

    let documents = store
        .documents_text(&args.owner, args.source)
        .await
        .context("failed to list documents")?;

    print!("{}", formatter.format_documents(&args.owner, &documents));

    Ok(())
}
