//! Chat command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{ChatReply, OutputFormat, get_formatter};
use crate::models::Config;

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(required = true, help = "Question to ask")]
    pub query: String,

    #[arg(long, short = 'o', env = "MIRROR_OWNER", help = "Owner whose content grounds the answer")]
    pub owner: String,
}

pub async fn handle_chat(args: ChatArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("query cannot be empty");
    }

    let config = Config::load()?;
    config.validate()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    if verbose {
        eprintln!("Owner: {}", args.owner);
        eprintln!("  Top-k: {}", config.chat.top_k);
        eprintln!("  Context budget: {} chars", config.chat.max_context_chars);
    }

    let pipeline = super::build_pipeline(&config).await?;
    let answer = pipeline
        .respond(&args.owner, query)
        .await
        .context("chat failed")?;

    let reply = ChatReply {
        owner_id: args.owner,
        query: query.to_string(),
        answer,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };
    print!("{}", formatter.format_chat(&reply));

    Ok(())
}
