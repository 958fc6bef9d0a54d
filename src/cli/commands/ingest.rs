//! Ingest command implementation.

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{IngestReport, OutputFormat, get_formatter};
use crate::models::{Config, ContentSource};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// File to ingest; reads stdin when omitted or '-'
    pub file: Option<PathBuf>,

    #[arg(long, short = 'o', env = "MIRROR_OWNER", help = "Owner the content belongs to")]
    pub owner: String,

    #[arg(
        long,
        short = 's',
        default_value = "user",
        help = "Content source tag: user, web, notion, or youtube"
    )]
    pub source: ContentSource,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let text = read_input(args.file.as_deref())?;

    if verbose {
        eprintln!("Owner: {}", args.owner);
        eprintln!("  Source: {}", args.source);
        eprintln!("  Input: {} chars", text.chars().count());
        eprintln!("  Chunk size: {} chars", config.ingestion.max_chunk_chars);
    }

    let pipeline = super::build_pipeline(&config).await?;
    let document = pipeline
        .ingest(&args.owner, args.source, &text)
        .await
        .context("ingest failed")?;

    let report = IngestReport {
        document,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };
    print!("{}", formatter.format_ingest(&report));

    Ok(())
}

fn read_input(file: Option<&std::path::Path>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
