//! Output formatting for CLI commands.

use std::fmt::Write as FmtWrite;

use clap::ValueEnum;
use console::style;

use crate::models::{Document, DocumentText};
use crate::store::StoreStats;
use crate::utils::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct IngestReport {
    /// None when the input was empty and nothing was created.
    pub document: Option<Document>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub owner_id: String,
    pub query: String,
    pub answer: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub store_driver: String,
    pub store_healthy: bool,
    pub stats: StoreStats,
    pub embedding_model: String,
    pub embedding_key_set: bool,
    pub rerank_model: String,
    pub generation_model: String,
    pub generation_key_set: bool,
}

pub trait Formatter {
    fn format_ingest(&self, report: &IngestReport) -> String;
    fn format_chat(&self, reply: &ChatReply) -> String;
    fn format_documents(&self, owner_id: &str, documents: &[DocumentText]) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest(&self, report: &IngestReport) -> String {
        match &report.document {
            Some(document) => format!(
                "Ingested document {} (source: {}, owner: {}) in {}ms\n",
                style(&document.id).bold(),
                document.source,
                document.owner_id,
                report.duration_ms
            ),
            None => "Nothing to ingest: input was empty.\n".to_string(),
        }
    }

    fn format_chat(&self, reply: &ChatReply) -> String {
        format!("{}\n", reply.answer)
    }

    fn format_documents(&self, owner_id: &str, documents: &[DocumentText]) -> String {
        if documents.is_empty() {
            return format!("No documents stored for owner: {owner_id}\n");
        }

        let mut output = String::new();
        writeln!(
            output,
            "{} documents for owner {}\n",
            documents.len(),
            style(owner_id).bold()
        )
        .unwrap();

        for (i, document) in documents.iter().enumerate() {
            writeln!(
                output,
                "{}. [{}] {}",
                i + 1,
                document.source,
                style(&document.document_id).dim()
            )
            .unwrap();
            writeln!(output, "   Created: {}", document.created_at).unwrap();

            let preview = truncate_chars(&document.content, 200);
            let suffix = if document.content.chars().count() > 200 {
                "..."
            } else {
                ""
            };
            writeln!(output, "   {preview}{suffix}\n").unwrap();
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "{}", style("Store").bold()).unwrap();
        writeln!(output, "  Driver: {}", status.store_driver).unwrap();
        writeln!(
            output,
            "  Healthy: {}",
            if status.store_healthy { "yes" } else { "no" }
        )
        .unwrap();
        writeln!(output, "  Documents: {}", status.stats.documents).unwrap();
        writeln!(output, "  Chunks: {}", status.stats.chunks).unwrap();
        writeln!(output, "{}", style("Capabilities").bold()).unwrap();
        writeln!(
            output,
            "  Embedding: {} (key {})",
            status.embedding_model,
            if status.embedding_key_set { "set" } else { "missing" }
        )
        .unwrap();
        writeln!(output, "  Rerank: {}", status.rerank_model).unwrap();
        writeln!(
            output,
            "  Generation: {} (key {})",
            status.generation_model,
            if status.generation_key_set { "set" } else { "missing" }
        )
        .unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{message}\n")
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap()
        } else {
            serde_json::to_string(value).unwrap()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest(&self, report: &IngestReport) -> String {
        let json = serde_json::json!({
            "document": report.document,
            "duration_ms": report.duration_ms,
        });
        self.render(&json)
    }

    fn format_chat(&self, reply: &ChatReply) -> String {
        let json = serde_json::json!({
            "owner_id": reply.owner_id,
            "query": reply.query,
            "answer": reply.answer,
            "duration_ms": reply.duration_ms,
        });
        self.render(&json)
    }

    fn format_documents(&self, owner_id: &str, documents: &[DocumentText]) -> String {
        let json = serde_json::json!({
            "owner_id": owner_id,
            "documents": documents,
        });
        self.render(&json)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "store": {
                "driver": status.store_driver,
                "healthy": status.store_healthy,
                "documents": status.stats.documents,
                "chunks": status.stats.chunks,
            },
            "capabilities": {
                "embedding_model": status.embedding_model,
                "embedding_key_set": status.embedding_key_set,
                "rerank_model": status.rerank_model,
                "generation_model": status.generation_model,
                "generation_key_set": status.generation_key_set,
            }
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        self.render(&serde_json::json!({ "message": message }))
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
