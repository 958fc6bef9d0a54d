mod chunker;
mod embedding;
mod generation;
mod pipeline;
mod reranker;
mod responder;
mod retriever;

pub use chunker::TextChunker;
pub use embedding::{Embedder, VoyageEmbeddings};
pub use generation::{AnthropicGenerator, Generator, answer_prompt};
pub use pipeline::Pipeline;
pub use reranker::{Reranker, VoyageReranker};
pub use responder::Responder;
pub use retriever::Retriever;
