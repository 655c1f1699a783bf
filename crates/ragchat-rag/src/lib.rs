//! Retrieval-augmented generation pipeline for ragchat
//!
//! Documents are split into pages and overlapping character windows,
//! embedded, and stored as a single flat index on disk. Questions are
//! embedded the same way, matched against the index, and answered by a
//! text-generation model using the closest chunks as context.

pub mod config;
pub mod embedder;
pub mod engine;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod prompt;
pub mod splitter;
pub mod store;


pub use config::{EmbeddingBackend, RagConfig};
pub use embedder::HashingEmbedder;
pub use engine::{Answer, QueryEngine, Reply};
pub use index::{IndexEntry, IndexManifest, VectorIndex};
pub use ingest::{IngestReport, Ingestor};
pub use splitter::TextSplitter;
pub use store::IndexStore;

// Re-export core types
pub use ragchat_core::{
    AnswerMode, ChatSession, ConversationTurn, DistanceMetric, EmbeddingProvider, Error,
    IndexState, LLMProvider, Result, SearchHit, TokenSink,
};
