//! Core traits and types for ragchat
//!
//! This crate defines the types shared by the ingest and query pipeline:
//! the error taxonomy, provider traits for embeddings and text generation,
//! document and chunk types, vector search types and the chat session.

pub mod llm;
pub mod embedding;
pub mod document;
pub mod vector_store;
pub mod session;
pub mod error;

pub use error::{Error, Result};
pub use llm::{LLMProvider, GenerationConfig, GenerationResult, TokenSink, strip_prompt_echo};
pub use embedding::EmbeddingProvider;
pub use document::{Document, DocumentKind, Page, Chunk};
pub use vector_store::{DistanceMetric, SearchHit, cosine_similarity};
pub use session::{ChatSession, ConversationTurn, AnswerMode, IndexState};
