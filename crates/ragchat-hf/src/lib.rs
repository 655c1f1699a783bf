//! Hugging Face Inference API integration for ragchat
//!
//! This crate provides the remote implementations of the `LLMProvider` and
//! `EmbeddingProvider` traits.

mod client;
mod config;
pub mod response;

#[cfg(test)]
mod tests;

pub use client::{HuggingFaceClient, HuggingFaceEmbeddings};
pub use config::{
    HuggingFaceConfig, DEFAULT_API_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
};

// Re-export core types for convenience
pub use ragchat_core::{
    EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider, Result,
};
