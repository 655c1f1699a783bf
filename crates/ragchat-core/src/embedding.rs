//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Turns text into fixed-dimension vectors.
///
/// The `model_id` is recorded in every index built with the provider so that
/// a query-time embedder can be checked against the ingest-time one.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Identifier of the embedding model, e.g. `sentence-transformers/all-MiniLM-L6-v2`
    fn model_id(&self) -> &str;
}
