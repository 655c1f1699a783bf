//! Offline feature-hashing embedder

use async_trait::async_trait;

use ragchat_core::{EmbeddingProvider, Result};

pub const DEFAULT_DIMENSION: usize = 384;

/// Bag-of-words plus bigram features hashed into a fixed number of buckets.
///
/// Buckets come from an MD5 digest, so vectors are identical across runs
/// and platforms and a saved index stays queryable.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("local/hashing-{}", dimension),
        }
    }

    fn bucket(&self, feature: &str) -> usize {
        let digest = md5::compute(feature.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.0[..8]);
        (u64::from_le_bytes(bytes) % self.dimension as u64) as usize
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized_text = text.to_lowercase();
        let words: Vec<&str> = normalized_text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut embedding = vec![0.0; self.dimension];

        for word in &words {
            embedding[self.bucket(word)] += 1.0;
        }

        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            embedding[self.bucket(&bigram)] += 0.8;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::cosine_similarity;

    #[test]
    fn test_vectors_are_deterministic_and_normalised() {
        let embedder = HashingEmbedder::new();
        let a = embedder.embed_text("Paris is the capital of France.");
        let b = embedder.embed_text("Paris is the capital of France.");

        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::new();
        let query = embedder.embed_text("What is the capital of France?");
        let related = embedder.embed_text("Paris is the capital of France.");
        let unrelated = embedder.embed_text("Sky glows blue over quiet hills.");

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::with_dimension(16);
        assert!(embedder.embed_text("  ...  ").iter().all(|v| *v == 0.0));
        assert_eq!(embedder.model_id(), "local/hashing-16");
    }

    #[tokio::test]
    async fn test_embed_batch_matches_single() {
        let embedder = HashingEmbedder::new();
        let texts = vec!["one".to_string(), "two words".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[1], embedder.embed("two words").await.unwrap());
    }
}
