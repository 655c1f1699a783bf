//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use ragchat_core::{DistanceMetric, Error, Result};

/// Where chunk embeddings come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Deterministic hashing embedder, no network needed
    #[default]
    Local,
    /// Hosted sentence-transformers model
    HuggingFace,
}

impl EmbeddingBackend {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<EmbeddingBackend> {
        match s.to_lowercase().as_str() {
            "local" | "hash" | "hashing" => Some(EmbeddingBackend::Local),
            "huggingface" | "hf" | "remote" => Some(EmbeddingBackend::HuggingFace),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub index_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub distance: DistanceMetric,
    pub embedding_backend: EmbeddingBackend,
    pub memory: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("vectorstore"),
            uploads_dir: PathBuf::from("docs"),
            chunk_size: 500,
            chunk_overlap: 50,
            top_k: 4,
            distance: DistanceMetric::Euclidean,
            embedding_backend: EmbeddingBackend::Local,
            memory: false,
        }
    }
}

impl RagConfig {
    /// Create configuration from `RAGCHAT_*` environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let index_dir = lookup("RAGCHAT_INDEX_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.index_dir);
        let uploads_dir = lookup("RAGCHAT_UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.uploads_dir);

        let distance = match lookup("RAGCHAT_DISTANCE") {
            Some(raw) => DistanceMetric::from_str(&raw).ok_or_else(|| {
                Error::Configuration(format!("RAGCHAT_DISTANCE has invalid value '{}'", raw))
            })?,
            None => defaults.distance,
        };

        let embedding_backend = match lookup("RAGCHAT_EMBEDDINGS") {
            Some(raw) => EmbeddingBackend::from_str(&raw).ok_or_else(|| {
                Error::Configuration(format!("RAGCHAT_EMBEDDINGS has invalid value '{}'", raw))
            })?,
            None => defaults.embedding_backend,
        };

        let memory = match lookup("RAGCHAT_MEMORY") {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                Error::Configuration(format!("RAGCHAT_MEMORY has invalid value '{}'", raw))
            })?,
            None => defaults.memory,
        };

        let config = Self {
            index_dir,
            uploads_dir,
            chunk_size: parse_or(&lookup, "RAGCHAT_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_or(&lookup, "RAGCHAT_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_or(&lookup, "RAGCHAT_TOP_K", defaults.top_k)?,
            distance,
            embedding_backend,
            memory,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Configuration(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_default_config_snapshot() {
        assert_yaml_snapshot!(RagConfig::default(), @r###"
        index_dir: vectorstore
        uploads_dir: docs
        chunk_size: 500
        chunk_overlap: 50
        top_k: 4
        distance: euclidean
        embedding_backend: local
        memory: false
        "###);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = RagConfig::from_lookup(|key| match key {
            "RAGCHAT_INDEX_DIR" => Some("/tmp/idx".to_string()),
            "RAGCHAT_TOP_K" => Some("3".to_string()),
            "RAGCHAT_DISTANCE" => Some("cosine".to_string()),
            "RAGCHAT_EMBEDDINGS" => Some("hf".to_string()),
            "RAGCHAT_MEMORY" => Some("on".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.index_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.top_k, 3);
        assert_eq!(config.distance, DistanceMetric::Cosine);
        assert_eq!(config.embedding_backend, EmbeddingBackend::HuggingFace);
        assert!(config.memory);
        assert_eq!(config.chunk_size, 500);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let err = RagConfig::from_lookup(|key| match key {
            "RAGCHAT_CHUNK_SIZE" => Some("100".to_string()),
            "RAGCHAT_CHUNK_OVERLAP" => Some("100".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = RagConfig::from_lookup(|key| {
            (key == "RAGCHAT_EMBEDDINGS").then(|| "openai".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("RAGCHAT_EMBEDDINGS"));
    }
}
