//! Flat on-disk vector index
//!
//! An index directory holds two JSON files: `entries.json` with every chunk
//! and its vector, and `manifest.json` describing how the vectors were made.
//! The manifest is written last, so a directory without one is never treated
//! as a usable index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use ragchat_core::{Chunk, DistanceMetric, Error, Result, SearchHit};

pub const INDEX_FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";
pub const ENTRIES_FILE: &str = "entries.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub distance: DistanceMetric,
    pub chunk_count: usize,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Pair chunks with their vectors. All vectors must share one dimension.
    pub fn build(
        source: &str,
        embedding_model: &str,
        distance: DistanceMetric,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyDocument(source.to_string()));
        }
        if chunks.len() != vectors.len() {
            return Err(Error::EmbeddingFailure(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimension = vectors[0].len();
        if dimension == 0 {
            return Err(Error::EmbeddingFailure("embedding has no dimensions".to_string()));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(Error::EmbeddingFailure(format!(
                "inconsistent embedding dimensions: {} and {}",
                dimension,
                bad.len()
            )));
        }

        let manifest = IndexManifest {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: embedding_model.to_string(),
            dimension,
            distance,
            chunk_count: chunks.len(),
            source: source.to_string(),
            created_at: Utc::now(),
        };
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        Ok(Self { manifest, entries })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` nearest chunks, closest first. Ties keep document order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.manifest.dimension {
            return Err(Error::RetrievalFailure(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.manifest.dimension
            )));
        }

        let metric = self.manifest.distance;
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                chunk: entry.chunk.clone(),
                distance: metric.distance(query, &entry.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        Ok(hits)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(ENTRIES_FILE), serde_json::to_vec(&self.entries)?)?;
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&self.manifest)?,
        )?;
        debug!(dir = %dir.display(), chunks = self.entries.len(), "saved index");
        Ok(())
    }

    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILE).is_file()
    }

    pub fn load(dir: &Path) -> Result<Self> {
        if !Self::exists(dir) {
            return Err(Error::IndexUnavailable(format!(
                "no index found at {}",
                dir.display()
            )));
        }

        let manifest: IndexManifest = read_json(&dir.join(MANIFEST_FILE))?;
        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(Error::RetrievalFailure(format!(
                "index format {} is not supported (expected {})",
                manifest.format_version, INDEX_FORMAT_VERSION
            )));
        }

        let entries: Vec<IndexEntry> = read_json(&dir.join(ENTRIES_FILE))?;
        if entries.len() != manifest.chunk_count {
            return Err(Error::RetrievalFailure(format!(
                "index lists {} chunks but holds {}",
                manifest.chunk_count,
                entries.len()
            )));
        }

        Ok(Self { manifest, entries })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)
        .map_err(|e| Error::RetrievalFailure(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::RetrievalFailure(format!("corrupt {}: {}", path.display(), e)))
}
