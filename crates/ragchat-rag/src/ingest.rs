//! Document ingestion: load, chunk, embed and store

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use ragchat_core::{ChatSession, Document, DocumentKind, EmbeddingProvider, Error, Result};

use crate::config::RagConfig;
use crate::index::VectorIndex;
use crate::loader;
use crate::splitter::TextSplitter;
use crate::store::IndexStore;

/// Outcome of a successful ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    pub kind: DocumentKind,
    pub pages: usize,
    pub chunks: usize,
    pub embedding_model: String,
    pub replaced_previous: bool,
}

impl IngestReport {
    pub fn status_message(&self) -> String {
        let mut message = format!(
            "✅ File indexed and ready to chat! {} ({} chunks from {} pages)",
            self.source, self.chunks, self.pages
        );
        if self.replaced_previous {
            message.push_str(
                "\nThe previously indexed document was discarded; earlier answers no longer apply.",
            );
        }
        message
    }
}

pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: IndexStore,
    splitter: TextSplitter,
    config: RagConfig,
}

impl Ingestor {
    pub fn new(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            embedder,
            store: IndexStore::new(config.index_dir.clone()),
            splitter,
            config,
        })
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Index the file at `path`, replacing any existing index.
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport> {
        let document = loader::load_file(path).await?;
        self.ingest_document(document).await
    }

    /// Save uploaded bytes under the uploads directory, then index them.
    pub async fn ingest_upload(&self, file_name: &str, bytes: &[u8]) -> Result<IngestReport> {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::DocumentLoad(format!("invalid upload name '{}'", file_name)))?;
        DocumentKind::from_path(Path::new(name))?;

        tokio::fs::create_dir_all(&self.config.uploads_dir).await?;
        let path: PathBuf = self.config.uploads_dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "saved upload");

        self.ingest(&path).await
    }

    /// Ingest on behalf of a chat session.
    ///
    /// The session loses its history and index marker up front. Afterwards it
    /// is marked indexed whenever a usable index is on disk, which after a
    /// failed ingest means the previous one.
    pub async fn ingest_for(&self, session: &mut ChatSession, path: &Path) -> Result<IngestReport> {
        session.begin_ingest();
        let result = self.ingest(path).await;

        if result.is_ok() || self.store.exists() {
            session.mark_indexed();
        }
        result
    }

    /// Delete the stored index and mark the session as having none.
    pub fn clear_index(&self, session: &mut ChatSession) -> Result<bool> {
        let removed = self.store.clear()?;
        session.mark_no_index();
        if removed {
            info!(dir = %self.store.dir().display(), "index removed");
        }
        Ok(removed)
    }

    pub async fn ingest_document(&self, document: Document) -> Result<IngestReport> {
        info!(
            source = %document.source,
            kind = %document.kind,
            bytes = document.bytes.len(),
            "ingesting document"
        );

        let pages = loader::extract_pages(&document)?;
        let chunks = self.splitter.split_pages(&document.source, &pages);
        if chunks.is_empty() {
            warn!(source = %document.source, "document has no text");
            return Err(Error::EmptyDocument(document.source));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(source = %document.source, error = %e, "embedding failed");
            match e {
                Error::EmbeddingFailure(message) => Error::EmbeddingFailure(message),
                other => Error::EmbeddingFailure(other.to_string()),
            }
        })?;

        let chunk_count = chunks.len();
        let index = VectorIndex::build(
            &document.source,
            self.embedder.model_id(),
            self.config.distance,
            chunks,
            vectors,
        )?;
        let replaced_previous = self.store.replace(&index)?;

        Ok(IngestReport {
            source: document.source,
            kind: document.kind,
            pages: pages.len(),
            chunks: chunk_count,
            embedding_model: self.embedder.model_id().to_string(),
            replaced_previous,
        })
    }
}
