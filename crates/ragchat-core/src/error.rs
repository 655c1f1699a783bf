//! Error types for ragchat

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the ingest and query pipeline can report.
///
/// Nothing here is retried. Each error is caught at the boundary of the
/// operation it occurred in and turned into a user-visible message via
/// [`Error::user_message`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not load document: {0}")]
    DocumentLoad(String),

    #[error("Empty document: {0}")]
    EmptyDocument(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Retrieval failed: {0}")]
    RetrievalFailure(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Remote API error{}: {message}", status_suffix(.status))]
    RemoteApi { status: Option<u16>, message: String },

    #[error("Index was built with embedding model '{indexed}' but the active model is '{active}'")]
    EmbeddingModelMismatch { indexed: String, active: String },

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl Error {
    /// Shorthand for a remote failure that carries an HTTP status.
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Error::RemoteApi {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Text suitable for showing in the chat transcript or a status line.
    pub fn user_message(&self) -> String {
        match self {
            Error::UnsupportedFormat(_) => {
                format!("❌ {}. Only PDF or TXT files are supported.", self)
            }
            Error::EmptyDocument(_) => {
                "❌ No usable content found in document after splitting.".to_string()
            }
            Error::EmbeddingFailure(_) => format!(
                "❌ {}. Try a smaller or simpler document.",
                self
            ),
            Error::IndexUnavailable(_) => {
                "⚠️ No document has been indexed yet. Ingest a PDF or TXT file first, or switch to plain mode."
                    .to_string()
            }
            Error::MissingCredentials(_) => format!(
                "⚠️ {}. Set HUGGINGFACEHUB_API_TOKEN to enable remote models.",
                self
            ),
            _ => format!("⚠️ {}", self),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
