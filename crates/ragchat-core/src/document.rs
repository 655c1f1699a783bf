//! Document, page and chunk types

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Parser selection for an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Parse from a file extension, case-insensitively
    pub fn from_extension(ext: &str) -> Option<DocumentKind> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "text" | "md" => Some(DocumentKind::Text),
            _ => None,
        }
    }

    /// Select the kind from a path's extension.
    pub fn from_path(path: &Path) -> Result<DocumentKind> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentKind::from_extension)
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("'{}' is neither PDF nor plain text", path.display()))
            })
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Text => write!(f, "text"),
        }
    }
}

/// Raw uploaded bytes plus their declared type. Lives for one ingest call.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

/// Text extracted from one page, numbered from 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub text: String,
}

/// A bounded span of document text; the retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: usize,
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_extension("docx"), None);
    }

    #[test]
    fn test_kind_from_path_rejects_unknown() {
        let err = DocumentKind::from_path(&PathBuf::from("notes.docx")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = DocumentKind::from_path(&PathBuf::from("README")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        assert_eq!(
            DocumentKind::from_path(&PathBuf::from("docs/report.Pdf")).unwrap(),
            DocumentKind::Pdf
        );
    }
}
