//! Page extraction for PDF and plain-text documents

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

use ragchat_core::{Document, DocumentKind, Error, Page, Result};

/// Form feed separates pages in plain-text exports
const PAGE_BREAK: char = '\u{000C}';

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid whitespace pattern"));

/// Read a file from disk, picking the parser from its extension.
///
/// The extension is checked before the file is opened.
pub async fn load_file(path: &Path) -> Result<Document> {
    let kind = DocumentKind::from_path(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::DocumentLoad(format!("{}: {}", path.display(), e)))?;

    Ok(Document {
        source: source_name(path),
        kind,
        bytes,
    })
}

/// Display name recorded on every chunk of a document
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Split a document into pages of text.
pub fn extract_pages(document: &Document) -> Result<Vec<Page>> {
    let pages = match document.kind {
        DocumentKind::Pdf => extract_pdf_pages(document)?,
        DocumentKind::Text => extract_text_pages(document)?,
    };
    debug!(source = %document.source, pages = pages.len(), "extracted pages");
    Ok(pages)
}

fn extract_text_pages(document: &Document) -> Result<Vec<Page>> {
    let text = std::str::from_utf8(&document.bytes).map_err(|e| {
        Error::DocumentLoad(format!("{} is not valid UTF-8: {}", document.source, e))
    })?;
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

    Ok(text
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| Page {
            number: i + 1,
            text: normalize_whitespace(page),
        })
        .collect())
}

fn extract_pdf_pages(document: &Document) -> Result<Vec<Page>> {
    let pdf = lopdf::Document::load_mem(&document.bytes).map_err(|e| {
        Error::DocumentLoad(format!("{} could not be parsed as PDF: {}", document.source, e))
    })?;

    let mut pages = Vec::new();
    for &number in pdf.get_pages().keys() {
        match pdf.extract_text(&[number]) {
            Ok(text) => pages.push(Page {
                number: number as usize,
                text: normalize_whitespace(&text),
            }),
            Err(e) => {
                warn!(source = %document.source, page = number, error = %e, "skipping unreadable page");
            }
        }
    }

    if pages.is_empty() {
        return Err(Error::DocumentLoad(format!(
            "{} has no readable pages",
            document.source
        )));
    }
    Ok(pages)
}

/// Collapse runs of spaces and tabs, normalise line endings
pub fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    HORIZONTAL_SPACE.replace_all(&text, " ").into_owned()
}
