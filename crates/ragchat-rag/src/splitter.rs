//! Overlapping character-window chunking

use ragchat_core::{Chunk, Error, Page, Result};

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "invalid chunking: size {} with overlap {}",
                chunk_size, chunk_overlap
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Cut `text` into windows of `chunk_size` characters, each starting
    /// `chunk_size - chunk_overlap` after the previous one. The last window
    /// ends at the end of the text.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut windows = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            windows.push(chars[start..end].iter().collect());

            if end >= chars.len() {
                break;
            }

            start = end - self.chunk_overlap;
        }

        windows
    }

    /// Chunk every page of a document, numbering chunks across pages.
    /// Whitespace-only windows are dropped.
    pub fn split_pages(&self, source: &str, pages: &[Page]) -> Vec<Chunk> {
        let source_hash = md5::compute(source.as_bytes());
        let mut chunks = Vec::new();

        for page in pages {
            for text in self.split_text(&page.text) {
                if text.trim().is_empty() {
                    continue;
                }
                let index = chunks.len();
                chunks.push(Chunk {
                    id: format!("{:x}-{}", source_hash, index),
                    text,
                    source: source.to_string(),
                    page: page.number,
                    index,
                });
            }
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_windows(len: usize, size: usize, overlap: usize) -> usize {
        if len == 0 {
            0
        } else if len <= size {
            1
        } else {
            (len - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn test_window_count_matches_formula() {
        let splitter = TextSplitter::default();
        for len in [0, 1, 499, 500, 501, 950, 951, 1400, 1401, 5000] {
            let text = "a".repeat(len);
            assert_eq!(
                splitter.split_text(&text).len(),
                expected_windows(len, 500, 50),
                "length {}",
                len
            );
        }
    }

    #[test]
    fn test_windows_overlap_and_cover_text() {
        let splitter = TextSplitter::new(10, 3).unwrap();
        let text: String = ('a'..='z').collect();
        let windows = splitter.split_text(&text);

        assert_eq!(windows[0], "abcdefghij");
        assert_eq!(windows[1], "hijklmnopq");
        assert!(windows.iter().all(|w| w.chars().count() <= 10));
        assert!(windows.last().unwrap().ends_with('z'));
        for pair in windows.windows(2) {
            let tail: String = pair[0].chars().skip(7).collect();
            assert!(pair[1].starts_with(&tail));
        }
    }

    #[test]
    fn test_multibyte_text_splits_on_characters() {
        let splitter = TextSplitter::new(4, 1).unwrap();
        let windows = splitter.split_text("日本語のテキスト");
        assert_eq!(windows[0], "日本語の");
        assert_eq!(windows[1], "のテキス");
    }

    #[test]
    fn test_split_pages_numbers_across_pages_and_skips_blank() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let pages = vec![
            Page { number: 1, text: "first page".to_string() },
            Page { number: 2, text: "   \n  ".to_string() },
            Page { number: 3, text: "third page".to_string() },
        ];
        let chunks = splitter.split_pages("doc.txt", &pages);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 3);
        assert_eq!(chunks[1].index, 1);
        assert!(chunks[1].id.ends_with("-1"));
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(50, 50).is_err());
        assert!(TextSplitter::new(50, 49).is_ok());
    }
}
