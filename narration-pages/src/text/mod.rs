//! Text processing for narration: sentence boundaries and paragraph segmentation.

pub mod segmenter;
pub mod sentence;

pub use segmenter::{Segmenter, SegmenterOptions, segment, split_at_sentences};

use serde::{Deserialize, Serialize};

/// A paragraph of narration text within a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    /// Position within the page, starting at 0
    pub order_index: usize,
    /// Trimmed, non-empty text
    pub content: String,
}

impl Paragraph {
    /// Create a new paragraph.
    pub fn new(order_index: usize, content: String) -> Self {
        Self {
            order_index,
            content,
        }
    }
}

/// Number of characters (not bytes) in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Number of whitespace-separated words in `text`.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_creation() {
        let paragraph = Paragraph::new(2, "Hello world.".to_string());
        assert_eq!(paragraph.order_index, 2);
        assert_eq!(paragraph.content, "Hello world.");
    }

    #[test]
    fn test_paragraph_serializes_camel_case() {
        let paragraph = Paragraph::new(0, "Hi.".to_string());
        let json = serde_json::to_string(&paragraph).unwrap();
        assert_eq!(json, r#"{"orderIndex":0,"content":"Hi."}"#);
    }

    #[test]
    fn test_char_len_counts_hebrew_as_single_chars() {
        assert_eq!(char_len("שלום"), 4);
        assert_eq!("שלום".len(), 8);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\n\nthree "), 3);
        assert_eq!(word_count(""), 0);
    }
}
