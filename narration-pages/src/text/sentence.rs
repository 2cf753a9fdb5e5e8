//! Bilingual (Latin + Hebrew) sentence boundary detection.
//!
//! A sentence ends at `.`, `!` or `?`, optionally followed by closing quotes or
//! brackets. It only counts as a boundary when the next non-space character
//! opens a new sentence (an uppercase Latin letter or a Hebrew letter) or when
//! nothing but whitespace follows. Lowercase continuations such as `e.g. this`
//! are therefore not split.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Terminal punctuation plus any closing marks that hug it.
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?]["'“”‘’)\]]*"#).expect("sentence end regex should compile")
});

/// Same as `SENTENCE_END`, anchored to the end of the text.
static TRAILING_SENTENCE_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?]["'“”‘’)\]]*$"#).expect("trailing sentence end regex should compile")
});

/// Whitespace followed by a capital Latin letter or a Hebrew letter (alef..tav).
static SENTENCE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+[A-Z\x{05D0}-\x{05EA}]").expect("sentence start regex should compile")
});

/// Check whether the trimmed text ends with terminal punctuation.
pub fn ends_with_complete_sentence(text: &str) -> bool {
    TRAILING_SENTENCE_END.is_match(text.trim())
}

/// Byte offsets just past every sentence boundary in `text`, ascending.
pub fn sentence_boundaries(text: &str) -> Vec<usize> {
    SENTENCE_END
        .find_iter(text)
        .filter(|m| opens_new_sentence(&text[m.end()..]))
        .map(|m| m.end())
        .collect()
}

/// Byte offset just past the last sentence boundary, if there is one.
pub fn find_last_sentence_boundary(text: &str) -> Option<usize> {
    sentence_boundaries(text).last().copied()
}

/// Split trimmed text into the part that ends on a sentence boundary and the
/// incomplete tail after it.
///
/// Text that already ends a sentence has an empty tail. Text without any
/// boundary is returned whole, also with an empty tail.
pub fn split_at_last_boundary(text: &str) -> (&str, &str) {
    let trimmed = text.trim();

    if ends_with_complete_sentence(trimmed) {
        return (trimmed, "");
    }

    match find_last_sentence_boundary(trimmed) {
        Some(end) => (trimmed[..end].trim_end(), trimmed[end..].trim()),
        None => {
            debug!(
                "No sentence boundary in {} chars, keeping text as-is",
                trimmed.chars().count()
            );
            (trimmed, "")
        }
    }
}

/// Cut text back to its last complete sentence.
///
/// Falls back to the unmodified (trimmed) text when no boundary exists.
pub fn complete_paragraph_at_sentence_boundary(text: &str) -> &str {
    split_at_last_boundary(text).0
}

fn opens_new_sentence(rest: &str) -> bool {
    rest.trim().is_empty() || SENTENCE_START.is_match(rest)
}
