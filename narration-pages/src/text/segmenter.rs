//! Paragraph segmentation for narration.
//!
//! Blank-line separated chunks are merged greedily until a paragraph reaches
//! its target size, then closed on a sentence boundary. Anything longer than
//! twice the character target is re-cut at sentence boundaries instead.

use super::sentence::{ends_with_complete_sentence, sentence_boundaries, split_at_last_boundary};
use super::{Paragraph, char_len, word_count};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

/// Default target paragraph size in characters.
pub const DEFAULT_TARGET_CHARS: usize = 750;

/// Default target paragraph size in words.
pub const DEFAULT_TARGET_WORDS: usize = 150;

/// Separator placed between merged chunks.
const CHUNK_SEPARATOR: &str = "\n\n";

static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line regex should compile"));

/// Size targets for the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterOptions {
    /// Characters a paragraph should reach before it is considered full
    pub target_chars: usize,
    /// Words a paragraph should reach before it is considered full
    pub target_words: usize,
    /// Keep the incomplete tail cut off by sentence completion and prepend it
    /// to the next paragraph instead of dropping it
    pub carry_forward_fragments: bool,
}

impl Default for SegmenterOptions {
    fn default() -> Self {
        Self {
            target_chars: DEFAULT_TARGET_CHARS,
            target_words: DEFAULT_TARGET_WORDS,
            carry_forward_fragments: false,
        }
    }
}

impl SegmenterOptions {
    /// Create options with the given targets and fragments dropped.
    pub fn new(target_chars: usize, target_words: usize) -> Self {
        Self {
            target_chars,
            target_words,
            carry_forward_fragments: false,
        }
    }

    /// Hard ceiling: no paragraph may grow past this many characters.
    pub fn ceiling(&self) -> usize {
        self.target_chars.saturating_mul(2)
    }

    /// Either threshold being met counts as full.
    fn target_reached(&self, text: &str) -> bool {
        char_len(text) >= self.target_chars || word_count(text) >= self.target_words
    }
}

/// Splits page-level text spans into paragraphs.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    options: SegmenterOptions,
}

impl Segmenter {
    /// Create a segmenter with the given options.
    pub fn new(options: SegmenterOptions) -> Self {
        Self { options }
    }

    /// The options this segmenter was built with.
    pub fn options(&self) -> &SegmenterOptions {
        &self.options
    }

    /// Segment a text span into ordered paragraphs.
    ///
    /// Empty or whitespace-only input yields no paragraphs.
    pub fn segment(&self, text: &str) -> Vec<Paragraph> {
        let ceiling = self.options.ceiling();
        let mut emitted: Vec<String> = Vec::new();
        let mut buffer = String::new();

        for chunk in split_blank_lines(text) {
            if buffer.is_empty() {
                buffer = chunk.to_string();
            } else {
                let test = format!("{buffer}{CHUNK_SEPARATOR}{chunk}");

                if char_len(&test) > ceiling {
                    trace!(
                        "Merging would exceed ceiling ({} > {}), closing paragraph",
                        char_len(&test),
                        ceiling
                    );
                    let tail = self.finalize(&buffer, &mut emitted);
                    buffer = start_buffer(tail, chunk);
                } else if self.options.target_reached(&buffer) {
                    if ends_with_complete_sentence(&buffer) {
                        self.finalize(&buffer, &mut emitted);
                        buffer = chunk.to_string();
                    } else if ends_with_complete_sentence(&test) {
                        trace!("Next chunk completes the sentence, closing merged paragraph");
                        self.finalize(&test, &mut emitted);
                        buffer.clear();
                    } else {
                        debug!("Target reached mid-sentence, closing at last sentence boundary");
                        let tail = self.finalize(&buffer, &mut emitted);
                        buffer = start_buffer(tail, chunk);
                    }
                } else {
                    buffer = test;
                }
            }

            if char_len(&buffer) > ceiling {
                debug!(
                    "Paragraph of {} chars exceeds ceiling {}, forcing split",
                    char_len(&buffer),
                    ceiling
                );
                let tail = self.finalize(&buffer, &mut emitted);
                buffer = tail.unwrap_or_default();
            }
        }

        if !buffer.trim().is_empty() {
            if let Some(tail) = self.finalize(&buffer, &mut emitted) {
                trace!("Keeping terminal fragment of {} chars", char_len(&tail));
                emitted.push(tail);
            }
        }

        emitted
            .iter()
            .map(|content| content.trim())
            .filter(|content| !content.is_empty())
            .enumerate()
            .map(|(order_index, content)| Paragraph::new(order_index, content.to_string()))
            .collect()
    }

    /// Emit a candidate paragraph, returning the incomplete tail to carry
    /// forward when fragments are kept.
    fn finalize(&self, candidate: &str, emitted: &mut Vec<String>) -> Option<String> {
        if char_len(candidate) > self.options.ceiling() {
            let parts = split_at_sentences(
                candidate,
                self.options.target_chars,
                self.options.target_words,
            );
            debug!("Split oversized paragraph into {} parts", parts.len());
            emitted.extend(parts);
            return None;
        }

        let (complete, tail) = split_at_last_boundary(candidate);
        if !complete.is_empty() {
            emitted.push(complete.to_string());
        }

        if tail.is_empty() {
            None
        } else if self.options.carry_forward_fragments {
            trace!("Carrying {} chars forward", char_len(tail));
            Some(tail.to_string())
        } else {
            debug!("Discarding {} chars after last sentence boundary", char_len(tail));
            None
        }
    }
}

/// Segment `text` with the given options.
pub fn segment(text: &str, options: &SegmenterOptions) -> Vec<Paragraph> {
    Segmenter::new(*options).segment(text)
}

/// Re-cut text at sentence boundaries into chunks close to the targets.
///
/// Sentences are never truncated, so no content is dropped. A single sentence
/// longer than the targets becomes its own chunk, and text without any
/// boundary comes back as one chunk.
pub fn split_at_sentences(text: &str, target_chars: usize, target_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        if current.is_empty() {
            current = sentence.to_string();
            continue;
        }

        let merged_chars = char_len(&current) + 1 + char_len(sentence);
        let merged_words = word_count(&current) + word_count(sentence);

        if merged_chars > target_chars || merged_words > target_words {
            chunks.push(std::mem::take(&mut current));
            current = sentence.to_string();
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Cut text into trimmed sentences, keeping any unterminated remainder.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for end in sentence_boundaries(text) {
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let remainder = text[start..].trim();
    if !remainder.is_empty() {
        sentences.push(remainder);
    }

    sentences
}

/// Split on blank lines into trimmed, non-empty chunks.
fn split_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
}

fn start_buffer(carried: Option<String>, chunk: &str) -> String {
    match carried {
        Some(tail) => format!("{tail}{CHUNK_SEPARATOR}{chunk}"),
        None => chunk.to_string(),
    }
}
