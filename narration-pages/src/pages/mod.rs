//! Page model and page assembly from chapter text plus break candidates.

pub mod assembler;

pub use assembler::{assemble, assemble_chapter, group_breaks};

use crate::text::Paragraph;
use serde::{Deserialize, Serialize};

/// A chapter of plain text in spine order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Chapter number as used by break candidates
    pub chapter_number: u32,
    /// Chapter title
    #[serde(default)]
    pub title: String,
    /// Plain text content, paragraphs separated by blank lines
    pub content: String,
}

impl Chapter {
    /// Create a new chapter.
    pub fn new(chapter_number: u32, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            chapter_number,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Length of the content in characters, the unit break positions use.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Kind of page break reported by the break detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakType {
    Explicit,
    Structural,
    Stylistic,
    Semantic,
    Computed,
}

/// A candidate page break inside a chapter.
///
/// Only `position` and `chapter_number` drive assembly; the rest is carried
/// through to the emitted pages untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreakCandidate {
    /// Character offset into the chapter content
    pub position: usize,
    #[serde(rename = "type")]
    pub break_type: BreakType,
    /// Detector confidence between 0 and 1
    pub confidence: f32,
    #[serde(default)]
    pub reason: String,
    pub chapter_number: u32,
}

impl PageBreakCandidate {
    /// Create a candidate with full confidence and no reason.
    pub fn new(chapter_number: u32, position: usize, break_type: BreakType) -> Self {
        Self {
            position,
            break_type,
            confidence: 1.0,
            reason: String::new(),
            chapter_number,
        }
    }
}

/// The breaks that delimit a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_break: Option<PageBreakCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_break: Option<PageBreakCandidate>,
}

/// A page of paragraphs cut from one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based, increasing across the whole book
    pub page_number: u32,
    pub source_chapter: u32,
    /// Character offset of the page start in the chapter
    pub start_position: usize,
    /// Character offset one past the page end in the chapter
    pub end_position: usize,
    pub break_info: BreakInfo,
    pub paragraphs: Vec<Paragraph>,
}
