//! Book-level parsing: run every chapter through page assembly and collect
//! the pages with summary statistics.

use crate::config::ParserConfig;
use crate::error::{PagerError, Result};
use crate::pages::assembler::warn_unmatched_breaks;
use crate::pages::{Chapter, Page, PageBreakCandidate, assemble_chapter, group_breaks};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Supplies chapters in spine order.
///
/// Extraction may fail per chapter; such chapters are skipped by the parser.
pub trait ChapterSource {
    /// Number of chapters in the source.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract the chapter at `index` (0-based spine position).
    fn chapter(&mut self, index: usize) -> Result<Chapter>;
}

impl ChapterSource for &[Chapter] {
    fn len(&self) -> usize {
        <[Chapter]>::len(self)
    }

    fn chapter(&mut self, index: usize) -> Result<Chapter> {
        self.get(index).cloned().ok_or_else(|| PagerError::Extraction {
            chapter: index as u32 + 1,
            message: "chapter index out of bounds".to_string(),
        })
    }
}

/// All pages of a book plus summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub pages: Vec<Page>,
    pub total_pages: usize,
    pub total_paragraphs: usize,
    pub average_paragraphs_per_page: f64,
}

impl ParseResult {
    /// Compute statistics over the given pages.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let total_pages = pages.len();
        let total_paragraphs = pages.iter().map(|p| p.paragraphs.len()).sum();
        let average_paragraphs_per_page = if total_pages == 0 {
            0.0
        } else {
            total_paragraphs as f64 / total_pages as f64
        };

        Self {
            pages,
            total_pages,
            total_paragraphs,
            average_paragraphs_per_page,
        }
    }
}

/// Parse an in-memory list of chapters.
pub fn parse_chapters(
    chapters: &[Chapter],
    breaks: &[PageBreakCandidate],
    config: &ParserConfig,
) -> Result<ParseResult> {
    let mut source = chapters;
    parse_book(&mut source, breaks, config)
}

/// Parse every chapter from `source` into pages.
///
/// Chapters that fail to extract are logged and skipped. Invalid
/// configuration and break positions outside their chapter abort the parse.
pub fn parse_book<S: ChapterSource + ?Sized>(
    source: &mut S,
    breaks: &[PageBreakCandidate],
    config: &ParserConfig,
) -> Result<ParseResult> {
    config.validate()?;
    let options = config.segmenter_options();
    let grouped = group_breaks(breaks);

    let mut pages = Vec::new();
    let mut seen = HashSet::new();

    for index in 0..source.len() {
        let chapter = match source.chapter(index) {
            Ok(chapter) => chapter,
            Err(e) => {
                warn!("Skipping chapter {}: {}", index + 1, e);
                continue;
            }
        };
        seen.insert(chapter.chapter_number);

        let chapter_breaks = grouped
            .get(&chapter.chapter_number)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let chapter_pages = assemble_chapter(&chapter, chapter_breaks, 1, &options)?;

        debug!(
            "Chapter {} ({:?}): {} breaks, {} pages",
            chapter.chapter_number,
            chapter.title,
            chapter_breaks.len(),
            chapter_pages.len()
        );
        pages.extend(chapter_pages);
    }

    warn_unmatched_breaks(&seen, &grouped);
    renumber_pages(&mut pages);

    let result = ParseResult::from_pages(pages);
    info!(
        "Parsed {} pages with {} paragraphs ({:.2} per page)",
        result.total_pages, result.total_paragraphs, result.average_paragraphs_per_page
    );
    Ok(result)
}

/// Number pages 1..=n in their current order.
pub fn renumber_pages(pages: &mut [Page]) {
    for (page, number) in pages.iter_mut().zip(1u32..) {
        page.page_number = number;
    }
}
