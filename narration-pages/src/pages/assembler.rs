//! Page assembly: cut chapter text at break candidates and segment each span.

use super::{BreakInfo, Chapter, Page, PageBreakCandidate};
use crate::error::{PagerError, Result};
use crate::text::{Segmenter, SegmenterOptions};
use log::{debug, trace, warn};
use std::collections::{BTreeMap, HashSet};

/// A half-open character range of a chapter plus the breaks around it.
#[derive(Debug)]
struct Span<'a> {
    start: usize,
    end: usize,
    start_break: Option<&'a PageBreakCandidate>,
    end_break: Option<&'a PageBreakCandidate>,
}

/// Group break candidates by chapter, each group sorted by position.
pub fn group_breaks(breaks: &[PageBreakCandidate]) -> BTreeMap<u32, Vec<PageBreakCandidate>> {
    let mut grouped: BTreeMap<u32, Vec<PageBreakCandidate>> = BTreeMap::new();

    for candidate in breaks {
        grouped
            .entry(candidate.chapter_number)
            .or_default()
            .push(candidate.clone());
    }

    for group in grouped.values_mut() {
        group.sort_by_key(|b| b.position);
    }

    grouped
}

/// Assemble pages for every chapter, numbering them from 1 across the book.
pub fn assemble(
    chapters: &[Chapter],
    breaks: &[PageBreakCandidate],
    options: &SegmenterOptions,
) -> Result<Vec<Page>> {
    let grouped = group_breaks(breaks);
    let known: HashSet<u32> = chapters.iter().map(|c| c.chapter_number).collect();
    warn_unmatched_breaks(&known, &grouped);

    let mut pages = Vec::new();
    for chapter in chapters {
        let chapter_breaks = grouped
            .get(&chapter.chapter_number)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let next_page = pages.len() as u32 + 1;
        pages.extend(assemble_chapter(chapter, chapter_breaks, next_page, options)?);
    }

    Ok(pages)
}

/// Assemble the pages of a single chapter.
///
/// `breaks` are this chapter's candidates in any order. Pages are numbered
/// consecutively from `first_page_number`. A break past the end of the
/// chapter is rejected rather than clamped.
pub fn assemble_chapter(
    chapter: &Chapter,
    breaks: &[PageBreakCandidate],
    first_page_number: u32,
    options: &SegmenterOptions,
) -> Result<Vec<Page>> {
    let length = chapter.char_len();

    if let Some(bad) = breaks.iter().find(|b| b.position > length) {
        return Err(PagerError::BreakOutOfRange {
            chapter: chapter.chapter_number,
            position: bad.position,
            length,
        });
    }

    let mut sorted: Vec<&PageBreakCandidate> = breaks.iter().collect();
    sorted.sort_by_key(|b| b.position);

    let segmenter = Segmenter::new(*options);
    let offsets = CharOffsets::new(&chapter.content);
    let mut pages = Vec::new();
    let mut page_number = first_page_number;

    for span in build_spans(&sorted, length) {
        if span.start >= span.end {
            trace!(
                "Skipping empty span at {} in chapter {}",
                span.start, chapter.chapter_number
            );
            continue;
        }

        let text = &chapter.content[offsets.byte(span.start)..offsets.byte(span.end)];
        let paragraphs = segmenter.segment(text);

        if paragraphs.is_empty() {
            warn!(
                "Dropping page for chapter {} span [{}, {}): no paragraphs",
                chapter.chapter_number, span.start, span.end
            );
            continue;
        }

        debug!(
            "Page {}: chapter {} [{}, {}) with {} paragraphs",
            page_number,
            chapter.chapter_number,
            span.start,
            span.end,
            paragraphs.len()
        );

        pages.push(Page {
            page_number,
            source_chapter: chapter.chapter_number,
            start_position: span.start,
            end_position: span.end,
            break_info: BreakInfo {
                start_break: span.start_break.cloned(),
                end_break: span.end_break.cloned(),
            },
            paragraphs,
        });
        page_number += 1;
    }

    Ok(pages)
}

/// Spans between consecutive breaks, plus the leading and trailing spans.
fn build_spans<'a>(sorted: &[&'a PageBreakCandidate], length: usize) -> Vec<Span<'a>> {
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return vec![Span {
            start: 0,
            end: length,
            start_break: None,
            end_break: None,
        }];
    };

    let mut spans = Vec::with_capacity(sorted.len() + 1);
    spans.push(Span {
        start: 0,
        end: first.position,
        start_break: None,
        end_break: Some(first),
    });

    for pair in sorted.windows(2) {
        spans.push(Span {
            start: pair[0].position,
            end: pair[1].position,
            start_break: Some(pair[0]),
            end_break: Some(pair[1]),
        });
    }

    spans.push(Span {
        start: last.position,
        end: length,
        start_break: Some(last),
        end_break: None,
    });

    spans
}

/// Log break groups whose chapter number matches no chapter.
pub(crate) fn warn_unmatched_breaks(
    known: &HashSet<u32>,
    grouped: &BTreeMap<u32, Vec<PageBreakCandidate>>,
) {
    for (chapter_number, group) in grouped {
        if !known.contains(chapter_number) {
            warn!(
                "Ignoring {} page breaks for unknown chapter {}",
                group.len(),
                chapter_number
            );
        }
    }
}

/// Maps character offsets to byte offsets within a string.
struct CharOffsets {
    bytes: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bytes.push(text.len());
        Self { bytes }
    }

    fn byte(&self, char_offset: usize) -> usize {
        self.bytes[char_offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::BreakType;

    fn options() -> SegmenterOptions {
        SegmenterOptions::new(100, 20)
    }

    fn chapter_text() -> String {
        "The first page begins here. It has two sentences.\n\n\
         The second page starts now. It also ends cleanly.\n\n\
         A third section closes the chapter."
            .to_string()
    }

    fn break_at(chapter_number: u32, needle: &str, text: &str) -> PageBreakCandidate {
        let byte = text.find(needle).unwrap();
        let position = text[..byte].chars().count();
        PageBreakCandidate::new(chapter_number, position, BreakType::Explicit)
    }

    #[test]
    fn test_chapter_without_breaks_is_one_page() {
        let chapter = Chapter::new(1, "One", chapter_text());
        let pages = assemble_chapter(&chapter, &[], 1, &options()).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].start_position, 0);
        assert_eq!(pages[0].end_position, chapter.char_len());
        assert_eq!(pages[0].break_info, BreakInfo::default());
    }

    #[test]
    fn test_breaks_produce_n_plus_one_pages() {
        let text = chapter_text();
        let chapter = Chapter::new(2, "Two", text.clone());
        let breaks = vec![
            break_at(2, "A third", &text),
            break_at(2, "The second", &text),
        ];

        let pages = assemble_chapter(&chapter, &breaks, 5, &options()).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![5, 6, 7]
        );
        assert_eq!(pages[0].paragraphs[0].content, "The first page begins here. It has two sentences.");
        assert!(pages[1].paragraphs[0].content.starts_with("The second page"));
        assert_eq!(pages[2].paragraphs[0].content, "A third section closes the chapter.");

        assert!(pages[0].break_info.start_break.is_none());
        assert_eq!(pages[0].break_info.end_break.as_ref(), Some(&breaks[1]));
        assert_eq!(pages[1].break_info.start_break.as_ref(), Some(&breaks[1]));
        assert_eq!(pages[1].break_info.end_break.as_ref(), Some(&breaks[0]));
        assert!(pages[2].break_info.end_break.is_none());

        assert_eq!(pages[0].end_position, pages[1].start_position);
        assert_eq!(pages[2].end_position, chapter.char_len());
    }

    #[test]
    fn test_breaks_at_edges_skip_empty_spans() {
        let text = chapter_text();
        let chapter = Chapter::new(1, "", text.clone());
        let length = chapter.char_len();
        let breaks = vec![
            PageBreakCandidate::new(1, 0, BreakType::Structural),
            PageBreakCandidate::new(1, length, BreakType::Structural),
        ];

        let pages = assemble_chapter(&chapter, &breaks, 1, &options()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].start_position, 0);
        assert_eq!(pages[0].end_position, length);
        assert_eq!(pages[0].break_info.start_break.as_ref(), Some(&breaks[0]));
        assert_eq!(pages[0].break_info.end_break.as_ref(), Some(&breaks[1]));
    }

    #[test]
    fn test_whitespace_span_is_dropped() {
        let text = "Opening line here.\n\n   \n\nClosing line here.";
        let chapter = Chapter::new(1, "", text);
        let breaks = vec![
            break_at(1, "   ", text),
            break_at(1, "Closing", text),
        ];

        let pages = assemble_chapter(&chapter, &breaks, 1, &options()).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].paragraphs[0].content, "Opening line here.");
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].paragraphs[0].content, "Closing line here.");
    }

    #[test]
    fn test_break_out_of_range_is_an_error() {
        let chapter = Chapter::new(4, "", "Short text.");
        let breaks = vec![PageBreakCandidate::new(4, 500, BreakType::Computed)];

        let err = assemble_chapter(&chapter, &breaks, 1, &options()).unwrap_err();
        assert!(matches!(
            err,
            PagerError::BreakOutOfRange {
                chapter: 4,
                position: 500,
                length: 11
            }
        ));
    }

    #[test]
    fn test_hebrew_break_positions_are_characters() {
        let text = "שלום עולם. זהו משפט שני!\n\nהאם זה משפט שלישי?";
        let chapter = Chapter::new(1, "", text);
        let breaks = vec![break_at(1, "האם", text)];

        let pages = assemble_chapter(&chapter, &breaks, 1, &options()).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].paragraphs[0].content, "האם זה משפט שלישי?");
        assert_eq!(pages[1].end_position, chapter.char_len());
    }

    #[test]
    fn test_group_breaks_sorts_by_position() {
        let breaks = vec![
            PageBreakCandidate::new(2, 40, BreakType::Stylistic),
            PageBreakCandidate::new(1, 30, BreakType::Explicit),
            PageBreakCandidate::new(2, 10, BreakType::Semantic),
        ];

        let grouped = group_breaks(&breaks);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&1].len(), 1);
        assert_eq!(
            grouped[&2].iter().map(|b| b.position).collect::<Vec<_>>(),
            vec![10, 40]
        );
    }

    #[test]
    fn test_assemble_numbers_pages_across_chapters() {
        let text = chapter_text();
        let chapters = vec![
            Chapter::new(1, "One", text.clone()),
            Chapter::new(2, "Two", "Just one short chapter."),
        ];
        let breaks = vec![
            break_at(1, "The second", &text),
            PageBreakCandidate::new(9, 3, BreakType::Computed),
        ];

        let pages = assemble(&chapters, &breaks, &options()).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| (p.page_number, p.source_chapter)).collect::<Vec<_>>(),
            vec![(1, 1), (2, 1), (3, 2)]
        );
    }

    #[test]
    fn test_char_offsets() {
        let offsets = CharOffsets::new("aשb");
        assert_eq!(offsets.byte(0), 0);
        assert_eq!(offsets.byte(1), 1);
        assert_eq!(offsets.byte(2), 3);
        assert_eq!(offsets.byte(3), 4);
    }
}
