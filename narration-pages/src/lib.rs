//! narration-pages - Split e-book chapters into narration-sized paragraphs
//! grouped into pages.
//!
//! The pipeline per chapter:
//! - `text::sentence` finds bilingual (Latin + Hebrew) sentence boundaries
//! - `text::segmenter` merges blank-line chunks into paragraphs near a target size
//! - `pages::assembler` cuts chapter text at page break candidates
//! - `parser` runs every chapter and collects the pages with statistics

pub mod config;
pub mod epub;
pub mod error;
pub mod output;
pub mod pages;
pub mod parser;
pub mod text;

pub use config::{ConfigOverrides, ParserConfig};
pub use error::{PagerError, Result};
pub use pages::{BreakInfo, BreakType, Chapter, Page, PageBreakCandidate};
pub use parser::{ChapterSource, ParseResult, parse_book, parse_chapters};
pub use text::{Paragraph, Segmenter, SegmenterOptions};
