//! Output for the persistence layer: flattened page and paragraph rows,
//! book identifiers, and JSON file helpers.

use crate::error::Result;
use crate::parser::ParseResult;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Bytes of the source file hashed for the book id.
const HASH_PREFIX_BYTES: usize = 1024 * 1024;

/// One row per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRow {
    pub id: String,
    pub book_id: String,
    pub page_number: u32,
    pub source_chapter: u32,
    pub start_position: usize,
    pub end_position: usize,
    /// Opaque blob for the store
    pub break_info: serde_json::Value,
}

/// One row per paragraph, pointing at its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphRow {
    pub id: String,
    pub page_id: String,
    pub book_id: String,
    pub order_index: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookStats {
    pub total_pages: usize,
    pub total_paragraphs: usize,
    pub average_paragraphs_per_page: f64,
}

/// A parse result flattened into rows, ready to replace a book's stored pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookExport {
    pub book_id: String,
    pub title: String,
    pub author: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub stats: BookStats,
    pub pages: Vec<PageRow>,
    pub paragraphs: Vec<ParagraphRow>,
}

impl BookExport {
    /// Flatten a parse result into page and paragraph rows.
    pub fn from_result(
        book_id: &str,
        title: &str,
        author: Option<&str>,
        result: &ParseResult,
    ) -> Result<Self> {
        let mut pages = Vec::with_capacity(result.pages.len());
        let mut paragraphs = Vec::with_capacity(result.total_paragraphs);

        for page in &result.pages {
            let page_id = format!("{}-p{}", book_id, page.page_number);

            for paragraph in &page.paragraphs {
                paragraphs.push(ParagraphRow {
                    id: format!("{}-{}", page_id, paragraph.order_index),
                    page_id: page_id.clone(),
                    book_id: book_id.to_string(),
                    order_index: paragraph.order_index,
                    content: paragraph.content.clone(),
                });
            }

            pages.push(PageRow {
                id: page_id,
                book_id: book_id.to_string(),
                page_number: page.page_number,
                source_chapter: page.source_chapter,
                start_position: page.start_position,
                end_position: page.end_position,
                break_info: serde_json::to_value(&page.break_info)?,
            });
        }

        Ok(Self {
            book_id: book_id.to_string(),
            title: title.to_string(),
            author: author.map(str::to_string),
            generated_at: Utc::now(),
            stats: BookStats {
                total_pages: result.total_pages,
                total_paragraphs: result.total_paragraphs,
                average_paragraphs_per_page: result.average_paragraphs_per_page,
            },
            pages,
            paragraphs,
        })
    }
}

/// Compute a book id from the source file.
///
/// Uses SHA256 of the first 1MB for speed with large files.
pub fn compute_book_id(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file).take(HASH_PREFIX_BYTES as u64);

    let mut buffer = Vec::with_capacity(HASH_PREFIX_BYTES);
    reader.read_to_end(&mut buffer)?;

    Ok(hash_bytes(&buffer))
}

/// First 16 hex characters of the SHA256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();

    format!("{:x}", result)[..16].to_string()
}

/// Read a JSON document from a file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write pretty JSON to a file, or to stdout when no path is given.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::pages::{BreakType, Chapter, PageBreakCandidate};
    use crate::parser::parse_chapters;
    use tempfile::TempDir;

    fn sample_result() -> ParseResult {
        let chapters = vec![
            Chapter::new(1, "One", "First page text. It ends here.\n\nSecond page text."),
            Chapter::new(2, "Two", "Another chapter."),
        ];
        let breaks = vec![PageBreakCandidate::new(1, 32, BreakType::Explicit)];
        parse_chapters(&chapters, &breaks, &ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_hash_bytes() {
        let hash = hash_bytes(b"test content");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, hash_bytes(b"test content"));
        assert_ne!(hash, hash_bytes(b"other content"));
    }

    #[test]
    fn test_compute_book_id_matches_hash() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.epub");
        fs::write(&path, b"consistent content").unwrap();

        assert_eq!(compute_book_id(&path).unwrap(), hash_bytes(b"consistent content"));
    }

    #[test]
    fn test_export_rows() {
        let result = sample_result();
        assert_eq!(result.total_pages, 3);

        let export = BookExport::from_result("abc", "Title", Some("Author"), &result).unwrap();
        assert_eq!(export.pages.len(), 3);
        assert_eq!(export.paragraphs.len(), result.total_paragraphs);
        assert_eq!(export.stats.total_pages, 3);

        assert_eq!(export.pages[0].id, "abc-p1");
        assert_eq!(export.pages[1].break_info["startBreak"]["type"], "explicit");
        assert_eq!(export.paragraphs[0].page_id, "abc-p1");
        assert_eq!(export.paragraphs[0].id, "abc-p1-0");
        assert_eq!(export.paragraphs[0].content, "First page text. It ends here.");
        assert!(export.paragraphs.iter().all(|p| p.book_id == "abc"));
    }

    #[test]
    fn test_write_and_read_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("result.json");
        let result = sample_result();

        write_json(Some(&path), &result).unwrap();
        let loaded: ParseResult = read_json(&path).unwrap();
        assert_eq!(loaded, result);
    }
}
