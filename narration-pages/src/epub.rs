// EPUB chapter extraction

use crate::error::{PagerError, Result};
use crate::pages::Chapter;
use crate::parser::ChapterSource;
use epub::doc::EpubDoc;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Chapters of an EPUB in spine order, extracted on demand.
pub struct EpubChapters {
    doc: EpubDoc<BufReader<File>>,
    idrefs: Vec<String>,
    /// Book title
    pub title: String,
    /// Book author(s)
    pub author: Option<String>,
}

impl EpubChapters {
    /// Open an EPUB file and read its metadata and spine.
    pub fn open(path: &Path) -> Result<Self> {
        let doc = EpubDoc::new(path).map_err(|e| PagerError::Epub(e.to_string()))?;

        let title = doc
            .mdata("title")
            .map(|m| m.value.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let author = doc.mdata("creator").map(|m| m.value.clone());
        let idrefs = doc.spine.iter().map(|item| item.idref.clone()).collect();

        Ok(Self {
            doc,
            idrefs,
            title,
            author,
        })
    }

    /// Extract every chapter, skipping the ones that fail or have no text.
    pub fn chapters(&mut self) -> Vec<Chapter> {
        (0..self.idrefs.len())
            .filter_map(|index| self.chapter(index).ok())
            .filter(|chapter| !chapter.content.trim().is_empty())
            .collect()
    }
}

impl ChapterSource for EpubChapters {
    fn len(&self) -> usize {
        self.idrefs.len()
    }

    fn chapter(&mut self, index: usize) -> Result<Chapter> {
        let chapter_number = index as u32 + 1;
        let idref = self
            .idrefs
            .get(index)
            .ok_or_else(|| PagerError::Extraction {
                chapter: chapter_number,
                message: "spine index out of bounds".to_string(),
            })?;

        let (content_bytes, _mime) =
            self.doc
                .get_resource(idref)
                .ok_or_else(|| PagerError::Extraction {
                    chapter: chapter_number,
                    message: format!("missing spine resource '{}'", idref),
                })?;
        let html = String::from_utf8_lossy(&content_bytes);

        let title = extract_title_from_html(&html)
            .unwrap_or_else(|| format!("Chapter {}", chapter_number));

        Ok(Chapter::new(chapter_number, title, html_to_text(&html)))
    }
}

/// Extract title from HTML content (looks for h1, then h2)
fn extract_title_from_html(html: &str) -> Option<String> {
    let html_lower = html.to_lowercase();

    ["h1", "h2"]
        .iter()
        .find_map(|tag| heading_text(html, &html_lower, tag))
}

fn heading_text(html: &str, html_lower: &str, tag: &str) -> Option<String> {
    let start = html_lower.find(&format!("<{}", tag))?;
    let tag_end = html_lower[start..].find('>')?;
    let content_start = start + tag_end + 1;
    let end = html_lower[content_start..].find(&format!("</{}>", tag))?;

    let title = strip_html_tags(&html[content_start..content_start + end]);
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() { None } else { Some(title) }
}

/// Strip HTML tags from a string
fn strip_html_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result
}

/// Convert chapter XHTML to plain text with blank lines between paragraphs
fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 1000);
    tidy_text(&text)
}

/// Join wrapped lines and keep one blank line between paragraphs
fn tidy_text(text: &str) -> String {
    let mut result = String::new();
    let mut prev_was_blank = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !prev_was_blank && !result.is_empty() {
                result.push_str("\n\n");
                prev_was_blank = true;
            }
            continue;
        }

        if !result.is_empty() && !result.ends_with('\n') {
            result.push(' ');
        }
        prev_was_blank = false;

        result.push_str(trimmed);
    }

    result
        .trim_end()
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>Hello</p>"), "Hello");
        assert_eq!(
            strip_html_tags("<h1>Title</h1><p>Content</p>"),
            "TitleContent"
        );
        assert_eq!(strip_html_tags("<a href=\"test\">Link</a>"), "Link");
    }

    #[test]
    fn test_extract_title_h1() {
        let html = "<html><body><h1 class=\"c\">Chapter <em>One</em></h1><p>Content</p></body></html>";
        assert_eq!(
            extract_title_from_html(html),
            Some("Chapter One".to_string())
        );
    }

    #[test]
    fn test_extract_title_h2() {
        let html = "<html><body><h2>פרק שני</h2><p>Content</p></body></html>";
        assert_eq!(extract_title_from_html(html), Some("פרק שני".to_string()));
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title_from_html("<p>No heading</p>"), None);
        assert_eq!(extract_title_from_html("<h1>  </h1>"), None);
    }

    #[test]
    fn test_tidy_text_keeps_paragraph_breaks() {
        let text = "First line\nwrapped here\n\n\n\nSecond paragraph\n";
        assert_eq!(
            tidy_text(text),
            "First line wrapped here\n\nSecond paragraph"
        );
    }

    #[test]
    fn test_tidy_text_decodes_entities() {
        let cleaned = tidy_text("Fish &amp; chips &lt;3");
        assert_eq!(cleaned, "Fish & chips <3");
    }

    #[test]
    fn test_html_to_text_separates_paragraphs() {
        let html = "<html><body><p>First paragraph.</p><p>Second paragraph.</p></body></html>";
        let text = html_to_text(html);
        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(paragraphs, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn test_open_missing_file_is_epub_error() {
        let result = EpubChapters::open(Path::new("/nonexistent/book.epub"));
        assert!(matches!(result, Err(PagerError::Epub(_))));
    }
}
