//! narration-pages - Split EPUB chapters into narration paragraphs grouped into pages

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use narration_pages::epub::EpubChapters;
use narration_pages::output::{self, BookExport};
use narration_pages::{
    Chapter, ConfigOverrides, PageBreakCandidate, ParseResult, ParserConfig, parse_book,
    parse_chapters,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "narration-pages")]
#[command(about = "Split e-book chapters into narration-sized paragraphs grouped into pages", long_about = None)]
#[command(version)]
struct Args {
    /// Path to an EPUB file or a JSON array of chapters
    input: Option<PathBuf>,

    /// JSON array of page break candidates
    #[arg(short, long)]
    breaks: Option<PathBuf>,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Target paragraph length in characters
    #[arg(long)]
    chars: Option<usize>,

    /// Target paragraph length in words
    #[arg(long)]
    words: Option<usize>,

    /// Keep sentence fragments cut off at paragraph ends
    #[arg(long)]
    carry_forward: bool,

    /// Emit page and paragraph rows instead of the nested result
    #[arg(long)]
    rows: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Extract plain-text chapters from an EPUB as JSON
    Extract {
        /// Path to the EPUB file
        epub_file: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default target paragraph length in characters
    SetChars {
        /// Value (> 0)
        value: usize,
    },
    /// Set default target paragraph length in words
    SetWords {
        /// Value (> 0)
        value: usize,
    },
    /// Set whether sentence fragments are carried forward
    SetCarryForward {
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

/// Metadata and pages for one parsed book.
struct ParsedBook {
    book_id: String,
    title: String,
    author: Option<String>,
    result: ParseResult,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        Some(Commands::Extract { epub_file, output }) => {
            return handle_extract_command(epub_file, output.as_deref());
        }
        None => {}
    }

    let input = args
        .input
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Input path is required. Run 'narration-pages --help' for usage."))?;

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let config = ParserConfig::load()
        .context("Failed to load configuration")?
        .merge(&ConfigOverrides {
            paragraph_target_length_chars: args.chars,
            paragraph_target_length_words: args.words,
            carry_forward_fragments: args.carry_forward.then_some(true),
        });
    config.validate().context("Invalid configuration")?;

    let breaks: Vec<PageBreakCandidate> = match &args.breaks {
        Some(path) => output::read_json(path)
            .with_context(|| format!("Failed to read page breaks from {}", path.display()))?,
        None => Vec::new(),
    };

    if args.debug {
        eprintln!("Input: {}", input.display());
        eprintln!("Breaks: {}", breaks.len());
        eprintln!(
            "Targets: {} chars / {} words",
            config.paragraph_target_length_chars, config.paragraph_target_length_words
        );
        eprintln!("Carry forward fragments: {}", config.carry_forward_fragments);
    }

    let book = if is_epub(&input) {
        parse_epub_input(&input, &breaks, &config)?
    } else {
        parse_json_input(&input, &breaks, &config)?
    };

    eprintln!(
        "Book: \"{}\" by {}",
        book.title,
        book.author.as_deref().unwrap_or("Unknown")
    );
    eprintln!(
        "Pages: {}, Paragraphs: {}, Avg paragraphs/page: {:.2}",
        book.result.total_pages, book.result.total_paragraphs, book.result.average_paragraphs_per_page
    );

    let output_path = args.output.as_deref();
    if args.rows {
        let export = BookExport::from_result(
            &book.book_id,
            &book.title,
            book.author.as_deref(),
            &book.result,
        )?;
        output::write_json(output_path, &export).context("Failed to write output")?;
    } else {
        output::write_json(output_path, &book.result).context("Failed to write output")?;
    }

    if let Some(path) = output_path {
        eprintln!("Output: {}", path.display());
    }

    Ok(())
}

fn is_epub(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("epub"))
        .unwrap_or(false)
}

fn parse_epub_input(
    path: &Path,
    breaks: &[PageBreakCandidate],
    config: &ParserConfig,
) -> Result<ParsedBook> {
    eprintln!("Parsing EPUB: {}", path.display());
    let mut source = EpubChapters::open(path).context("Failed to parse EPUB")?;
    let result = parse_book(&mut source, breaks, config).context("Failed to paginate book")?;

    Ok(ParsedBook {
        book_id: output::compute_book_id(path)?,
        title: source.title.clone(),
        author: source.author.clone(),
        result,
    })
}

fn parse_json_input(
    path: &Path,
    breaks: &[PageBreakCandidate],
    config: &ParserConfig,
) -> Result<ParsedBook> {
    let chapters: Vec<Chapter> = output::read_json(path)
        .with_context(|| format!("Failed to read chapters from {}", path.display()))?;
    eprintln!("Chapters: {}", chapters.len());

    let result = parse_chapters(&chapters, breaks, config).context("Failed to paginate book")?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(ParsedBook {
        book_id: output::compute_book_id(path)?,
        title,
        author: None,
        result,
    })
}

fn handle_extract_command(epub_file: &Path, output_path: Option<&Path>) -> Result<()> {
    let mut source = EpubChapters::open(epub_file).context("Failed to parse EPUB")?;
    let chapters = source.chapters();

    let words: usize = chapters
        .iter()
        .map(|c| c.content.split_whitespace().count())
        .sum();
    eprintln!("Chapters: {}, Words: ~{}", chapters.len(), words);

    output::write_json(output_path, &chapters).context("Failed to write chapters")?;
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = ParserConfig::load()?;
            println!("Configuration file: {:?}", ParserConfig::config_path());
            println!();
            println!(
                "paragraph_target_length_chars = {}",
                config.paragraph_target_length_chars
            );
            println!(
                "paragraph_target_length_words = {}",
                config.paragraph_target_length_words
            );
            println!("carry_forward_fragments = {}", config.carry_forward_fragments);
            if config.page_break_detection.is_empty() {
                println!("page_break_detection = (none)");
            } else {
                println!();
                println!("[page_break_detection]");
                print!("{}", toml::to_string(&config.page_break_detection)?);
            }
        }
        ConfigAction::SetChars { value } => {
            let mut config = ParserConfig::load()?;
            config.paragraph_target_length_chars = *value;
            config.validate()?;
            config.save()?;
            println!("Default target length set to: {} chars", value);
        }
        ConfigAction::SetWords { value } => {
            let mut config = ParserConfig::load()?;
            config.paragraph_target_length_words = *value;
            config.validate()?;
            config.save()?;
            println!("Default target length set to: {} words", value);
        }
        ConfigAction::SetCarryForward { value } => {
            let mut config = ParserConfig::load()?;
            config.carry_forward_fragments = *value;
            config.save()?;
            println!("Carry forward fragments set to: {}", value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_epub() {
        assert!(is_epub(Path::new("book.epub")));
        assert!(is_epub(Path::new("BOOK.EPUB")));
        assert!(!is_epub(Path::new("chapters.json")));
        assert!(!is_epub(Path::new("noext")));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "narration-pages",
            "book.epub",
            "--breaks",
            "breaks.json",
            "--chars",
            "500",
            "--carry-forward",
            "--rows",
        ]);
        assert_eq!(args.input, Some(PathBuf::from("book.epub")));
        assert_eq!(args.breaks, Some(PathBuf::from("breaks.json")));
        assert_eq!(args.chars, Some(500));
        assert_eq!(args.words, None);
        assert!(args.carry_forward);
        assert!(args.rows);
    }

    #[test]
    fn test_config_subcommand_parse() {
        let args = Args::parse_from(["narration-pages", "config", "set-carry-forward", "true"]);
        assert!(matches!(
            args.command,
            Some(Commands::Config {
                action: ConfigAction::SetCarryForward { value: true }
            })
        ));
    }

    #[test]
    fn test_parse_json_input() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("novel.json");
        let chapters = vec![Chapter::new(1, "One", "Hello there. General Kenobi.")];
        output::write_json(Some(&path), &chapters).unwrap();

        let book = parse_json_input(&path, &[], &ParserConfig::default()).unwrap();
        assert_eq!(book.title, "novel");
        assert_eq!(book.book_id.len(), 16);
        assert_eq!(book.result.total_pages, 1);
    }
}
