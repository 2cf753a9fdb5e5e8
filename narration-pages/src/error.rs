use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagerError {
    #[error(
        "Page break at position {position} is outside chapter {chapter} ({length} characters)"
    )]
    BreakOutOfRange {
        chapter: u32,
        position: usize,
        length: usize,
    },

    #[error("Failed to extract chapter {chapter}: {message}")]
    Extraction { chapter: u32, message: String },

    #[error("Failed to open EPUB: {0}")]
    Epub(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PagerError>;
