//! Parser configuration: paragraph size targets and break detection settings.

use crate::error::{PagerError, Result};
use crate::text::SegmenterOptions;
use crate::text::segmenter::{DEFAULT_TARGET_CHARS, DEFAULT_TARGET_WORDS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Characters a paragraph should reach before it is closed
    #[serde(default = "default_target_chars")]
    pub paragraph_target_length_chars: usize,

    /// Words a paragraph should reach before it is closed
    #[serde(default = "default_target_words")]
    pub paragraph_target_length_words: usize,

    /// Keep sentence fragments cut off at paragraph ends instead of dropping them
    #[serde(default)]
    pub carry_forward_fragments: bool,

    /// Settings for the page break detector. Passed through, never read here.
    #[serde(default)]
    pub page_break_detection: toml::Table,
}

fn default_target_chars() -> usize {
    DEFAULT_TARGET_CHARS
}

fn default_target_words() -> usize {
    DEFAULT_TARGET_WORDS
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            paragraph_target_length_chars: default_target_chars(),
            paragraph_target_length_words: default_target_words(),
            carry_forward_fragments: false,
            page_break_detection: toml::Table::new(),
        }
    }
}

/// Caller-supplied values that take precedence over the loaded config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub paragraph_target_length_chars: Option<usize>,
    pub paragraph_target_length_words: Option<usize>,
    pub carry_forward_fragments: Option<bool>,
}

impl ParserConfig {
    /// Get the config file path: <config dir>/narration-pages/config.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("narration-pages")
            .join("config.toml")
    }

    /// Load config from the default location, returning defaults if missing.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, returning defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: ParserConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply caller overrides on top of this config.
    pub fn merge(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(chars) = overrides.paragraph_target_length_chars {
            self.paragraph_target_length_chars = chars;
        }
        if let Some(words) = overrides.paragraph_target_length_words {
            self.paragraph_target_length_words = words;
        }
        if let Some(carry) = overrides.carry_forward_fragments {
            self.carry_forward_fragments = carry;
        }
        self
    }

    /// Reject targets the segmenter cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.paragraph_target_length_chars == 0 {
            return Err(PagerError::InvalidConfig(
                "paragraph_target_length_chars must be greater than 0".to_string(),
            ));
        }
        if self.paragraph_target_length_words == 0 {
            return Err(PagerError::InvalidConfig(
                "paragraph_target_length_words must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Segmenter options derived from this config.
    pub fn segmenter_options(&self) -> SegmenterOptions {
        SegmenterOptions {
            target_chars: self.paragraph_target_length_chars,
            target_words: self.paragraph_target_length_words,
            carry_forward_fragments: self.carry_forward_fragments,
        }
    }
}
