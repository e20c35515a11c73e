//! Conversion configuration module.
//!
//! Handles loading and validating `config.toml`. Stock defaults are
//! overridden by a user config file placed next to the records being converted,
//! and individual values can be overridden again from the command line.
//!
//! ## Config File Location
//!
//! ```text
//! games/
//! ├── config.toml              # Picked up when converting games/ or a file inside it
//! ├── 2023-honinbo-1.sgf
//! └── 2023-honinbo-2.sgf
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [renderer]
//! executable = "./sgf-render"   # Board diagram renderer
//! style = "minimalist"          # Passed as --style
//! move_numbers = true           # Overlay move numbers (--move-numbers)
//! extra_args = []               # Appended before -o
//!
//! [book]
//! template_dir = "epub_template"  # Scaffold + page/opf/ncx templates
//! creator = "sgf2ebook"
//! language = "en"
//! comments = true               # Attach C[] comments to pages
//! min_digits = 3                # Minimum zero padding of page/diagram numbers
//!
//! [output]
//! naming = "metadata"           # "metadata" (EV_RO.epub) or "stem" (file stem)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up next to the input records.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Conversion configuration loaded from `config.toml`.
///
/// All fields have defaults matching the behaviour of the stock template and
/// renderer. User config files need only specify the values they override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookConfig {
    /// External diagram renderer invocation.
    pub renderer: RendererConfig,
    /// Ebook content settings.
    pub book: BookSettings,
    /// Output file settings.
    pub output: OutputConfig,
}

impl BookConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renderer.executable.to_string_lossy().trim().is_empty() {
            return Err(ConfigError::Validation(
                "renderer.executable must not be empty".into(),
            ));
        }
        if self.renderer.style.trim().is_empty() {
            return Err(ConfigError::Validation(
                "renderer.style must not be empty".into(),
            ));
        }
        if self.book.min_digits == 0 || self.book.min_digits > 9 {
            return Err(ConfigError::Validation(
                "book.min_digits must be 1-9".into(),
            ));
        }
        if self.book.creator.trim().is_empty() {
            return Err(ConfigError::Validation(
                "book.creator must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// How the external `sgf-render` executable is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Path or name of the renderer executable.
    pub executable: PathBuf,
    /// Rendering style passed as `--style`.
    pub style: String,
    /// Whether to overlay move numbers on the diagram.
    pub move_numbers: bool,
    /// Additional arguments inserted before the output path.
    pub extra_args: Vec<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("./sgf-render"),
            style: "minimalist".to_string(),
            move_numbers: true,
            extra_args: Vec::new(),
        }
    }
}

/// Ebook content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookSettings {
    /// Directory holding the static scaffold and the three templates.
    pub template_dir: PathBuf,
    /// Value of `dc:creator` in the package manifest.
    pub creator: String,
    /// Value of `dc:language` in the package manifest.
    pub language: String,
    /// Attach per-move comments to pages.
    pub comments: bool,
    /// Minimum width of the zero-padded move number in file names.
    pub min_digits: usize,
}

impl Default for BookSettings {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("epub_template"),
            creator: "sgf2ebook".to_string(),
            language: "en".to_string(),
            comments: true,
            min_digits: 3,
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// How the `.epub` file name is chosen.
    pub naming: Naming,
}

/// Output file naming strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Naming {
    /// Event name (`EV`), suffixed by the round (`RO`); file stem when no event.
    #[default]
    Metadata,
    /// Always the input file stem.
    Stem,
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Parse the contents of a `config.toml` and validate the result.
///
/// Missing keys take their defaults; unknown keys are rejected.
pub fn parse_config(content: &str) -> Result<BookConfig, ConfigError> {
    let config: BookConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Returns the validated defaults when the directory has no config file.
pub fn load_config(dir: &Path) -> Result<BookConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let config = BookConfig::default();
        config.validate()?;
        return Ok(config);
    }
    tracing::debug!(path = %config_path.display(), "loading config");
    parse_config(&fs::read_to_string(&config_path)?)
}

/// Directory whose `config.toml` applies to an input path.
///
/// A directory input is its own config root; a single record uses its parent.
pub fn config_root(input: &Path) -> PathBuf {
    if input.is_dir() {
        return input.to_path_buf();
    }
    match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sgf2ebook Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the directory you convert, or next to
# the single .sgf file you convert. Command line flags win over this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Diagram renderer
# ---------------------------------------------------------------------------
[renderer]
# sgf-render executable, invoked once per move.
executable = "./sgf-render"

# Rendering style passed as --style.
style = "minimalist"

# Overlay move numbers on the stones (--move-numbers).
move_numbers = true

# Extra arguments appended after the style and before -o.
extra_args = []

# ---------------------------------------------------------------------------
# Ebook content
# ---------------------------------------------------------------------------
[book]
# Directory with the EPUB scaffold and the page, content.opf and toc.ncx templates.
template_dir = "epub_template"

# dc:creator and dc:language of the package document.
creator = "sgf2ebook"
language = "en"

# Show the comment attached to each move on its page.
comments = true

# Minimum zero padding of page_NNN.html / diagram_NNN.svg numbers.
# Longer games widen the padding automatically.
min_digits = 3

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# "metadata": <event>_<round>.epub, falling back to the file stem without EV[].
# "stem":     always the input file stem.
naming = "metadata"
"##
}
