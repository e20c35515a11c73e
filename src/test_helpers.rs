//! Shared test utilities for the sgf2ebook test suite.
//!
//! Provides small SGF records, a minimal template directory and a default
//! config so pipeline tests can run against a [`MockRenderer`] without the
//! real `sgf-render` executable.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let templates = minimal_templates(tmp.path());
//! let source = write_record(tmp.path(), "game.sgf", THREE_MOVES);
//! let book = convert_record(&source, &out, &test_config(), &templates, &MockRenderer::new())?;
//! assert_eq!(book.entries, 9);
//! ```
//!
//! [`MockRenderer`]: crate::render::tests::MockRenderer

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BookConfig;
use crate::container::{MIMETYPE, MIMETYPE_FILE};
use crate::templates::{NAVIGATION_TEMPLATE, PACKAGE_TEMPLATE, PAGE_TEMPLATE, Templates};

// =========================================================================
// Records
// =========================================================================

/// Three moves, no comments, event and round set.
pub const THREE_MOVES: &str = "(;GM[1]FF[4]SZ[19]EV[Test Cup]RO[1];B[pd];W[dp];B[pp])";

/// Two moves; the first is commented with a character that needs escaping.
pub const COMMENTED: &str =
    "(;GM[1]FF[4]SZ[19]EV[Commented]PB[Black]PW[White];B[pd]C[Star point & approach];W[dp])";

/// Three moves and no event, so the book is named after the file.
pub const NO_EVENT: &str = "(;GM[1]FF[4]SZ[9]PB[Alice]PW[Bob];B[ee];W[cc];B[gg])";

/// Write a record below `dir`, creating intermediate directories.
pub fn write_record(dir: &Path, relative: &str, text: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

// =========================================================================
// Templates and config
// =========================================================================

/// Page template exposing the variables tests assert on.
pub const MINIMAL_PAGE: &str = "{{ move }}/{{ nb_moves }} last={{ last_flag }} {{ comment }}";
/// Package template starting with the book UUID.
pub const MINIMAL_PACKAGE: &str =
    "{{ UUID }}{% for p in pages %} {{ p }}{% endfor %}{% for s in svgpath %} {{ s }}{% endfor %}";
/// Navigation template starting with the book UUID.
pub const MINIMAL_NAVIGATION: &str = "{{ UUID }}{% for p in pages %} {{ p.file }}{% endfor %}";

/// Write a minimal template directory to `dir/template`: the mimetype marker
/// and the three templates, nothing else.
pub fn write_minimal_template(dir: &Path) -> PathBuf {
    let root = dir.join("template");
    fs::create_dir_all(root.join("EPUB/Text")).unwrap();
    fs::write(root.join(MIMETYPE_FILE), MIMETYPE).unwrap();
    fs::write(root.join(PAGE_TEMPLATE), MINIMAL_PAGE).unwrap();
    fs::write(root.join(PACKAGE_TEMPLATE), MINIMAL_PACKAGE).unwrap();
    fs::write(root.join(NAVIGATION_TEMPLATE), MINIMAL_NAVIGATION).unwrap();
    root
}

/// Load the minimal template directory written below `dir`.
pub fn minimal_templates(dir: &Path) -> Templates {
    Templates::load(&write_minimal_template(dir)).unwrap()
}

/// Stock configuration.
pub fn test_config() -> BookConfig {
    BookConfig::default()
}
