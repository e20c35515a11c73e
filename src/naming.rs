//! File naming conventions for generated resources and output books.
//!
//! Every generated resource is named after its 1-based move number, zero
//! padded so that lexicographic order equals move order:
//!
//! - `diagram_001.svg`, `diagram_002.svg`, ... (images)
//! - `page_001.html`, `page_002.html`, ... (text pages)
//!
//! The padding width is at least `min_digits` and grows with the move count,
//! so a 1200-move record gets `page_0001.html` through `page_1200.html`.
//!
//! ## Output Books
//!
//! The `.epub` name comes from the record's game info when available:
//! - `EV[Test Cup] RO[1]` → `Test_Cup_1.epub`
//! - `EV[Test Cup]` → `Test_Cup.epub`
//! - no `EV[]`, file `kisei-7.sgf` → `kisei-7.epub`
//!
//! Records of one batch that map to the same name are numbered from the
//! second one on: `Test_Cup_1.epub`, `Test_Cup_1_2.epub`, `Test_Cup_1_3.epub`.

use crate::config::Naming;
use crate::types::GameRecord;

/// Padding width for a record with `move_count` moves.
pub fn pad_width(move_count: usize, min_digits: usize) -> usize {
    move_count.to_string().len().max(min_digits)
}

/// File name of the diagram for a move.
pub fn diagram_filename(move_number: usize, width: usize) -> String {
    format!("diagram_{:0width$}.svg", move_number)
}

/// File name of the text page for a move.
pub fn page_filename(move_number: usize, width: usize) -> String {
    format!("page_{:0width$}.html", move_number)
}

/// File name of the output book for a record.
pub fn output_filename(record: &GameRecord, stem: &str, naming: Naming) -> String {
    let base = match (naming, record.event()) {
        (Naming::Metadata, Some(event)) if !event.trim().is_empty() => event.trim(),
        _ => stem,
    };
    let name = match record.round().map(str::trim).filter(|r| !r.is_empty()) {
        Some(round) if naming == Naming::Metadata => format!("{base}_{round}"),
        _ => base.to_string(),
    };
    format!("{}.epub", sanitize_filename(&name))
}

/// `name` with `_n` inserted before its extension.
pub fn numbered_filename(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => format!("{base}_{n}.{ext}"),
        _ => format!("{name}_{n}"),
    }
}

/// Make a name safe for use as a single path component.
///
/// - Whitespace becomes `_`
/// - Path separators and characters rejected by common filesystems become `-`
/// - An empty result becomes `untitled`
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}
