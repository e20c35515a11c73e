//! CLI output formatting for the `check` and `convert` commands.
//!
//! # Information-First Display
//!
//! Every record is shown by its semantic identity first (positional index and
//! event name) with filesystem paths as indented context lines. Books are
//! shown by the archive they produced.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Records
//! 001 Test Cup, round 1 (3 moves, 1 comment)
//!     Source: games/cup.sgf
//!     Players: Honinbo Shusaku (B) vs Gennan Inseki (W)
//!     Result: B+2
//!     Output: Test_Cup_1.epub
//! 002 (broken.sgf)
//!     Source: games/broken.sgf
//!     Error: Invalid SGF: ...
//! ```
//!
//! ## Convert
//!
//! ```text
//! 001/002 cup.sgf
//!     Book: out/Test_Cup_1.epub (9 entries)
//! 002/002 broken.sgf
//!     Error: Invalid SGF: ...
//!
//! Converted 1 of 2 records → out
//! Failed
//!     games/broken.sgf: Invalid SGF: ...
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::convert::{BatchReport, ConvertEvent};
use crate::types::GameRecord;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Display title of a record: event and round, or the file name in parens.
///
/// ```text
/// Test Cup, round 1
/// Test Cup
/// (game.sgf)
/// ```
fn record_title(record: &GameRecord, source: &Path) -> String {
    match (record.event(), record.round()) {
        (Some(ev), Some(ro)) => format!("{ev}, round {ro}"),
        (Some(ev), None) => ev.to_string(),
        _ => format!("({})", file_name(source)),
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Outcome of loading one record for `check`.
pub enum CheckedRecord<'a> {
    Loaded {
        record: &'a GameRecord,
        output_name: &'a str,
    },
    Failed {
        error: &'a str,
    },
}

/// Format one checked record as display lines.
pub fn format_checked_record(index: usize, source: &Path, checked: &CheckedRecord) -> Vec<String> {
    let mut lines = Vec::new();
    match checked {
        CheckedRecord::Loaded {
            record,
            output_name,
        } => {
            lines.push(format!(
                "{} {} ({}, {})",
                format_index(index),
                record_title(record, source),
                plural(record.move_count(), "move"),
                plural(record.comments().len(), "comment"),
            ));
            lines.push(format!("{}Source: {}", indent(1), source.display()));
            if let (Some(black), Some(white)) =
                (record.metadata.get("PB"), record.metadata.get("PW"))
            {
                lines.push(format!(
                    "{}Players: {} (B) vs {} (W)",
                    indent(1),
                    black,
                    white
                ));
            }
            if let Some(result) = record.metadata.get("RE") {
                lines.push(format!("{}Result: {}", indent(1), result));
            }
            if record.move_count() == 0 {
                lines.push(format!("{}Warning: no moves, will not convert", indent(1)));
            } else {
                lines.push(format!("{}Output: {}", indent(1), output_name));
            }
        }
        CheckedRecord::Failed { error } => {
            lines.push(format!("{} ({})", format_index(index), file_name(source)));
            lines.push(format!("{}Source: {}", indent(1), source.display()));
            lines.push(format!("{}Error: {}", indent(1), error));
        }
    }
    lines
}

pub fn print_checked_record(index: usize, source: &Path, checked: &CheckedRecord) {
    for line in format_checked_record(index, source, checked) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert output
// ============================================================================

/// Format a single conversion progress event as display lines.
pub fn format_convert_event(event: &ConvertEvent) -> Vec<String> {
    match event {
        ConvertEvent::RecordStarted {
            index,
            total,
            source,
        } => {
            let width = total.to_string().len().max(3);
            vec![format!(
                "{:0width$}/{:0width$} {}",
                index,
                total,
                file_name(source)
            )]
        }
        ConvertEvent::BookWritten {
            output,
            entries,
            replaced,
            ..
        } => {
            let mut detail = match entries {
                1 => "1 entry".to_string(),
                n => format!("{n} entries"),
            };
            if *replaced {
                detail.push_str(", replaced");
            }
            vec![format!("{}Book: {} ({})", indent(1), output.display(), detail)]
        }
        ConvertEvent::RecordFailed { error, .. } => {
            vec![format!("{}Error: {}", indent(1), error)]
        }
    }
}

/// Format the end-of-run summary of a batch.
pub fn format_batch_summary(report: &BatchReport, output_dir: &Path) -> Vec<String> {
    let attempted = report.converted.len() + report.failed.len() + report.skipped;
    let mut lines = vec![
        String::new(),
        format!(
            "Converted {} of {} → {}",
            report.converted.len(),
            plural(attempted, "record"),
            output_dir.display()
        ),
    ];
    if !report.failed.is_empty() {
        lines.push("Failed".to_string());
        for failure in &report.failed {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                failure.source.display(),
                failure.error
            ));
        }
    }
    if report.skipped > 0 {
        lines.push(format!(
            "Skipped {} after the first failure",
            plural(report.skipped, "record")
        ));
    }
    lines
}

pub fn print_batch_summary(report: &BatchReport, output_dir: &Path) {
    for line in format_batch_summary(report, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
