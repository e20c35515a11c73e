//! Conversion pipeline: one game record in, one ebook out.
//!
//! ```text
//! game.sgf ──load──► GameRecord ──render──► EPUB/Images/diagram_NNN.svg
//!                         │
//!                         ├──pages────► EPUB/Text/page_NNN.html
//!                         ├──manifest─► EPUB/content.opf, EPUB/toc.ncx
//!                         ▼
//!                   scratch dir ──package──► <output>/Test_Cup_1.epub
//! ```
//!
//! Records are converted sequentially: each one is loaded, rendered,
//! paginated and packaged before the next one starts. Progress is reported
//! through an optional channel of [`ConvertEvent`]s so the CLI can print
//! while the pipeline runs.
//!
//! A batch keeps going after a failed record and reports every failure at
//! the end, unless `fail_fast` is set. Records of one batch never share an
//! output file: a name already written earlier in the batch gets a `_2`,
//! `_3`, ... suffix.

use crate::config::BookConfig;
use crate::container::{ContainerError, IMAGES_DIR, Scratch, TEXT_DIR};
use crate::generate::{
    NavigationContext, PackageContext, PageContext, Resources, modified_now, render_navigation,
    render_package, render_page,
};
use crate::naming::{numbered_filename, output_filename};
use crate::record::{RecordError, load_record};
use crate::render::{DiagramRenderer, RenderError, RenderRequest, SgfRenderBackend};
use crate::templates::{
    NAVIGATION_TEMPLATE, PACKAGE_TEMPLATE, TEMPLATE_FILES, TemplateError, Templates,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use uuid::Uuid;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("input path {0} not found")]
    InputNotFound(PathBuf),
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("{0} has no moves in its main sequence")]
    NoMoves(PathBuf),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Progress events emitted while converting.
#[derive(Debug, Clone, Serialize)]
pub enum ConvertEvent {
    /// A record is about to be converted.
    RecordStarted {
        index: usize,
        total: usize,
        source: PathBuf,
    },
    /// A book was written to disk.
    BookWritten {
        source: PathBuf,
        output: PathBuf,
        entries: usize,
        replaced: bool,
    },
    /// A record could not be converted.
    RecordFailed { source: PathBuf, error: String },
}

/// A successfully written book.
#[derive(Debug, Clone, Serialize)]
pub struct Ebook {
    pub source: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub uuid: String,
    pub move_count: usize,
    pub comment_count: usize,
    /// Number of archive entries, `mimetype` included.
    pub entries: usize,
    /// Whether an existing file was replaced.
    pub replaced: bool,
}

/// A record that could not be converted.
#[derive(Debug)]
pub struct Failure {
    pub source: PathBuf,
    pub error: ConvertError,
}

/// Outcome of a batch conversion.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<Ebook>,
    pub failed: Vec<Failure>,
    /// Records not attempted because the batch stopped early.
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// Input discovery
// ============================================================================

/// Records to convert for an input path.
///
/// A file is returned as-is whatever its extension. A directory is searched
/// recursively for `.sgf` files (case-insensitive), in sorted path order.
pub fn discover_records(input: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    if !input.exists() {
        return Err(ConvertError::InputNotFound(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut records = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(|source| ConvertError::Walk {
            path: input.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_sgf(entry.path()) {
            records.push(entry.into_path());
        }
    }
    records.sort();
    Ok(records)
}

fn is_sgf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("sgf"))
}

// ============================================================================
// Single record
// ============================================================================

/// Convert one record into a book inside `output_dir`.
pub fn convert_record(
    source: &Path,
    output_dir: &Path,
    config: &BookConfig,
    templates: &Templates,
    renderer: &impl DiagramRenderer,
) -> Result<Ebook, ConvertError> {
    convert_record_unclaimed(
        source,
        output_dir,
        config,
        templates,
        renderer,
        &HashSet::new(),
    )
}

/// First output path for `name` that is not in `claimed`.
fn unclaimed_output(output_dir: &Path, name: &str, claimed: &HashSet<PathBuf>) -> PathBuf {
    let mut output = output_dir.join(name);
    let mut n = 2;
    while claimed.contains(&output) {
        output = output_dir.join(numbered_filename(name, n));
        n += 1;
    }
    output
}

/// Convert one record, never writing to a path in `claimed`.
fn convert_record_unclaimed(
    source: &Path,
    output_dir: &Path,
    config: &BookConfig,
    templates: &Templates,
    renderer: &impl DiagramRenderer,
    claimed: &HashSet<PathBuf>,
) -> Result<Ebook, ConvertError> {
    let record = load_record(source)?;
    let move_count = record.move_count();
    if move_count == 0 {
        return Err(ConvertError::NoMoves(source.to_path_buf()));
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let resources = Resources::new(move_count, config.book.min_digits);
    let scratch = Scratch::new(templates.root(), &TEMPLATE_FILES)?;
    let images_dir = scratch.prepare_dir(IMAGES_DIR)?;

    // Diagram first, then the page that embeds it
    for (played, (image, page)) in record
        .moves
        .iter()
        .zip(resources.images.iter().zip(resources.pages.iter()))
    {
        renderer.render(&RenderRequest {
            record: source.to_path_buf(),
            move_number: played.number,
            output: images_dir.join(image),
        })?;
        let context = PageContext::new(
            &record,
            played,
            &stem,
            resources.width,
            config.book.comments,
        );
        let html = render_page(templates, &context)?;
        scratch.write(&format!("{TEXT_DIR}/{page}"), html.as_bytes())?;
    }

    let uuid = Uuid::new_v4().to_string();
    let package = render_package(
        templates,
        &PackageContext {
            title: &stem,
            creator: &config.book.creator,
            language: &config.book.language,
            uuid: uuid.clone(),
            modified: modified_now(),
            svgpath: resources.images.clone(),
            pages: resources.pages.clone(),
            nb_moves: move_count,
        },
    )?;
    scratch.write(PACKAGE_TEMPLATE, package.as_bytes())?;

    let navigation = render_navigation(
        templates,
        &NavigationContext {
            title: &stem,
            uuid: uuid.clone(),
            nb_moves: move_count,
            pages: resources.nav_points(),
        },
    )?;
    scratch.write(NAVIGATION_TEMPLATE, navigation.as_bytes())?;

    fs::create_dir_all(output_dir)?;
    let name = output_filename(&record, &stem, config.output.naming);
    let output = unclaimed_output(output_dir, &name, claimed);
    if output != output_dir.join(&name) {
        tracing::warn!(
            source = %source.display(),
            output = %output.display(),
            "{name} already written in this batch"
        );
    }
    let replaced = output.exists();
    if replaced {
        tracing::warn!(path = %output.display(), "replacing existing book");
    }
    let entries = scratch.package(&output)?;
    tracing::info!(
        source = %source.display(),
        output = %output.display(),
        moves = move_count,
        entries,
        "book written"
    );

    Ok(Ebook {
        source: source.to_path_buf(),
        output,
        title: stem,
        uuid,
        move_count,
        comment_count: if config.book.comments {
            record.comments().len()
        } else {
            0
        },
        entries,
        replaced,
    })
}

// ============================================================================
// Batch
// ============================================================================

/// Convert every record with the external `sgf-render` executable.
pub fn convert_batch(
    records: &[PathBuf],
    output_dir: &Path,
    config: &BookConfig,
    templates: &Templates,
    fail_fast: bool,
    progress: Option<Sender<ConvertEvent>>,
) -> BatchReport {
    let renderer = SgfRenderBackend::new(config.renderer.clone());
    convert_batch_with_renderer(
        &renderer, records, output_dir, config, templates, fail_fast, progress,
    )
}

/// Convert every record using a specific renderer (allows testing with mock).
pub fn convert_batch_with_renderer(
    renderer: &impl DiagramRenderer,
    records: &[PathBuf],
    output_dir: &Path,
    config: &BookConfig,
    templates: &Templates,
    fail_fast: bool,
    progress: Option<Sender<ConvertEvent>>,
) -> BatchReport {
    let emit = |event: ConvertEvent| {
        if let Some(tx) = &progress {
            // A dropped receiver only means nobody is printing
            let _ = tx.send(event);
        }
    };

    let mut report = BatchReport::default();
    let mut written = HashSet::new();
    for (idx, source) in records.iter().enumerate() {
        emit(ConvertEvent::RecordStarted {
            index: idx + 1,
            total: records.len(),
            source: source.clone(),
        });

        match convert_record_unclaimed(source, output_dir, config, templates, renderer, &written)
        {
            Ok(book) => {
                written.insert(book.output.clone());
                emit(ConvertEvent::BookWritten {
                    source: book.source.clone(),
                    output: book.output.clone(),
                    entries: book.entries,
                    replaced: book.replaced,
                });
                report.converted.push(book);
            }
            Err(error) => {
                tracing::error!(source = %source.display(), %error, "conversion failed");
                emit(ConvertEvent::RecordFailed {
                    source: source.clone(),
                    error: error.to_string(),
                });
                report.failed.push(Failure {
                    source: source.clone(),
                    error,
                });
                if fail_fast {
                    report.skipped = records.len() - idx - 1;
                    break;
                }
            }
        }
    }
    report
}

// ============================================================================
// Tests
// ============================================================================
