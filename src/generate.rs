//! Page and manifest generation.
//!
//! Stage 3 of the conversion pipeline. Turns a [`GameRecord`] into the text
//! documents of the ebook by rendering the template directory's templates:
//!
//! - **Pages** (`EPUB/Text/page_NNN.html`): one per move, embedding
//!   `diagram_NNN.svg` and the move's comment
//! - **Package manifest** (`EPUB/content.opf`): every page and image with a
//!   stable identifier, plus the spine in move order
//! - **Navigation document** (`EPUB/toc.ncx`): one nav point per move
//!
//! Functions here are pure: they return strings and leave writing to the
//! container.
//!
//! ## Template Variables
//!
//! | Template | Variables |
//! |---|---|
//! | page | `title`, `svgpath`, `info`, `last_flag`, `comment`, `move`, `nb_moves`, `color`, `coordinate`, `prev_page`, `next_page` |
//! | content.opf | `title`, `creator`, `language`, `UUID`, `svgpath`, `pages`, `nb_moves` |
//! | toc.ncx | `title`, `UUID`, `nb_moves`, `pages` (`number`, `file`) |
//!
//! `info` is the game-info map keyed by SGF identifier, so a template can
//! write `{{ info.PB }}` for the black player.

use crate::naming::{diagram_filename, page_filename};
use crate::templates::{NAVIGATION_TEMPLATE, PACKAGE_TEMPLATE, PAGE_TEMPLATE, TemplateError, Templates};
use crate::types::{Color, GameRecord, PlayedMove};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Variables of the page template.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub title: &'a str,
    /// Diagram file name, relative to the images directory.
    pub svgpath: String,
    pub info: &'a BTreeMap<String, String>,
    /// True only on the page of the final move.
    pub last_flag: bool,
    /// Comment of the move, empty when there is none.
    pub comment: &'a str,
    #[serde(rename = "move")]
    pub move_number: usize,
    pub nb_moves: usize,
    pub color: Color,
    pub coordinate: String,
    pub prev_page: Option<String>,
    pub next_page: Option<String>,
}

impl<'a> PageContext<'a> {
    /// Context for the page of `played` within `record`.
    ///
    /// `width` is the zero padding of file names; `with_comment` drops the
    /// comment when comments are disabled.
    pub fn new(
        record: &'a GameRecord,
        played: &'a PlayedMove,
        title: &'a str,
        width: usize,
        with_comment: bool,
    ) -> Self {
        let total = record.move_count();
        let number = played.number;
        let comment = match (&played.comment, with_comment) {
            (Some(text), true) => text.as_str(),
            _ => "",
        };
        Self {
            title,
            svgpath: diagram_filename(number, width),
            info: &record.metadata,
            last_flag: number == total,
            comment,
            move_number: number,
            nb_moves: total,
            color: played.color,
            coordinate: record.coordinate(played),
            prev_page: (number > 1).then(|| page_filename(number - 1, width)),
            next_page: (number < total).then(|| page_filename(number + 1, width)),
        }
    }
}

/// Current UTC time as `CCYY-MM-DDThh:mm:ssZ`.
pub fn modified_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Variables of the package manifest template.
#[derive(Debug, Serialize)]
pub struct PackageContext<'a> {
    pub title: &'a str,
    pub creator: &'a str,
    pub language: &'a str,
    #[serde(rename = "UUID")]
    pub uuid: String,
    /// Last modification time, `dcterms:modified` format.
    pub modified: String,
    /// Image file names, sorted.
    pub svgpath: Vec<String>,
    /// Page file names, sorted.
    pub pages: Vec<String>,
    pub nb_moves: usize,
}

/// A nav point of the navigation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavPoint {
    pub number: usize,
    pub file: String,
}

/// Variables of the navigation document template.
#[derive(Debug, Serialize)]
pub struct NavigationContext<'a> {
    pub title: &'a str,
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub nb_moves: usize,
    pub pages: Vec<NavPoint>,
}

/// File names of everything generated for a record of `move_count` moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    pub width: usize,
    pub images: Vec<String>,
    pub pages: Vec<String>,
}

impl Resources {
    pub fn new(move_count: usize, min_digits: usize) -> Self {
        let width = crate::naming::pad_width(move_count, min_digits);
        Self {
            width,
            images: (1..=move_count).map(|n| diagram_filename(n, width)).collect(),
            pages: (1..=move_count).map(|n| page_filename(n, width)).collect(),
        }
    }

    pub fn nav_points(&self) -> Vec<NavPoint> {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, file)| NavPoint {
                number: idx + 1,
                file: file.clone(),
            })
            .collect()
    }
}

// ============================================================================
// Renderers
// ============================================================================

/// Render the page of one move.
pub fn render_page(templates: &Templates, context: &PageContext) -> Result<String, TemplateError> {
    templates.render(PAGE_TEMPLATE, context)
}

/// Render the package manifest (`content.opf`).
///
/// Image and page lists are sorted here, so callers may pass them in any order.
pub fn render_package(
    templates: &Templates,
    context: &PackageContext,
) -> Result<String, TemplateError> {
    let mut sorted = PackageContext {
        title: context.title,
        creator: context.creator,
        language: context.language,
        uuid: context.uuid.clone(),
        modified: context.modified.clone(),
        svgpath: context.svgpath.clone(),
        pages: context.pages.clone(),
        nb_moves: context.nb_moves,
    };
    sorted.svgpath.sort();
    sorted.pages.sort();
    templates.render(PACKAGE_TEMPLATE, &sorted)
}

/// Render the navigation document (`toc.ncx`).
pub fn render_navigation(
    templates: &Templates,
    context: &NavigationContext,
) -> Result<String, TemplateError> {
    templates.render(NAVIGATION_TEMPLATE, context)
}

// ============================================================================
// Tests
// ============================================================================
