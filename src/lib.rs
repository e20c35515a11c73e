//! # sgf2ebook
//!
//! Converts Go game records (SGF) into EPUB ebooks with one page per move.
//! Each page shows the board after that move, drawn by the external
//! [sgf-render](https://github.com/julianandrews/sgf-render) tool, together
//! with the comment recorded for the move.
//!
//! # Architecture: Record to Book Pipeline
//!
//! Every record goes through four stages, start to finish, before the next
//! record begins:
//!
//! ```text
//! 1. Load      game.sgf     →  GameRecord        (main line, comments, game info)
//! 2. Render    GameRecord   →  diagram_NNN.svg   (one sgf-render call per move)
//! 3. Generate  GameRecord   →  page_NNN.html, content.opf, toc.ncx
//! 4. Package   scratch dir  →  Test_Cup_1.epub   (mimetype first, stored)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`record`] | Stage 1: parses SGF with `sgf-parse`, folds the main line into moves and comments |
//! | [`render`] | Stage 2: the `DiagramRenderer` seam and the `sgf-render` subprocess backend |
//! | [`generate`] | Stage 3: page, package manifest and navigation document contexts and rendering |
//! | [`container`] | Stage 4: scratch directory and zip serialization |
//! | [`convert`] | Orchestrates the stages for one record and for a batch |
//! | [`templates`] | Loads the template directory and compiles its MiniJinja templates |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`naming`] | Zero-padded resource names and output book names |
//! | [`types`] | `GameRecord` and `PlayedMove`, shared between stages |
//! | [`output`] | CLI output formatting for `check` and `convert` |
//!
//! # Design Decisions
//!
//! ## External Templates
//!
//! Pages and manifests come from a template directory that ships next to the
//! binary and can be replaced wholesale. The same directory is the static
//! scaffold of every book, so a custom stylesheet or container file is just
//! a file dropped into it. Templates are MiniJinja, which reads Jinja2
//! syntax.
//!
//! ## External Renderer
//!
//! Drawing boards is left to `sgf-render`, invoked once per move. The
//! [`render::DiagramRenderer`] trait keeps that process out of the unit
//! tests, which run against a recording mock.
//!
//! ## No Working Directory Changes
//!
//! Archive entries are written from explicit scratch-relative paths, so the
//! process never changes directory and library callers are unaffected.

pub mod config;
pub mod container;
pub mod convert;
pub mod generate;
pub mod naming;
pub mod output;
pub mod record;
pub mod render;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
