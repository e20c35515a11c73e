//! Game record loading.
//!
//! Stage 1 of the conversion pipeline. Parses an SGF file with
//! [`sgf_parse`] and reduces it to a [`GameRecord`]: the moves of the main
//! sequence (variations are ignored), the comment attached to each move, and
//! the game-info properties of the root node.
//!
//! ## Main sequence
//!
//! ```text
//! (;GM[1]EV[Test Cup]         root: metadata, not a move
//!   ;B[pd]C[Classic opening]  move 1, commented
//!   ;W[dp]                    move 2
//!   (;B[pp]) (;B[dd]))        move 3 is the first child; the second is a variation
//! ```
//!
//! Only nodes carrying `B[]` or `W[]` count as moves. Setup-only nodes
//! (`AB[]`, `AW[]`) are walked through but do not advance the move counter,
//! so their comments are dropped. The root comment is dropped for the same
//! reason.
//!
//! The walk is a fold over the node iterator: every move is produced from its
//! own node and the running count, without a mutable board.

use crate::types::{Color, GameRecord, PlayedMove};
use sgf_parse::go::{Move, Prop};
use sgf_parse::{SgfNode, SgfProp};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid SGF: {0}")]
    Parse(#[from] sgf_parse::SgfParseError),
    #[error("No game tree found")]
    NoGameTree,
}

/// Default board size when the record has no `SZ[]`.
const DEFAULT_BOARD_SIZE: (u8, u8) = (19, 19);

/// Load and parse a record from disk.
pub fn load_record(path: &Path) -> Result<GameRecord, RecordError> {
    let text = fs::read_to_string(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_record(&text)
}

/// Parse a record held in memory. Only the first game tree is used.
pub fn parse_record(text: &str) -> Result<GameRecord, RecordError> {
    let trees = sgf_parse::go::parse(text)?;
    let root = trees.into_iter().next().ok_or(RecordError::NoGameTree)?;

    Ok(GameRecord {
        moves: main_line(&root),
        metadata: game_info(&root),
        board_size: board_size(&root),
    })
}

/// Fold the main variation into its played moves.
fn main_line(root: &SgfNode<Prop>) -> Vec<PlayedMove> {
    root.main_variation()
        .filter_map(node_move)
        .enumerate()
        .map(|(idx, (color, point, comment))| PlayedMove {
            number: idx + 1,
            color,
            point,
            comment,
        })
        .collect()
}

type NodeMove = (Color, Option<(u8, u8)>, Option<String>);

/// The move played at a node, if any, with the node's comment.
fn node_move(node: &SgfNode<Prop>) -> Option<NodeMove> {
    let (color, mv) = node.properties().find_map(|prop| match prop {
        Prop::B(mv) => Some((Color::Black, mv)),
        Prop::W(mv) => Some((Color::White, mv)),
        _ => None,
    })?;
    let point = match mv {
        Move::Move(point) => Some((point.x, point.y)),
        Move::Pass => None,
    };
    Some((color, point, node_comment(node)))
}

fn node_comment(node: &SgfNode<Prop>) -> Option<String> {
    node.properties().find_map(|prop| match prop {
        Prop::C(text) => Some(text.text.trim().to_string()).filter(|c| !c.is_empty()),
        _ => None,
    })
}

/// Game-info properties of the root node, rendered as strings.
fn game_info(root: &SgfNode<Prop>) -> BTreeMap<String, String> {
    root.properties()
        .filter_map(|prop| {
            let value = match prop {
                Prop::EV(v)
                | Prop::RO(v)
                | Prop::PB(v)
                | Prop::PW(v)
                | Prop::BR(v)
                | Prop::WR(v)
                | Prop::BT(v)
                | Prop::WT(v)
                | Prop::DT(v)
                | Prop::PC(v)
                | Prop::RE(v)
                | Prop::GN(v)
                | Prop::RU(v)
                | Prop::SO(v)
                | Prop::AN(v)
                | Prop::US(v)
                | Prop::CP(v)
                | Prop::ON(v)
                | Prop::OT(v) => v.text.trim().to_string(),
                Prop::GC(v) => v.text.trim().to_string(),
                Prop::KM(komi) => komi.to_string(),
                Prop::HA(handicap) => handicap.to_string(),
                Prop::TM(seconds) => seconds.to_string(),
                Prop::SZ((w, h)) if w == h => w.to_string(),
                Prop::SZ((w, h)) => format!("{w}:{h}"),
                _ => return None,
            };
            Some((prop.identifier(), value))
        })
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

fn board_size(root: &SgfNode<Prop>) -> (u8, u8) {
    root.properties()
        .find_map(|prop| match prop {
            Prop::SZ(size) => Some(*size),
            _ => None,
        })
        .unwrap_or(DEFAULT_BOARD_SIZE)
}
