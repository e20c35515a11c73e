//! Shared types passed between pipeline stages.
//!
//! A [`GameRecord`] is produced once by the loader and then only read: the
//! renderer, the page builder and the manifest builder all borrow it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Stone colour of a played move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => f.write_str("black"),
            Color::White => f.write_str("white"),
        }
    }
}

/// One move of the main sequence, paired with the comment of its node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayedMove {
    /// 1-based position in the main sequence.
    pub number: usize,
    pub color: Color,
    /// Board point as SGF `(x, y)` from the top-left corner; `None` for a pass.
    pub point: Option<(u8, u8)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A parsed game record: main-line moves plus root game-info properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub moves: Vec<PlayedMove>,
    /// Game-info properties keyed by SGF identifier (`EV`, `RO`, `PB`, ...).
    pub metadata: BTreeMap<String, String>,
    /// Board width and height (`SZ`), 19×19 when absent.
    pub board_size: (u8, u8),
}

impl GameRecord {
    /// Number of moves in the main sequence.
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Comment map: 1-based move index → comment, for commented moves only.
    pub fn comments(&self) -> BTreeMap<usize, String> {
        self.moves
            .iter()
            .filter_map(|m| m.comment.as_ref().map(|c| (m.number, c.clone())))
            .collect()
    }

    pub fn event(&self) -> Option<&str> {
        self.metadata.get("EV").map(String::as_str)
    }

    pub fn round(&self) -> Option<&str> {
        self.metadata.get("RO").map(String::as_str)
    }

    /// Human-readable coordinate of a move, e.g. `D16` or `pass`.
    ///
    /// Columns skip the letter `I`; rows count up from the bottom edge.
    pub fn coordinate(&self, played: &PlayedMove) -> String {
        let Some((x, y)) = played.point else {
            return "pass".to_string();
        };
        let (_, height) = self.board_size;
        if x >= 25 || y >= height {
            return format!("{}{}", (b'a' + x) as char, (b'a' + y) as char);
        }
        let column = b"ABCDEFGHJKLMNOPQRSTUVWXYZ"[x as usize] as char;
        format!("{}{}", column, height - y)
    }
}
