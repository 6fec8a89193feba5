//! Split PGN game collections into one file per game and file them into
//! directories grouped by event, player, opening name or ECO classification.

mod chess;

pub use chess::*;
