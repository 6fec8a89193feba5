use super::normalize::fold_accents;
use super::types::{GameRecord, HEADER_LINE, PreserveSet};
use std::mem;

/// Single-pass, line-oriented PGN splitter.
///
/// Games are delimited either by an `Event` header or by a blank line that
/// follows move text. Move text is never interpreted, only collected.
#[derive(Debug, Clone, Default)]
pub struct PgnParser {
    preserve: PreserveSet,
}

#[derive(Default)]
struct ParseState {
    games: Vec<GameRecord>,
    open: Option<GameRecord>,
    pending_moves: Vec<String>,
}

impl ParseState {
    fn current(&mut self) -> &mut GameRecord {
        self.open.get_or_insert_with(GameRecord::new)
    }

    fn close(&mut self) {
        if let Some(mut game) = self.open.take() {
            if !self.pending_moves.is_empty() {
                game.attach_moves(mem::take(&mut self.pending_moves));
            }
            self.games.push(game);
        }
    }

    fn finish(mut self) -> Vec<GameRecord> {
        self.close();
        self.games
    }
}

impl PgnParser {
    pub fn new(preserve: PreserveSet) -> Self {
        Self { preserve }
    }

    pub fn parse(&self, text: &str) -> Vec<GameRecord> {
        let mut state = ParseState::default();
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        for raw in text.lines() {
            let folded = fold_accents(raw.trim());
            self.feed_line(&mut state, folded.as_ref());
        }
        state.finish()
    }

    fn feed_line(&self, state: &mut ParseState, line: &str) {
        if line.is_empty() {
            if state.open.is_some() && !state.pending_moves.is_empty() {
                state.close();
            }
            return;
        }

        if !line.starts_with('[') {
            state.current();
            state.pending_moves.push(line.to_string());
            return;
        }

        // Malformed header lines are dropped without a trace.
        let Some(caps) = HEADER_LINE.captures(line) else {
            return;
        };
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            return;
        };
        let key = key.as_str();

        if key.eq_ignore_ascii_case("event") {
            state.close();
            state.open = Some(GameRecord::new());
        }

        let stored = if self.preserve.contains(key) {
            line.replace(',', " ")
        } else {
            value.as_str().to_string()
        };
        state.current().set_tag(key, stored);
    }
}
