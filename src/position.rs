use std::fmt;

use crate::{Board, Color, Move};

/// The game state the search runs on.
///
/// Moves are played and reverted in place, so a `play_move` followed by an
/// `undo_move` of the same move must restore the position exactly.
pub trait Position {
    type Move: Copy + Eq + fmt::Debug + fmt::Display;

    /// all legal moves for the side to move. The order only affects pruning.
    fn legal_moves(&self) -> Vec<Self::Move>;

    fn play_move(&mut self, mve: Self::Move);

    /// reverts `mve`, which must be the move played last
    fn undo_move(&mut self, mve: Self::Move);

    fn side_to_move(&self) -> Color;

    /// `true` if the side to move has no legal move. Implementations
    /// should answer this without enumerating moves.
    fn is_terminal(&self) -> bool {
        self.legal_moves().is_empty()
    }
}

impl Position for Board {
    type Move = Move;

    fn legal_moves(&self) -> Vec<Move> {
        self.generate_valid_moves()
    }

    fn play_move(&mut self, mve: Move) {
        Board::play_move(self, mve)
    }

    fn undo_move(&mut self, mve: Move) {
        Board::undo_move(self, mve)
    }

    #[inline]
    fn side_to_move(&self) -> Color {
        self.next_move
    }

    fn is_terminal(&self) -> bool {
        !self.has_legal_move()
    }
}
