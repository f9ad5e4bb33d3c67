use crate::{eval::Score, Board, Move, Result};

pub trait Engine {
    /// creates a new engine in the given position
    fn new_from_board(board: Board) -> Self;

    /// advance the position by `mve`
    fn accept_move(&mut self, mve: Move);

    /// start searching for the best move. This done on a separate thread.
    fn start_search(&mut self);

    /// stop searching for the best move.
    fn end_search(&mut self) -> Result<()>;

    /// returns the best move the engine found so far or `None`.
    /// This must be set to `Some` after [Engine::start_search] and
    /// [Engine::end_search] have been called, unless the position has no
    /// legal move.
    fn best_move(&self) -> Option<Move>;

    /// returns the score of the last completed search iteration
    fn current_score(&self) -> Score;
}

pub mod scythe;
pub mod search;
