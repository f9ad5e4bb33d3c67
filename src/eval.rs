//! Static evaluation.
//!
//! Scores use a fixed polarity: positive favours Black, negative favours
//! White. Every term is computed independently and the evaluation is their
//! plain sum, with material scaled so that no positional term can outweigh
//! a difference in material.

use crate::{index_at, Board, Color, PieceType, BOARD_SIZE};

pub type Score = i32;

pub const MAN_VALUE: Score = 1;
pub const KING_VALUE: Score = 3;
pub const MATERIAL_WEIGHT: Score = 5;
pub const CENTER_BONUS: Score = 1;
pub const FORMATION_BONUS: Score = 2;
pub const HOME_ROW_BONUS: Score = 1;

/// rows 5 and 6, squares 21..=30
const CENTER_ROWS: [i8; 2] = [4, 5];

pub trait Evaluator<P: ?Sized> {
    fn evaluate(&self, position: &P) -> Score;
}

impl<P: ?Sized, E: Evaluator<P> + ?Sized> Evaluator<P> for &E {
    fn evaluate(&self, position: &P) -> Score {
        (**self).evaluate(position)
    }
}

/// Selects the terms [HeuristicEvaluator] sums up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    pub material: bool,
    pub center_control: bool,
    pub formations: bool,
    pub home_row: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            material: true,
            center_control: true,
            formations: true,
            home_row: true,
        }
    }
}

impl EvalConfig {
    pub fn material_only() -> Self {
        EvalConfig {
            material: true,
            center_control: false,
            formations: false,
            home_row: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeuristicEvaluator {
    config: EvalConfig,
}

impl HeuristicEvaluator {
    pub fn new(config: EvalConfig) -> Self {
        HeuristicEvaluator { config }
    }

    pub fn config(&self) -> EvalConfig {
        self.config
    }
}

impl Evaluator<Board> for HeuristicEvaluator {
    fn evaluate(&self, board: &Board) -> Score {
        let mut score = 0;
        if self.config.material {
            score += material(board) * MATERIAL_WEIGHT;
        }
        if self.config.center_control {
            score += center_control(board);
        }
        if self.config.formations {
            score += formations(board);
        }
        if self.config.home_row {
            score += home_row(board);
        }
        score
    }
}

/// unweighted piece count, kings count triple
pub fn material(board: &Board) -> Score {
    board
        .pieces()
        .map(|(_, piece)| {
            let value = match piece.typ() {
                PieceType::Man => MAN_VALUE,
                PieceType::King => KING_VALUE,
            };
            value * piece.color().sign()
        })
        .sum()
}

pub fn center_control(board: &Board) -> Score {
    board
        .pieces()
        .filter(|(at, _)| CENTER_ROWS.contains(&crate::coords(*at).0))
        .map(|(_, piece)| CENTER_BONUS * piece.color().sign())
        .sum()
}

/// Counts quincunx formations of five men of one color:
///
/// ```text
/// x . x
/// . x .
/// x . x
/// ```
///
/// Every 3x3 window whose corners are dark squares is checked, so the
/// window never leaves the board.
pub fn formations(board: &Board) -> Score {
    let mut score = 0;
    for row in 0..BOARD_SIZE - 2 {
        let first_dark = if row % 2 == 0 { 1 } else { 0 };
        for col in (first_dark..BOARD_SIZE - 2).step_by(2) {
            let window = [
                (row, col),
                (row, col + 2),
                (row + 1, col + 1),
                (row + 2, col),
                (row + 2, col + 2),
            ];
            if let Some(color) = formation_owner(board, &window) {
                score += FORMATION_BONUS * color.sign();
            }
        }
    }
    score
}

fn formation_owner(board: &Board, window: &[(i8, i8); 5]) -> Option<Color> {
    let mut owner = None;
    for &(row, col) in window {
        let piece = board[index_at(row, col)?]?;
        if piece.typ() != PieceType::Man {
            return None;
        }
        match owner {
            None => owner = Some(piece.color()),
            Some(color) if color != piece.color() => return None,
            Some(_) => {}
        }
    }
    owner
}

/// men that have not left their own back row
pub fn home_row(board: &Board) -> Score {
    board
        .pieces()
        .filter(|(at, piece)| {
            let home = (!piece.color()).promotion_row();
            piece.typ() == PieceType::Man && crate::coords(*at).0 == home
        })
        .map(|(_, piece)| HOME_ROW_BONUS * piece.color().sign())
        .sum()
}
