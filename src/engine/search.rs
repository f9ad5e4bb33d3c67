//! Iterative deepening alpha-beta search with cooperative cancellation.
//!
//! The search uses fixed polarity scores: Black maximizes, White minimizes.
//! Both sides share one recursive function that only differs in which bound
//! it tightens and in the direction of the comparison.

use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::{debug, trace, warn};
use rand::{seq::SliceRandom, thread_rng};

use crate::{
    eval::{Evaluator, Score},
    position::Position,
};

pub const SCORE_MIN: Score = -1_000_000;
pub const SCORE_MAX: Score = 1_000_000;

/// The search observed a cancel request and gave up on the current iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("search cancelled")
    }
}

impl Error for Cancelled {}

/// The position handed to [IterativeDeepening::decide] has no legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoLegalMove;

impl fmt::Display for NoLegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no legal move in this position")
    }
}

impl Error for NoLegalMove {}

/// Shared cancel request. Cloning hands out another handle to the same flag,
/// so any thread can stop a running search.
///
/// The flag is edge triggered: the search that observes it also clears it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Asks the search to stop. Safe to call at any time and any number of
    /// times, a request made while nothing searches is consumed by the next
    /// search.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// drops a pending request without observing it
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// returns `true` once per cancel request
    #[inline]
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// The position being searched plus the best root move found so far.
pub struct SearchNode<'a, P: Position> {
    position: &'a mut P,
    best_move: Option<P::Move>,
}

impl<'a, P: Position> SearchNode<'a, P> {
    pub fn new(position: &'a mut P) -> Self {
        SearchNode {
            position,
            best_move: None,
        }
    }

    #[inline]
    pub fn position(&self) -> &P {
        self.position
    }

    #[inline]
    pub fn position_mut(&mut self) -> &mut P {
        self.position
    }

    pub fn best_move(&self) -> Option<P::Move> {
        self.best_move
    }

    pub fn set_best_move(&mut self, mve: P::Move) {
        self.best_move = Some(mve);
    }

    pub fn reset_best_move(&mut self) {
        self.best_move = None;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub evaluations: u64,
    /// deepest iteration that ran to completion
    pub completed_depth: u32,
}

/// Depth limited alpha-beta search over a [SearchNode].
pub struct AlphaBeta<'e, E> {
    evaluator: &'e E,
    cancel: CancelFlag,
    stats: SearchStats,
}

impl<'e, E> AlphaBeta<'e, E> {
    pub fn new(evaluator: &'e E, cancel: CancelFlag) -> Self {
        AlphaBeta {
            evaluator,
            cancel,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Searches `node` to `depth` plies inside the window `alpha..beta`.
    ///
    /// The side to move in the root position decides whether the root
    /// maximizes. Root moves that improve the bound are written to the
    /// node's best move slot, deeper plies never touch it.
    pub fn search<P>(
        &mut self,
        node: &mut SearchNode<'_, P>,
        alpha: Score,
        beta: Score,
        depth: u32,
    ) -> Result<Score, Cancelled>
    where
        P: Position,
        E: Evaluator<P>,
    {
        let maximizing = node.position().side_to_move().is_maximizer();
        let depth = i32::try_from(depth).unwrap_or(i32::MAX);
        self.alpha_beta(node, alpha, beta, depth, maximizing, true)
    }

    fn alpha_beta<P>(
        &mut self,
        node: &mut SearchNode<'_, P>,
        mut alpha: Score,
        mut beta: Score,
        depth: i32,
        maximizing: bool,
        root: bool,
    ) -> Result<Score, Cancelled>
    where
        P: Position,
        E: Evaluator<P>,
    {
        if self.cancel.take() {
            return Err(Cancelled);
        }
        self.stats.nodes += 1;

        if depth <= 0 || node.position().is_terminal() {
            self.stats.evaluations += 1;
            return Ok(self.evaluator.evaluate(node.position()));
        }

        for mve in node.position().legal_moves() {
            node.position_mut().play_move(mve);
            let value = self.alpha_beta(node, alpha, beta, depth - 1, !maximizing, false);
            node.position_mut().undo_move(mve);
            let value = value?;

            if maximizing {
                if value > alpha {
                    alpha = value;
                    if root {
                        node.set_best_move(mve);
                    }
                }
                if alpha >= beta {
                    return Ok(beta);
                }
            } else {
                if value < beta {
                    beta = value;
                    if root {
                        node.set_best_move(mve);
                    }
                }
                if beta <= alpha {
                    return Ok(alpha);
                }
            }
        }

        Ok(if maximizing { alpha } else { beta })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// stop after this iteration completes, `None` searches until cancelled
    pub max_depth: Option<u32>,
}

impl SearchLimits {
    pub fn depth(max_depth: u32) -> Self {
        SearchLimits {
            max_depth: Some(max_depth),
        }
    }
}

/// Result of a [IterativeDeepening::decide] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision<M> {
    pub best_move: M,
    /// score of the last completed iteration, 0 if none completed
    pub score: Score,
    /// depth of the last completed iteration, 0 if none completed
    pub depth: u32,
}

/// Runs [AlphaBeta] at depth 1, 2, 3, ... until cancelled and keeps the
/// result of the last iteration that ran to completion.
pub struct IterativeDeepening<E> {
    evaluator: E,
    cancel: CancelFlag,
    limits: SearchLimits,
    stats: SearchStats,
    last_score: Score,
}

impl<E> IterativeDeepening<E> {
    pub fn new(evaluator: E) -> Self {
        IterativeDeepening::with_cancel_flag(evaluator, CancelFlag::new())
    }

    pub fn with_cancel_flag(evaluator: E, cancel: CancelFlag) -> Self {
        IterativeDeepening {
            evaluator,
            cancel,
            limits: SearchLimits::default(),
            stats: SearchStats::default(),
            last_score: 0,
        }
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    /// handle that cancels searches run by this driver
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// score of the last completed iteration of the last search
    pub fn last_score(&self) -> Score {
        self.last_score
    }

    pub fn decide<P>(&mut self, position: &mut P) -> Result<Decision<P::Move>, NoLegalMove>
    where
        P: Position,
        E: Evaluator<P>,
    {
        self.decide_with_progress(position, |_| {})
    }

    /// Like [IterativeDeepening::decide], but reports every completed
    /// iteration to `progress`.
    pub fn decide_with_progress<P>(
        &mut self,
        position: &mut P,
        mut progress: impl FnMut(&Decision<P::Move>),
    ) -> Result<Decision<P::Move>, NoLegalMove>
    where
        P: Position,
        E: Evaluator<P>,
    {
        self.stats = SearchStats::default();
        self.last_score = 0;

        let legal_moves = position.legal_moves();
        if legal_moves.is_empty() {
            return Err(NoLegalMove);
        }

        let mut completed: Option<Decision<P::Move>> = None;
        let mut node = SearchNode::new(position);
        let mut engine = AlphaBeta::new(&self.evaluator, self.cancel.clone());
        let mut depth = 1;

        loop {
            node.reset_best_move();
            match engine.search(&mut node, SCORE_MIN, SCORE_MAX, depth) {
                Ok(score) => {
                    if let Some(best_move) = node.best_move() {
                        let decision = Decision {
                            best_move,
                            score,
                            depth,
                        };
                        debug!(
                            "depth {depth} complete: best {best_move} score {score} nodes {}",
                            engine.stats().nodes
                        );
                        progress(&decision);
                        completed = Some(decision);
                    }
                    self.stats = engine.stats();
                    self.stats.completed_depth = depth;
                }
                Err(Cancelled) => {
                    trace!("search cancelled during depth {depth}");
                    let completed_depth = self.stats.completed_depth;
                    self.stats = engine.stats();
                    self.stats.completed_depth = completed_depth;
                    break;
                }
            }

            if self.limits.max_depth.is_some_and(|max| depth >= max) {
                break;
            }
            depth += 1;
        }

        let decision = match completed {
            Some(decision) => decision,
            None => {
                warn!("no search iteration completed, playing a random move");
                let best_move = *legal_moves
                    .choose(&mut thread_rng())
                    .ok_or(NoLegalMove)?;
                Decision {
                    best_move,
                    score: 0,
                    depth: 0,
                }
            }
        };
        self.last_score = decision.score;
        Ok(decision)
    }
}
