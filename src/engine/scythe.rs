use anyhow::{bail, Context};
use log::{error, info};

use super::{
    search::{CancelFlag, Decision, IterativeDeepening, SearchLimits, SearchStats},
    Engine, Result,
};
use crate::{
    eval::{EvalConfig, HeuristicEvaluator, Score},
    Board, Move,
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub eval: EvalConfig,
    pub limits: SearchLimits,
}

pub struct Scythe {
    board: Board,
    config: EngineConfig,
    control: Arc<SearchControl>,
    search_thread: Option<JoinHandle<Result<()>>>,
}

struct SearchControl {
    cancel: CancelFlag,
    searching: AtomicBool,
    score: AtomicI32,
    best_move: Mutex<Option<Move>>,
    stats: Mutex<SearchStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SearchControl {
    fn new() -> Self {
        SearchControl {
            cancel: CancelFlag::new(),
            searching: AtomicBool::new(false),
            score: AtomicI32::new(0),
            best_move: Mutex::new(None),
            stats: Mutex::new(SearchStats::default()),
        }
    }

    fn reset(&self) {
        *lock(&self.best_move) = None;
        self.score.store(0, Ordering::SeqCst);
    }

    fn publish(&self, decision: &Decision<Move>) {
        *lock(&self.best_move) = Some(decision.best_move);
        self.score.store(decision.score, Ordering::SeqCst);
    }

    fn run(&self, board: &mut Board, config: EngineConfig) -> Result<()> {
        let evaluator = HeuristicEvaluator::new(config.eval);
        let mut driver = IterativeDeepening::with_cancel_flag(evaluator, self.cancel.clone())
            .with_limits(config.limits);

        let result = driver.decide_with_progress(board, |decision| self.publish(decision));
        self.searching.store(false, Ordering::SeqCst);
        *lock(&self.stats) = driver.stats();

        let decision = result.context("search found no move")?;
        self.publish(&decision);
        info!(
            "search done: {} score {} depth {}",
            decision.best_move, decision.score, decision.depth
        );
        Ok(())
    }
}

impl Engine for Scythe {
    fn new_from_board(board: Board) -> Self {
        Scythe::with_config(board, EngineConfig::default())
    }

    fn accept_move(&mut self, mve: Move) {
        let restart_search = self.search_thread.is_some();
        if restart_search {
            if let Err(e) = self.end_search() {
                error!("previous search failed: {e:#}");
            }
        }
        self.board.play_move(mve);
        self.control.reset();
        if restart_search {
            self.start_search();
        }
    }

    fn start_search(&mut self) {
        if self.search_thread.is_some() {
            return;
        }

        self.control.cancel.clear();
        self.control.reset();
        self.control.searching.store(true, Ordering::SeqCst);

        let control = self.control.clone();
        let mut board = self.board.clone();
        let config = self.config;
        self.search_thread = Some(thread::spawn(move || control.run(&mut board, config)));
    }

    fn end_search(&mut self) -> Result<()> {
        if let Some(search_thread) = self.search_thread.take() {
            self.control.cancel.cancel();
            let joined = search_thread.join();
            // the search may have finished before it saw the request
            self.control.cancel.clear();
            match joined {
                Ok(result) => result.context("end search")?,
                Err(search_panic) => bail!("Search thread paniced: {search_panic:?}"),
            };
        }

        Ok(())
    }

    fn best_move(&self) -> Option<Move> {
        *lock(&self.control.best_move)
    }

    fn current_score(&self) -> Score {
        self.control.score.load(Ordering::SeqCst)
    }
}

impl Scythe {
    pub fn with_config(board: Board, config: EngineConfig) -> Self {
        Scythe {
            board,
            config,
            control: Arc::new(SearchControl::new()),
            search_thread: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn is_searching(&self) -> bool {
        self.control.searching.load(Ordering::SeqCst)
    }

    /// handle that stops the running search from any thread
    pub fn cancel_handle(&self) -> CancelFlag {
        self.control.cancel.clone()
    }

    /// statistics of the last finished search
    pub fn stats(&self) -> SearchStats {
        *lock(&self.control.stats)
    }

    /// Searches for at most `budget` and returns the best move with its score.
    pub fn think(&mut self, budget: Duration) -> Result<(Move, Score)> {
        let start = Instant::now();
        self.start_search();
        while self.is_searching() {
            let elapsed = start.elapsed();
            if elapsed >= budget {
                break;
            }
            thread::sleep(POLL_INTERVAL.min(budget - elapsed));
        }
        self.end_search()?;

        let best_move = self.best_move().context("search produced no move")?;
        Ok((best_move, self.current_score()))
    }

    pub fn search_to_depth(&mut self, target_depth: u32) -> Result<(Option<Move>, Score)> {
        if self.search_thread.is_some() {
            bail!("Can't search to depth while search is already running");
        }

        self.control.cancel.clear();
        self.control.reset();

        let config = EngineConfig {
            limits: SearchLimits::depth(target_depth),
            ..self.config
        };
        let mut board = self.board.clone();
        self.control.run(&mut board, config)?;

        Ok((self.best_move(), self.current_score()))
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use super::{EngineConfig, Scythe};
    use crate::{
        engine::{search::SearchLimits, Engine},
        Board, Color,
    };

    #[test]
    fn search_to_depth_finds_legal_move() {
        let mut engine = Scythe::new_from_board(Board::start());
        let (best_move, _) = engine.search_to_depth(3).unwrap();
        let best_move = best_move.unwrap();
        assert!(Board::start().generate_valid_moves().contains(&best_move));
        assert_eq!(engine.stats().completed_depth, 3);
        assert!(engine.stats().nodes > 0);
    }

    #[test]
    fn think_returns_legal_move() {
        let mut engine = Scythe::new_from_board(Board::start());
        let (best_move, _) = engine.think(Duration::from_millis(50)).unwrap();
        assert!(engine.board().generate_valid_moves().contains(&best_move));
        assert!(!engine.is_searching());
    }

    #[test]
    fn depth_limited_search_ends_by_itself() {
        let config = EngineConfig {
            limits: SearchLimits::depth(1),
            ..EngineConfig::default()
        };
        let mut engine = Scythe::with_config(Board::start(), config);
        let (best_move, score) = engine.think(Duration::from_secs(10)).unwrap();
        assert!(engine.board().generate_valid_moves().contains(&best_move));
        assert_eq!(score, engine.current_score());
        assert_eq!(engine.stats().completed_depth, 1);
        assert!(!engine.cancel_handle().is_cancelled());
    }

    #[test]
    fn end_search_without_search() {
        let mut engine = Scythe::new_from_board(Board::start());
        assert!(engine.end_search().is_ok());
        assert!(engine.best_move().is_none());
    }

    #[test]
    fn accept_move_advances_board() {
        let mut engine = Scythe::new_from_board(Board::start());
        let mve = engine.board().parse_move("32-28").unwrap();
        engine.accept_move(mve);
        assert_eq!(engine.board().next_move, Color::Black);
        assert!(engine.best_move().is_none());
    }

    #[test]
    fn accept_move_restarts_running_search() {
        let mut engine = Scythe::new_from_board(Board::start());
        engine.start_search();
        let mve = engine.board().parse_move("33-29").unwrap();
        engine.accept_move(mve);
        assert!(engine.is_searching());
        engine.end_search().unwrap();
        let best_move = engine.best_move().unwrap();
        assert!(engine.board().generate_valid_moves().contains(&best_move));
    }

    #[test]
    fn cancel_from_other_thread() {
        let mut engine = Scythe::new_from_board(Board::start());
        engine.start_search();
        let cancel = engine.cancel_handle();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        })
        .join()
        .unwrap();
        engine.end_search().unwrap();
        assert!(engine.best_move().is_some());
    }

    #[test]
    fn no_legal_move_is_an_error() {
        let mut engine = Scythe::new_from_board(Board::from_fen("B:W31:B").unwrap());
        assert!(engine.think(Duration::from_millis(10)).is_err());
        assert!(engine.search_to_depth(2).is_err());
    }

    #[test]
    fn search_to_depth_while_searching_fails() {
        let mut engine = Scythe::new_from_board(Board::start());
        engine.start_search();
        assert!(engine.search_to_depth(1).is_err());
        engine.end_search().unwrap();
    }
}
