use std::time::Instant;

use draughts::engine::scythe::Scythe;
use draughts::engine::Engine;
use draughts::Board;

fn main() {
    env_logger::init();

    search_stats(1);
    search_stats(3);
    search_stats(5);
    search_stats(6);
}

fn search_stats(depth: u32) {
    let mut engine = Scythe::new_from_board(Board::start());

    let start = Instant::now();
    let result = engine.search_to_depth(depth);
    let elapsed = start.elapsed();

    match result {
        Ok((best_move, score)) => {
            let stats = engine.stats();
            let best_move = best_move.map(|m| m.to_string()).unwrap_or_default();
            println!(
                "Stats after searching to depth {depth} from start pos:\ntime: {elapsed:?}\nbest: {best_move} score: {score}\n{stats:#?}"
            );
        }
        Err(e) => eprintln!("search to depth {depth} failed: {e:#}"),
    }
}
