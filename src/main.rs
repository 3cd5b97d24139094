//! Lines entry point
//!
//! Headless autoplay: a ticker thread and a random player share one engine
//! behind a mutex, the way a UI timer and click handler would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand_pcg::Pcg32;

use lines::consts::TICK_INTERVAL_MS;
use lines::game::ClickOutcome;
use lines::persistence::MemoryStore;
use lines::{Clock, EngineConfig, Pos, Settings, SystemClock, TurnEngine, format_duration};

const DEFAULT_MOVES: usize = 300;
const MOVE_DELAY_MS: u64 = 5;

fn lock(engine: &Mutex<TurnEngine>) -> MutexGuard<'_, TurnEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Select a random token that can move and move it somewhere reachable
fn play_move(engine: &mut TurnEngine, rng: &mut Pcg32) -> Option<ClickOutcome> {
    let mut origins: Vec<Pos> = engine
        .grid()
        .cells()
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.pos())
        .collect();
    origins.shuffle(rng);

    for origin in origins {
        if engine.handle_cell_click(origin) != ClickOutcome::Selected {
            continue;
        }
        let targets: Vec<Pos> = engine
            .grid()
            .cells()
            .iter()
            .filter(|c| c.is_empty() && engine.grid().is_reachable(c.pos()))
            .map(|c| c.pos())
            .collect();
        match targets.choose(rng) {
            Some(&target) => return Some(engine.handle_cell_click(target)),
            None => {
                engine.handle_cell_click(origin);
            }
        }
    }
    None
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| SystemClock.now_ms());
    let moves = args
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MOVES);

    let settings = Settings {
        turn_time_enabled: true,
        turn_time_limit: 5,
        ..Settings::default()
    };
    log::info!("Lines starting with seed {}", seed);

    let mut store = MemoryStore::new();
    let mut engine = TurnEngine::restore(
        &store,
        EngineConfig::from_settings(&settings),
        seed,
        SystemClock,
    );
    engine.apply_settings(&settings);
    let engine = Arc::new(Mutex::new(engine));

    let running = Arc::new(AtomicBool::new(true));
    let ticker = {
        let engine = Arc::clone(&engine);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(TICK_INTERVAL_MS));
                if lock(&engine).tick() {
                    log::info!("Turn timed out");
                }
            }
        })
    };

    let player = settings.player_name.clone().unwrap_or_else(|| "autoplay".to_string());
    let mut rng = Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    for _ in 0..moves {
        {
            let mut engine = lock(&engine);
            if let Some(ClickOutcome::Moved { popped, .. }) = play_move(&mut engine, &mut rng) {
                if popped > 0 {
                    log::info!("Popped {} (score {})", popped, engine.score());
                }
            }
            if engine.pending_score().is_some() {
                if let Some(rank) = engine.commit_score_entry(&player) {
                    log::info!("Game over, leaderboard rank {}", rank);
                }
            }
        }
        thread::sleep(Duration::from_millis(MOVE_DELAY_MS));
    }

    running.store(false, Ordering::Relaxed);
    if ticker.join().is_err() {
        log::error!("Ticker thread panicked");
    }

    let engine = lock(&engine);
    if !engine.save(&mut store) {
        log::warn!("Could not save the game");
    }
    println!(
        "Score {} on {}x{} after {}",
        engine.score(),
        engine.grid().size(),
        engine.grid().size(),
        format_duration(engine.meta().total_game_time())
    );
    for (rank, entry) in engine.leaderboard().entries().iter().enumerate() {
        println!("{:>2}. {}", rank + 1, entry);
    }
}
