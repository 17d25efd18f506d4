//! Headless arena driver
//!
//! Usage: `airhockey-arena [settings.json] [steps]`
//!
//! Runs the training grid with the built-in puck chaser, logs per-arena
//! results and prints the final pool snapshot as JSON.

#[cfg(not(target_arch = "wasm32"))]
use airhockey_arena::SimSettings;
#[cfg(not(target_arch = "wasm32"))]
use airhockey_arena::sim::{ArenaPool, ChasePuckPolicy, GameEvent, Side};

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_STEPS: u64 = 10_000;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Air hockey arena (headless) starting...");

    if let Err(message) = run() {
        log::error!("{message}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; hosts drive ArenaPool directly
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => SimSettings::load(&path).map_err(|e| format!("{path}: {e}"))?,
        None => SimSettings::training(),
    };
    let steps = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .map_err(|e| format!("invalid step count {arg:?}: {e}"))?,
        None => DEFAULT_STEPS,
    };

    let mut pool = ArenaPool::new(&settings).map_err(|e| e.to_string())?;
    let policy = ChasePuckPolicy::default();

    let mut goals = 0u64;
    let mut matches = 0u64;
    for _ in 0..steps {
        let reports = pool.step(&policy);
        for event in ArenaPool::events(&reports) {
            match event.event {
                GameEvent::Goal { .. } => goals += 1,
                GameEvent::MatchWon { winner } => {
                    matches += 1;
                    log::info!("arena {}: match won by {}", event.arena, winner.player_label());
                }
                _ => {}
            }
        }
    }

    log::info!("{steps} steps: {goals} goals, {matches} matches");
    for arena in pool.arenas() {
        log::info!(
            "arena {} @ {}: {}-{} after {} episodes",
            arena.id(),
            arena.origin(),
            arena.score().score(Side::Near),
            arena.score().score(Side::Far),
            arena.episodes()
        );
    }

    let json = serde_json::to_string_pretty(&pool.snapshot()).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
