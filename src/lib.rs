//! Slay Beat core crate.
//!
//! A four-lane rhythm battle: notes fall toward a hit line, and every tap that
//! lands inside the judgment window fires a weapon projectile at the stage
//! monster. Damage lands on impact. Winning a stage opens a short bonus round
//! where the player grabs spiraling keys while dodging bombs.
//!
//! The simulation (`engine`, `bonus`), the game tables (`catalog`) and the
//! player economy (`profile`, `store`, `leaderboard`) are plain Rust and run
//! natively. `arena` hosts them in the browser on a canvas driven by
//! `requestAnimationFrame`.

use wasm_bindgen::prelude::*;

pub mod arena;
pub mod audio;
pub mod bonus;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod model;
pub mod profile;
pub mod rng;
pub mod shell;
pub mod store;

pub use bonus::{BonusEnd, BonusGame, BonusOutcome};
pub use config::{BonusConfig, EngineConfig};
pub use engine::{BattleEvent, Outcome, Session, SessionError, SessionResult};
pub use profile::{EconomyError, PlayerProfile};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    // Fails only when a logger is already installed.
    if console_log::init_with_level(level).is_ok() {
        log::info!("slay beat {} loaded", env!("CARGO_PKG_VERSION"));
    }
}
