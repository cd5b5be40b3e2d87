//! Browser host for the rhythm battle and the bonus round.
//!
//! `start_battle(stage)` sets up the canvas, starts a `Session` and drives it
//! from `requestAnimationFrame` with `performance.now()`. Input comes from
//! pointer taps on the lanes and the `D F J K` keys; `P` pauses and `Escape`
//! quits. When a battle ends the result goes to the shell; a win rolls
//! straight into the bonus round on the same canvas, anything else stops the
//! loop.
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use crate::audio::{AudioService, SoundEffect, WebAudioBackend};
use crate::bonus::{BonusGame, CatchResult};
use crate::config::{BonusConfig, EngineConfig};
use crate::engine::{BattleEvent, Session, SessionState};
use crate::leaderboard::InMemoryLeaderboard;
use crate::shell::{NoticeKind, Shell, View};
use crate::store::{LocalStorage, MemoryStorage, ProfileStorage};

mod render;

pub use render::{LANE_KEYS, Layout};

const CANVAS_ID: &str = "sb-arena-canvas";
const CANVAS_W: u32 = 480;
const CANVAS_H: u32 = 800;
/// Tap radius around a bonus item, before item scale.
const ITEM_HIT_RADIUS: f64 = 24.0;

pub type BrowserShell = Shell<Box<dyn ProfileStorage>, InMemoryLeaderboard, WebAudioBackend>;

enum Phase {
    Battle(Session),
    Bonus(BonusGame),
    Idle,
}

struct ArenaState {
    ctx: CanvasRenderingContext2d,
    layout: Layout,
    phase: Phase,
    running: bool,
}

thread_local! {
    static ARENA: RefCell<Option<ArenaState>> = const { RefCell::new(None) };
    static SHELL: RefCell<Option<BrowserShell>> = const { RefCell::new(None) };
    static ENGINE_CONFIG: RefCell<EngineConfig> = RefCell::new(EngineConfig::default());
    static LISTENERS: RefCell<bool> = const { RefCell::new(false) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

// --- Clocks -----------------------------------------------------------------

fn perf_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Wall clock in epoch ms, for cooldowns and leaderboard periods.
fn epoch_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.time_origin() + p.now())
        .unwrap_or(0.0)
}

// --- Shell access -----------------------------------------------------------

fn new_browser_shell() -> BrowserShell {
    let storage: Box<dyn ProfileStorage> = match LocalStorage::from_window() {
        Ok(s) => Box::new(s),
        Err(e) => {
            log::warn!("progress will not persist: {}", e);
            Box::new(MemoryStorage::new())
        }
    };
    Shell::new(
        storage,
        InMemoryLeaderboard::new(),
        AudioService::new(WebAudioBackend::default()),
    )
}

pub fn with_shell<T>(f: impl FnOnce(&mut BrowserShell) -> T) -> T {
    SHELL.with(|cell| {
        let mut slot = cell.borrow_mut();
        f(slot.get_or_insert_with(new_browser_shell))
    })
}

// --- JS entry points --------------------------------------------------------

/// Override engine tuning from JSON. Missing fields keep their defaults.
#[wasm_bindgen]
pub fn set_engine_config(json: &str) -> Result<(), JsValue> {
    let config = EngineConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    ENGINE_CONFIG.with(|c| *c.borrow_mut() = config);
    Ok(())
}

/// Current profile as JSON.
#[wasm_bindgen]
pub fn profile_json() -> Result<String, JsValue> {
    with_shell(|s| serde_json::to_string(s.profile())).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn start_battle(stage: u32) -> Result<(), JsValue> {
    let config = ENGINE_CONFIG.with(|c| c.borrow().clone());
    let mut session = with_shell(|s| {
        s.select_stage(stage, epoch_now())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        s.begin_battle(config)
            .ok_or_else(|| JsValue::from_str("no stage selected"))
    })?;
    session
        .start(perf_now())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let ctx = setup_canvas()?;
    install_listeners()?;
    let start_loop = ARENA.with(|cell| {
        let mut slot = cell.borrow_mut();
        let was_running = slot.as_ref().is_some_and(|a| a.running);
        *slot = Some(ArenaState {
            ctx,
            layout: Layout { width: CANVAS_W as f64, height: CANVAS_H as f64 },
            phase: Phase::Battle(session),
            running: true,
        });
        !was_running
    });
    if start_loop {
        start_arena_loop();
    }
    Ok(())
}

/// Tap a lane from JS (on-screen buttons).
#[wasm_bindgen]
pub fn hit_lane(lane: usize) {
    with_arena(|state| {
        if let Phase::Battle(session) = &mut state.phase {
            let events = session.hit(lane, perf_now());
            with_shell(|s| s.audio_mut().play_events(&events));
        }
    });
}

#[wasm_bindgen]
pub fn toggle_pause() {
    with_arena(|state| {
        if let Phase::Battle(session) = &mut state.phase {
            match session.toggle_pause(perf_now()) {
                Ok(()) if session.state() == SessionState::Paused => {
                    with_shell(|s| s.audio_mut().pause_music())
                }
                Ok(()) => with_shell(|s| s.audio_mut().resume_music()),
                Err(e) => log::debug!("pause ignored: {}", e),
            }
        }
    });
}

#[wasm_bindgen]
pub fn quit_battle() {
    with_arena(|state| {
        if let Phase::Battle(session) = &mut state.phase {
            match session.quit() {
                Ok(result) => {
                    with_shell(|s| s.finish_battle(&result, epoch_now()));
                    state.phase = Phase::Idle;
                }
                Err(e) => log::debug!("quit ignored: {}", e),
            }
        }
    });
}

fn with_arena(f: impl FnOnce(&mut ArenaState)) {
    ARENA.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut() {
            f(state);
        }
    });
}

// --- Setup ------------------------------------------------------------------

fn setup_canvas() -> Result<CanvasRenderingContext2d, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_width(CANVAS_W);
        c.set_height(CANVAS_H);
        c.set_attribute("style", "position:fixed; left:50%; top:50%; transform:translate(-50%,-50%); border-radius:24px; border:2px solid #1e293b; background:#020617; touch-action:none; z-index:20;").ok();
        let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
        body.append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    Ok(ctx)
}

fn install_listeners() -> Result<(), JsValue> {
    if LISTENERS.with(|l| l.replace(true)) {
        return Ok(());
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Keyboard: lanes, pause, quit
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.repeat() {
                return;
            }
            let key = evt.key();
            match key.as_str() {
                "Escape" => quit_battle(),
                "p" | "P" => toggle_pause(),
                _ => {
                    if let Some(lane) = LANE_KEYS.iter().position(|k| k.eq_ignore_ascii_case(&key)) {
                        hit_lane(lane);
                    }
                }
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Pointer: lane taps in battle, item taps in the bonus round
    if let Some(canvas) = doc.get_element_by_id(CANVAS_ID) {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::PointerEvent| {
            let x = evt.offset_x() as f64;
            let y = evt.offset_y() as f64;
            on_pointer(x, y);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn on_pointer(x: f64, y: f64) {
    let mut lane_tap = None;
    with_arena(|state| match &mut state.phase {
        Phase::Battle(_) => lane_tap = state.layout.lane_at(x),
        Phase::Bonus(game) => {
            let elapsed = game.elapsed();
            let spin = game.config().angular_speed;
            let target = game.items().iter().rev().find(|item| {
                let (ix, iy) = render::item_screen_pos(state.layout, item, elapsed, spin);
                let r = ITEM_HIT_RADIUS * item.scale;
                (ix - x).powi(2) + (iy - y).powi(2) <= r * r
            });
            if let Some(id) = target.map(|i| i.id) {
                match game.catch(id) {
                    CatchResult::Collected(_) => with_shell(|s| s.audio_mut().play(SoundEffect::Success)),
                    CatchResult::Detonated => with_shell(|s| s.audio_mut().play(SoundEffect::Error)),
                    CatchResult::Ignored => {}
                }
            }
        }
        Phase::Idle => {}
    });
    if let Some(lane) = lane_tap {
        hit_lane(lane);
    }
}

// --- Loop -------------------------------------------------------------------

fn start_arena_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        let keep = ARENA.with(|cell| match cell.borrow_mut().as_mut() {
            Some(state) => {
                state.running = arena_tick(state, ts);
                state.running
            }
            None => false,
        });
        if !keep {
            log::debug!("arena loop stopped");
            return;
        }
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

/// One frame. Returns whether another frame should be scheduled.
fn arena_tick(state: &mut ArenaState, now: f64) -> bool {
    match &mut state.phase {
        Phase::Battle(session) => {
            let events = session.step(now);
            with_shell(|s| s.audio_mut().play_events(&events));
            let travel = session.config().travel_time_ms(session.monster().level);
            let snap = session.snapshot(now);
            render::draw_battle(&state.ctx, state.layout, &snap, travel, &session.monster().name);

            let finished = events.iter().find_map(|e| match e {
                BattleEvent::Finished { result } => Some(result.clone()),
                _ => None,
            });
            if let Some(result) = finished {
                let view = with_shell(|s| {
                    s.finish_battle(&result, epoch_now());
                    s.view()
                });
                if view == View::BonusGame {
                    let mut game = BonusGame::with_entropy(BonusConfig::default());
                    game.start(now);
                    state.phase = Phase::Bonus(game);
                } else {
                    state.phase = Phase::Idle;
                    return false;
                }
            }
            true
        }
        Phase::Bonus(game) => {
            if let Some(outcome) = game.step(now) {
                with_shell(|s| {
                    let keys = outcome.keys;
                    s.notify(
                        format!("Bonus: +{} / +{} / +{} keys", keys.common, keys.basic, keys.premium),
                        NoticeKind::Success,
                        epoch_now(),
                    );
                    s.finish_bonus(&outcome, epoch_now());
                });
                state.phase = Phase::Idle;
                return false;
            }
            let c = game.collected();
            render::draw_bonus(
                &state.ctx,
                state.layout,
                game.items(),
                game.elapsed(),
                game.config().angular_speed,
                game.seconds_left(),
                (c.common, c.basic, c.premium),
            );
            true
        }
        Phase::Idle => false,
    }
}
