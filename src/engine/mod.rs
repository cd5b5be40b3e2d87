//! Rhythm-battle session.
//!
//! A `Session` owns every piece of mutable battle state and is advanced by
//! the host calling [`Session::step`] once per animation frame with a
//! millisecond clock (`performance.now()` in the browser). Taps arrive through
//! [`Session::hit`]. All positions and timers derive from that clock, so the
//! simulation does not depend on frame rate.
//!
//! Frame order is fixed: timeout check, note spawning, projectile advance and
//! impact, miss judgment, cosmetic cleanup. Damage lands only on projectile
//! impact, never at tap time.

pub mod damage;
pub mod events;
pub mod notes;
pub mod projectile;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::config::{EngineConfig, LANE_COUNT};
use crate::model::{Loadout, Monster};

pub use events::{BattleEvent, Outcome, ResultStats, ResultTag, SessionResult};
pub use notes::Note;
pub use projectile::{Point, Projectile, Trajectory};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Paused,
    Terminated(Outcome),
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Terminated(_) => "terminated",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} a session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Floating damage number shown at an impact point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DamageNumber {
    pub value: u64,
    pub crit: bool,
    pub at: Point,
    pub spawned_at: f64,
}

/// Render-ready projectile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectileView {
    pub id: u64,
    pub icon: String,
    pub position: Point,
    pub progress: f64,
    pub crit: bool,
}

/// Read-only copy of the session for hosts and renderers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub elapsed: f64,
    pub health: u64,
    pub max_health: u64,
    pub lives: u32,
    pub combo: u32,
    pub paused: bool,
    pub finished: bool,
    pub notes: Vec<Note>,
    pub projectiles: Vec<ProjectileView>,
    pub damage_numbers: Vec<DamageNumber>,
}

pub struct Session<R = SmallRng> {
    monster: Monster,
    loadout: Loadout,
    config: EngineConfig,
    rng: R,
    state: SessionState,

    health: u64,
    lives: u32,
    combo: u32,
    max_combo: u32,

    notes: Vec<Note>,
    projectiles: Vec<Projectile>,
    damage_numbers: Vec<DamageNumber>,

    // --- Clock ---
    started_at: f64,
    paused_at: Option<f64>,
    paused_total: f64,
    last_elapsed: f64,
    last_spawn: Option<f64>,
    next_id: u64,
}

impl Session<SmallRng> {
    /// Session seeded from platform entropy.
    pub fn with_entropy(monster: Monster, loadout: Loadout, config: EngineConfig) -> Self {
        Session::new(monster, loadout, config, crate::rng::entropy_rng())
    }
}

impl<R: Rng> Session<R> {
    pub fn new(monster: Monster, loadout: Loadout, config: EngineConfig, rng: R) -> Self {
        let lives = config.base_lives + loadout.bonus_lives();
        Self {
            health: monster.max_health,
            monster,
            loadout,
            config,
            rng,
            state: SessionState::NotStarted,
            lives,
            combo: 0,
            max_combo: 0,
            notes: Vec::new(),
            projectiles: Vec::new(),
            damage_numbers: Vec::new(),
            started_at: 0.0,
            paused_at: None,
            paused_total: 0.0,
            last_elapsed: 0.0,
            last_spawn: None,
            next_id: 0,
        }
    }

    // --- Lifecycle ----------------------------------------------------------

    pub fn start(&mut self, now: f64) -> Result<(), SessionError> {
        if self.state != SessionState::NotStarted {
            return Err(self.invalid("start"));
        }
        self.started_at = now;
        self.state = SessionState::Running;
        log::info!(
            "battle started: {} (level {}, hp {}, lives {})",
            self.monster.name,
            self.monster.level,
            self.health,
            self.lives
        );
        Ok(())
    }

    pub fn pause(&mut self, now: f64) -> Result<(), SessionError> {
        if self.state != SessionState::Running {
            return Err(self.invalid("pause"));
        }
        self.paused_at = Some(now);
        self.state = SessionState::Paused;
        log::debug!("battle paused at {:.0}ms", self.elapsed_at(now));
        Ok(())
    }

    pub fn resume(&mut self, now: f64) -> Result<(), SessionError> {
        if self.state != SessionState::Paused {
            return Err(self.invalid("resume"));
        }
        if let Some(at) = self.paused_at.take() {
            self.paused_total += (now - at).max(0.0);
        }
        self.state = SessionState::Running;
        log::debug!("battle resumed at {:.0}ms", self.elapsed_at(now));
        Ok(())
    }

    /// Abort from any non-terminal state. In-flight projectiles are dropped
    /// without resolving.
    pub fn quit(&mut self) -> Result<SessionResult, SessionError> {
        if self.is_finished() {
            return Err(self.invalid("quit"));
        }
        self.projectiles.clear();
        Ok(self.finish(Outcome::Quit))
    }

    pub fn toggle_pause(&mut self, now: f64) -> Result<(), SessionError> {
        match self.state {
            SessionState::Paused => self.resume(now),
            _ => self.pause(now),
        }
    }

    // --- Frame update -------------------------------------------------------

    /// Advance the simulation to `now`. Does nothing unless running.
    pub fn step(&mut self, now: f64) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Running {
            return events;
        }
        let elapsed = self.elapsed_at(now);
        self.last_elapsed = elapsed;

        if elapsed > self.monster.duration_ms() {
            log::info!("battle timed out after {:.0}ms", elapsed);
            events.push(self.finished_event(Outcome::Lose));
            return events;
        }

        self.spawn_notes(elapsed, &mut events);

        if self.advance_projectiles(elapsed, &mut events) {
            return events;
        }

        if self.judge_misses(elapsed, &mut events) {
            return events;
        }

        let linger = self.config.note_linger_ms.max(self.config.hit_window_ms);
        self.notes.retain(|n| elapsed < n.time + linger);
        let dn_life = self.config.damage_number_ms;
        self.damage_numbers.retain(|d| elapsed - d.spawned_at < dn_life);
        events
    }

    fn spawn_notes(&mut self, elapsed: f64, events: &mut Vec<BattleEvent>) {
        let level = self.monster.level;
        let interval = self.config.spawn_interval_ms(level);
        let due = self.last_spawn.is_none_or(|t| elapsed - t > interval);
        if !due {
            return;
        }
        let time = elapsed + self.config.travel_time_ms(level);
        for lane in notes::burst_lanes(&mut self.rng, self.config.burst_size(level)) {
            let id = self.alloc_id();
            self.notes.push(Note { id, lane, time, hit: false, missed: false });
            log::trace!("note {id} spawned in lane {lane} for {time:.0}ms");
            events.push(BattleEvent::NoteSpawned { id, lane, time });
        }
        self.last_spawn = Some(elapsed);
    }

    /// Returns true when an impact ended the fight.
    fn advance_projectiles(&mut self, elapsed: f64, events: &mut Vec<BattleEvent>) -> bool {
        let flight = self.config.projectile_flight_ms();
        let in_flight = std::mem::take(&mut self.projectiles);
        let mut remaining = Vec::with_capacity(in_flight.len());
        for p in in_flight {
            if p.progress(elapsed, flight) < 1.0 {
                remaining.push(p);
                continue;
            }
            self.health = self.health.saturating_sub(p.damage);
            self.damage_numbers.push(DamageNumber {
                value: p.damage,
                crit: p.crit,
                at: p.target,
                spawned_at: elapsed,
            });
            log::debug!(
                "impact {} for {}{} -> hp {}",
                p.id,
                p.damage,
                if p.crit { " (crit)" } else { "" },
                self.health
            );
            events.push(BattleEvent::Impact {
                projectile_id: p.id,
                damage: p.damage,
                crit: p.crit,
                health: self.health,
                at: p.target,
            });
            if self.health == 0 {
                let exp = self.monster.exp_reward;
                events.push(self.finished_event(Outcome::Win { exp }));
                return true;
            }
        }
        self.projectiles = remaining;
        false
    }

    /// Returns true when the last life was lost.
    fn judge_misses(&mut self, elapsed: f64, events: &mut Vec<BattleEvent>) -> bool {
        let window = self.config.hit_window_ms;
        for i in 0..self.notes.len() {
            if !self.notes[i].is_overdue(elapsed, window) {
                continue;
            }
            let note = &mut self.notes[i];
            note.missed = true;
            let (id, lane) = (note.id, note.lane);
            self.combo = 0;
            self.lives = self.lives.saturating_sub(1);
            log::debug!("note {id} missed in lane {lane}, {} lives left", self.lives);
            events.push(BattleEvent::NoteMissed { id, lane, lives: self.lives });
            if self.lives == 0 {
                events.push(self.finished_event(Outcome::Lose));
                return true;
            }
        }
        false
    }

    // --- Input --------------------------------------------------------------

    /// Judge a tap in `lane`. A tap with no note in range does nothing.
    pub fn hit(&mut self, lane: usize, now: f64) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Running || lane >= LANE_COUNT {
            return events;
        }
        let elapsed = self.elapsed_at(now);
        let Some(idx) = notes::find_hittable(&self.notes, lane, elapsed, self.config.hit_window_ms)
        else {
            return events;
        };
        self.notes[idx].hit = true;
        let note_id = self.notes[idx].id;

        let strike = damage::roll_strike(&mut self.rng, &self.loadout.weapons, self.combo, &self.config);
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        events.push(BattleEvent::NoteHit { id: note_id, lane, combo: self.combo });

        let id = self.alloc_id();
        let projectile = projectile::launch(
            &mut self.rng,
            projectile::LaunchSpec {
                id,
                icon: strike.icon,
                damage: strike.damage,
                crit: strike.crit,
                launched_at: elapsed,
                team_size: self.loadout.characters.len(),
            },
        );
        events.push(BattleEvent::ProjectileLaunched { id, damage: strike.damage, crit: strike.crit });
        self.projectiles.push(projectile);
        events
    }

    // --- Queries ------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            SessionState::Terminated(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Terminated(_))
    }

    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn health(&self) -> u64 {
        self.health
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn damage_numbers(&self) -> &[DamageNumber] {
        &self.damage_numbers
    }

    /// Session time at `now`, excluding paused spans. Frozen while paused.
    pub fn elapsed_at(&self, now: f64) -> f64 {
        match self.state {
            SessionState::NotStarted => 0.0,
            SessionState::Terminated(_) => self.last_elapsed,
            _ => {
                let now = self.paused_at.unwrap_or(now);
                (now - self.started_at - self.paused_total).max(0.0)
            }
        }
    }

    pub fn snapshot(&self, now: f64) -> Snapshot {
        let elapsed = self.elapsed_at(now);
        let flight = self.config.projectile_flight_ms();
        Snapshot {
            elapsed,
            health: self.health,
            max_health: self.monster.max_health,
            lives: self.lives,
            combo: self.combo,
            paused: self.state == SessionState::Paused,
            finished: self.is_finished(),
            notes: self.notes.clone(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| {
                    let progress = p.progress(elapsed, flight).min(1.0);
                    ProjectileView {
                        id: p.id,
                        icon: p.icon.clone(),
                        position: p.position(progress),
                        progress,
                        crit: p.crit,
                    }
                })
                .collect(),
            damage_numbers: self.damage_numbers.clone(),
        }
    }

    // --- Internals ----------------------------------------------------------

    fn finished_event(&mut self, outcome: Outcome) -> BattleEvent {
        BattleEvent::Finished { result: self.finish(outcome) }
    }

    fn finish(&mut self, outcome: Outcome) -> SessionResult {
        self.state = SessionState::Terminated(outcome);
        self.paused_at = None;
        log::info!(
            "battle against {} finished: {:?} (max combo {})",
            self.monster.name,
            outcome,
            self.max_combo
        );
        outcome.to_result()
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition { action, state: self.state.name() }
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn monster(health: u64, duration: u32) -> Monster {
        Monster {
            max_health: health,
            duration,
            ..catalog::stage(1).unwrap().clone()
        }
    }

    fn session(health: u64, lives: u32) -> Session<StdRng> {
        let cfg = EngineConfig { base_lives: lives, ..EngineConfig::default() };
        Session::new(monster(health, 60), Loadout::default(), cfg, StdRng::seed_from_u64(42))
    }

    #[test]
    fn lifecycle_transitions() {
        let mut s = session(1000, 3);
        assert!(s.pause(0.0).is_err());
        s.start(0.0).unwrap();
        assert!(s.start(1.0).is_err());
        s.pause(10.0).unwrap();
        assert_eq!(s.state(), SessionState::Paused);
        s.resume(20.0).unwrap();
        assert_eq!(s.state(), SessionState::Running);
        let res = s.quit().unwrap();
        assert_eq!(res.result, ResultTag::Quit);
        assert!(s.quit().is_err());
        assert!(s.resume(30.0).is_err());
    }

    #[test]
    fn cancel_before_start_is_quit() {
        let mut s = session(1000, 3);
        s.quit().unwrap();
        assert_eq!(s.outcome(), Some(Outcome::Quit));
        assert!(s.start(0.0).is_err());
    }

    #[test]
    fn not_started_does_not_simulate() {
        let mut s = session(1000, 3);
        assert!(s.step(5000.0).is_empty());
        assert!(s.notes().is_empty());
    }

    #[test]
    fn first_frame_spawns_a_burst() {
        let mut s = session(1000, 3);
        s.start(100.0).unwrap();
        let ev = s.step(100.0);
        assert_eq!(ev.len(), 1);
        assert_eq!(s.notes().len(), 1);
        let travel = s.config().travel_time_ms(1);
        assert!((s.notes()[0].time - travel).abs() < 1e-9);
        // not due again until the interval passes
        assert!(s.step(500.0).is_empty());
        assert_eq!(s.step(1100.0).len(), 1);
    }

    #[test]
    fn quit_drops_in_flight_projectiles() {
        let mut s = session(1000, 3);
        s.start(0.0).unwrap();
        s.step(0.0);
        let note = s.notes()[0].clone();
        s.hit(note.lane, note.time);
        assert_eq!(s.projectiles().len(), 1);
        s.quit().unwrap();
        assert!(s.projectiles().is_empty());
        assert!(s.step(note.time + 1000.0).is_empty());
        assert_eq!(s.health(), 1000);
    }

    #[test]
    fn damage_numbers_expire() {
        let mut s = session(100_000, 3);
        s.start(0.0).unwrap();
        s.step(0.0);
        let note = s.notes()[0].clone();
        s.hit(note.lane, note.time);
        s.step(note.time + 250.0);
        assert_eq!(s.damage_numbers().len(), 1);
        s.step(note.time + 1300.0);
        assert!(s.damage_numbers().is_empty());
    }

    #[test]
    fn snapshot_reports_projectile_position() {
        let mut s = session(100_000, 3);
        s.start(0.0).unwrap();
        s.step(0.0);
        let note = s.notes()[0].clone();
        s.hit(note.lane, note.time);
        let half = s.config().projectile_flight_ms() / 2.0;
        let snap = s.snapshot(note.time + half);
        assert_eq!(snap.projectiles.len(), 1);
        assert!((snap.projectiles[0].progress - 0.5).abs() < 1e-9);
        assert_eq!(snap.max_health, 100_000);
    }
}
