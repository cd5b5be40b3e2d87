//! Bonus round played after a win: tokens spiral out of a center point and
//! the player taps them to collect keys. Tapping the bomb ends the round early.
//! Either way the round reports what was collected.

use rand::Rng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::config::{BonusConfig, REFERENCE_FRAME_MS};
use crate::model::{KeyType, Keys};
use crate::rng::WeightedTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Common,
    Basic,
    Premium,
    Bomb,
}

impl ItemKind {
    pub fn key_type(self) -> Option<KeyType> {
        match self {
            ItemKind::Common => Some(KeyType::Common),
            ItemKind::Basic => Some(KeyType::Basic),
            ItemKind::Premium => Some(KeyType::Premium),
            ItemKind::Bomb => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BonusItem {
    pub id: u64,
    pub kind: ItemKind,
    pub start_angle: f64,
    /// Radius gained per reference frame.
    pub speed: f64,
    pub scale: f64,
    pub spawned_at: f64,
}

impl BonusItem {
    fn frames(&self, elapsed: f64) -> f64 {
        ((elapsed - self.spawned_at) / REFERENCE_FRAME_MS).max(0.0)
    }

    pub fn distance(&self, elapsed: f64) -> f64 {
        self.speed * self.frames(elapsed)
    }

    pub fn angle(&self, elapsed: f64, angular_speed: f64) -> f64 {
        self.start_angle + angular_speed * self.frames(elapsed)
    }

    /// Offset from the center in pixels.
    pub fn position(&self, elapsed: f64, angular_speed: f64) -> (f64, f64) {
        let d = self.distance(elapsed);
        let a = self.angle(elapsed, angular_speed);
        (a.cos() * d, a.sin() * d)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusEnd {
    TimeUp,
    Bomb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BonusOutcome {
    pub reason: BonusEnd,
    pub keys: Keys,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchResult {
    Collected(KeyType),
    Detonated,
    Ignored,
}

pub struct BonusGame<R = SmallRng> {
    config: BonusConfig,
    rng: R,
    table: WeightedTable<ItemKind>,
    items: Vec<BonusItem>,
    collected: Keys,
    started_at: Option<f64>,
    last_spawn: Option<f64>,
    elapsed: f64,
    outcome: Option<BonusOutcome>,
    next_id: u64,
}

impl BonusGame<SmallRng> {
    pub fn with_entropy(config: BonusConfig) -> Self {
        BonusGame::new(config, crate::rng::entropy_rng())
    }
}

impl<R: Rng> BonusGame<R> {
    pub fn new(config: BonusConfig, rng: R) -> Self {
        let table = WeightedTable::new(
            vec![
                (config.common_threshold, ItemKind::Common),
                (config.basic_threshold, ItemKind::Basic),
                (config.premium_threshold, ItemKind::Premium),
            ],
            ItemKind::Bomb,
        );
        Self {
            config,
            rng,
            table,
            items: Vec::new(),
            collected: Keys::default(),
            started_at: None,
            last_spawn: None,
            elapsed: 0.0,
            outcome: None,
            next_id: 0,
        }
    }

    pub fn start(&mut self, now: f64) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
            log::info!("bonus round started");
        }
    }

    /// Advance to `now`. Returns the outcome once the round is over.
    pub fn step(&mut self, now: f64) -> Option<BonusOutcome> {
        if self.outcome.is_some() {
            return self.outcome;
        }
        let started = self.started_at?;
        self.elapsed = (now - started).max(0.0);

        if self.elapsed >= self.config.duration_ms {
            return Some(self.finish(BonusEnd::TimeUp));
        }

        if self.last_spawn.is_none_or(|t| self.elapsed - t > self.config.spawn_interval_ms) {
            self.spawn();
        }

        let (elapsed, max_radius) = (self.elapsed, self.config.max_radius);
        self.items.retain(|item| item.distance(elapsed) < max_radius);
        None
    }

    fn spawn(&mut self) {
        let kind = self.table.sample(&mut self.rng);
        self.next_id += 1;
        let item = BonusItem {
            id: self.next_id,
            kind,
            start_angle: self.rng.r#gen::<f64>() * std::f64::consts::TAU,
            speed: self.config.min_speed + self.rng.r#gen::<f64>() * self.config.speed_spread,
            scale: self.config.min_scale + self.rng.r#gen::<f64>() * self.config.scale_spread,
            spawned_at: self.elapsed,
        };
        log::trace!("bonus item {} ({:?})", item.id, item.kind);
        self.items.push(item);
        self.last_spawn = Some(self.elapsed);
    }

    /// Tap on item `id`.
    pub fn catch(&mut self, id: u64) -> CatchResult {
        if self.outcome.is_some() {
            return CatchResult::Ignored;
        }
        let Some(idx) = self.items.iter().position(|i| i.id == id) else {
            return CatchResult::Ignored;
        };
        match self.items[idx].kind.key_type() {
            Some(kind) => {
                self.items.remove(idx);
                *self.collected.get_mut(kind) += 1;
                CatchResult::Collected(kind)
            }
            None => {
                self.finish(BonusEnd::Bomb);
                CatchResult::Detonated
            }
        }
    }

    fn finish(&mut self, reason: BonusEnd) -> BonusOutcome {
        let outcome = BonusOutcome { reason, keys: self.collected };
        log::info!(
            "bonus round over ({:?}): {} common, {} basic, {} premium",
            reason,
            outcome.keys.common,
            outcome.keys.basic,
            outcome.keys.premium
        );
        self.outcome = Some(outcome);
        outcome
    }

    pub fn items(&self) -> &[BonusItem] {
        &self.items
    }

    pub fn collected(&self) -> Keys {
        self.collected
    }

    pub fn outcome(&self) -> Option<BonusOutcome> {
        self.outcome
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn config(&self) -> &BonusConfig {
        &self.config
    }

    /// Whole seconds left on the countdown.
    pub fn seconds_left(&self) -> u32 {
        ((self.config.duration_ms - self.elapsed).max(0.0) / 1000.0).ceil() as u32
    }
}
