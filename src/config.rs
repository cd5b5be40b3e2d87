//! Tunable constants for the battle engine and the bonus round.
//!
//! Defaults are the canonical values; a host may override any subset from JSON
//! (missing fields keep their default).

use serde::{Deserialize, Serialize};

/// Length of one reference frame in milliseconds. Per-frame speeds in the
/// configs are expressed against this so the simulation stays frame-rate
/// independent.
pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Number of input lanes.
pub const LANE_COUNT: usize = 4;

/// Damage profile used when the loadout has no weapons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FallbackProfile {
    pub damage: f64,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Symmetric judgment window around a note's arrival time (ms).
    pub hit_window_ms: f64,
    /// Lives before weapon bonuses.
    pub base_lives: u32,
    /// Damage bonus per combo step. Unbounded.
    pub combo_bonus_rate: f64,
    /// Projectile progress gained per reference frame.
    pub projectile_speed: f64,
    pub spawn_interval_base_ms: f64,
    pub spawn_interval_per_level_ms: f64,
    pub spawn_interval_floor_ms: f64,
    /// Monster level above which bursts hold two notes.
    pub double_burst_level: u32,
    /// Monster level above which bursts hold three notes.
    pub triple_burst_level: u32,
    pub fall_duration_base_s: f64,
    pub fall_duration_per_level_s: f64,
    pub fall_duration_floor_s: f64,
    /// Fraction of the fall duration a note needs to reach the hit line.
    pub travel_fraction: f64,
    /// Judged notes stay visible this long past their arrival time.
    pub note_linger_ms: f64,
    pub damage_number_ms: f64,
    pub fallback: FallbackProfile,
    /// Global damage multiplier applied to every hit.
    pub external_multiplier: f64,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Spawn cadence for a monster level.
    pub fn spawn_interval_ms(&self, level: u32) -> f64 {
        (self.spawn_interval_base_ms - level as f64 * self.spawn_interval_per_level_ms)
            .max(self.spawn_interval_floor_ms)
    }

    pub fn burst_size(&self, level: u32) -> usize {
        if level > self.triple_burst_level {
            3
        } else if level > self.double_burst_level {
            2
        } else {
            1
        }
    }

    /// How long a note is on screen before it reaches the hit line (seconds).
    pub fn fall_duration_s(&self, level: u32) -> f64 {
        (self.fall_duration_base_s - level as f64 * self.fall_duration_per_level_s)
            .max(self.fall_duration_floor_s)
    }

    pub fn travel_time_ms(&self, level: u32) -> f64 {
        self.fall_duration_s(level) * 1000.0 * self.travel_fraction
    }

    /// Milliseconds a projectile needs to go from 0 to 1 progress.
    pub fn projectile_flight_ms(&self) -> f64 {
        REFERENCE_FRAME_MS / self.projectile_speed
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_window_ms: 300.0,
            base_lives: 7,
            combo_bonus_rate: 0.05,
            projectile_speed: 0.08,
            spawn_interval_base_ms: 1000.0,
            spawn_interval_per_level_ms: 15.0,
            spawn_interval_floor_ms: 250.0,
            double_burst_level: 25,
            triple_burst_level: 60,
            fall_duration_base_s: 5.0,
            fall_duration_per_level_s: 0.08,
            fall_duration_floor_s: 1.2,
            travel_fraction: 0.46,
            note_linger_ms: 1000.0,
            damage_number_ms: 1000.0,
            fallback: FallbackProfile {
                damage: 50.0,
                crit_chance: 0.05,
                crit_multiplier: 1.0,
            },
            external_multiplier: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    pub duration_ms: f64,
    pub spawn_interval_ms: f64,
    pub max_radius: f64,
    /// Radians per reference frame.
    pub angular_speed: f64,
    pub min_speed: f64,
    pub speed_spread: f64,
    pub min_scale: f64,
    pub scale_spread: f64,
    /// Cumulative thresholds for common, basic and premium; anything above is a bomb.
    pub common_threshold: f64,
    pub basic_threshold: f64,
    pub premium_threshold: f64,
}

impl BonusConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            duration_ms: 30_000.0,
            spawn_interval_ms: 250.0,
            max_radius: 600.0,
            angular_speed: 0.015,
            min_speed: 2.5,
            speed_spread: 4.5,
            min_scale: 1.5,
            scale_spread: 0.5,
            common_threshold: 0.40,
            basic_threshold: 0.65,
            premium_threshold: 0.75,
        }
    }
}
