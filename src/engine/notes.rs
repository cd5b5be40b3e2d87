//! Note spawning and tap judgment.

use rand::Rng;
use serde::Serialize;

use crate::config::LANE_COUNT;

/// A timed target in one lane. `hit` and `missed` are mutually exclusive and
/// each flips at most once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Note {
    pub id: u64,
    pub lane: usize,
    /// Scheduled arrival at the hit line, in session-elapsed ms.
    pub time: f64,
    pub hit: bool,
    pub missed: bool,
}

impl Note {
    pub fn is_judged(&self) -> bool {
        self.hit || self.missed
    }

    /// Inside the symmetric hit window around `elapsed`.
    pub fn in_window(&self, elapsed: f64, window_ms: f64) -> bool {
        (self.time - elapsed).abs() < window_ms
    }

    /// Past the window without having been hit.
    pub fn is_overdue(&self, elapsed: f64, window_ms: f64) -> bool {
        !self.is_judged() && elapsed > self.time + window_ms
    }
}

/// Distinct random lanes for one burst. `count` is clamped to the lane count.
pub fn burst_lanes<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<usize> {
    let count = count.min(LANE_COUNT);
    rand::seq::index::sample(rng, LANE_COUNT, count).into_vec()
}

/// Earliest unjudged note in `lane` whose arrival is inside the window.
pub fn find_hittable(notes: &[Note], lane: usize, elapsed: f64, window_ms: f64) -> Option<usize> {
    notes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.lane == lane && !n.is_judged() && n.in_window(elapsed, window_ms))
        .min_by(|(_, a), (_, b)| a.time.total_cmp(&b.time))
        .map(|(i, _)| i)
}
