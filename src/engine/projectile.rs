//! Damage-carrying projectiles and their flight paths.
//!
//! Positions are in arena percent coordinates (0..100 on both axes), with the
//! team column on the left and the monster on the right.

use rand::Rng;
use serde::Serialize;

use crate::rng::{WeightedTable, rand_index};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trajectory {
    Linear,
    /// Parabolic lift peaking at half progress.
    Arc,
    /// Sine offset across the travel direction.
    Swirl,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, to: Point, t: f64) -> Point {
        Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

fn trajectory_table() -> WeightedTable<Trajectory> {
    WeightedTable::from_weights(
        &[
            (0.5, Trajectory::Linear),
            (0.25, Trajectory::Arc),
            (0.25, Trajectory::Swirl),
        ],
        Trajectory::Swirl,
    )
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Projectile {
    pub id: u64,
    pub icon: String,
    pub start: Point,
    pub target: Point,
    /// Session-elapsed ms at launch.
    pub launched_at: f64,
    pub damage: u64,
    pub crit: bool,
    pub trajectory: Trajectory,
    pub amplitude: f64,
    pub frequency: f64,
}

impl Projectile {
    /// Raw flight progress; reaches 1 at impact and keeps growing afterwards.
    pub fn progress(&self, elapsed: f64, flight_ms: f64) -> f64 {
        if flight_ms <= 0.0 {
            return 1.0;
        }
        ((elapsed - self.launched_at) / flight_ms).max(0.0)
    }

    pub fn position(&self, progress: f64) -> Point {
        let p = progress.clamp(0.0, 1.0);
        let base = self.start.lerp(self.target, p);
        match self.trajectory {
            Trajectory::Linear => base,
            Trajectory::Arc => Point::new(base.x, base.y - self.amplitude * 4.0 * p * (1.0 - p)),
            Trajectory::Swirl => Point::new(base.x, base.y + self.amplitude * (p * self.frequency).sin()),
        }
    }
}

/// Everything the strike roll decided; flight parameters are rolled here.
pub struct LaunchSpec {
    pub id: u64,
    pub icon: String,
    pub damage: u64,
    pub crit: bool,
    pub launched_at: f64,
    /// Number of team slots to launch from (at least one is assumed).
    pub team_size: usize,
}

pub fn launch<R: Rng + ?Sized>(rng: &mut R, shot: LaunchSpec) -> Projectile {
    let slot = rand_index(rng, shot.team_size.max(1));
    let start = Point::new(12.0, 15.0 + slot as f64 * 12.0);
    let trajectory = trajectory_table().sample(rng);
    let target = Point::new(65.0 + rng.r#gen::<f64>() * 20.0, 15.0 + rng.r#gen::<f64>() * 35.0);
    let amplitude = 5.0 + rng.r#gen::<f64>() * 10.0;
    let frequency = 5.0 + rng.r#gen::<f64>() * 10.0;
    Projectile {
        id: shot.id,
        icon: shot.icon,
        start,
        target,
        launched_at: shot.launched_at,
        damage: shot.damage,
        crit: shot.crit,
        trajectory,
        amplitude,
        frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn proj(trajectory: Trajectory) -> Projectile {
        Projectile {
            id: 1,
            icon: "*".into(),
            start: Point::new(10.0, 20.0),
            target: Point::new(70.0, 40.0),
            launched_at: 100.0,
            damage: 10,
            crit: false,
            trajectory,
            amplitude: 10.0,
            frequency: 8.0,
        }
    }

    #[test]
    fn all_paths_hit_endpoints() {
        for t in [Trajectory::Linear, Trajectory::Arc] {
            let p = proj(t);
            assert_eq!(p.position(0.0), p.start);
            assert_eq!(p.position(1.0), p.target);
        }
        let swirl = proj(Trajectory::Swirl);
        let end = swirl.position(1.0);
        assert!((end.y - (40.0 + 10.0 * 8.0f64.sin())).abs() < 1e-9);
    }

    #[test]
    fn arc_peaks_at_half() {
        let p = proj(Trajectory::Arc);
        let mid = p.position(0.5);
        assert!((mid.x - 40.0).abs() < 1e-9);
        assert!((mid.y - (30.0 - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn progress_is_time_derived() {
        let p = proj(Trajectory::Linear);
        assert_eq!(p.progress(100.0, 200.0), 0.0);
        assert!((p.progress(200.0, 200.0) - 0.5).abs() < 1e-12);
        assert!(p.progress(300.0, 200.0) >= 1.0);
        assert_eq!(p.progress(50.0, 200.0), 0.0);
    }

    #[test]
    fn launch_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for i in 0..100 {
            let p = launch(
                &mut rng,
                LaunchSpec { id: i, icon: "x".into(), damage: 1, crit: false, launched_at: 0.0, team_size: 4 },
            );
            assert_eq!(p.start.x, 12.0);
            assert!([15.0, 27.0, 39.0, 51.0].contains(&p.start.y));
            assert!((65.0..85.0).contains(&p.target.x));
            assert!((15.0..50.0).contains(&p.target.y));
            assert!((5.0..15.0).contains(&p.amplitude));
        }
    }
}
