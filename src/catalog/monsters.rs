// Monster ladder definition
// This file contains the 100-stage ladder; health and rewards grow per stage.
use crate::model::Monster;
use std::sync::OnceLock;

pub const STAGE_COUNT: usize = 100;
const BASE_HEALTH: f64 = 12_000.0;
const HEALTH_GROWTH: f64 = 1.35;

fn make_stage(i: usize) -> Monster {
    let n = i + 1;
    Monster {
        id: format!("m{n}"),
        name: format!("Titan Stage {n}"),
        level: n as u32,
        max_health: (BASE_HEALTH * HEALTH_GROWTH.powi(i as i32)).floor() as u64,
        image: format!(
            "https://api.dicebear.com/7.x/bottts/svg?seed=monster{n}&backgroundColor=b6e3f4"
        ),
        power_required: n as u64 * 80,
        exp_reward: n as u64 * 400,
        song_url: format!(
            "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-{}.mp3",
            i % 15 + 1
        ),
        duration: 60 + i as u32 * 2,
    }
}

pub fn monsters() -> &'static [Monster] {
    static LADDER: OnceLock<&'static [Monster]> = OnceLock::new();
    LADDER.get_or_init(|| Box::leak((0..STAGE_COUNT).map(make_stage).collect::<Vec<_>>().into_boxed_slice()))
}
