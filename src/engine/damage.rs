//! Damage resolution for a successful tap.

use rand::Rng;

use crate::config::EngineConfig;
use crate::model::Weapon;
use crate::rng::rand_index;

const FALLBACK_ICON: &str = "👊";

/// Outcome of one damage roll, carried by the projectile until impact.
#[derive(Clone, Debug, PartialEq)]
pub struct Strike {
    pub damage: u64,
    pub crit: bool,
    pub icon: String,
}

/// `floor(crit_mult * base * (1 + combo * rate) * external)`.
pub fn scaled_damage(base: f64, crit_mult: f64, combo: u32, cfg: &EngineConfig) -> u64 {
    let combo_factor = 1.0 + combo as f64 * cfg.combo_bonus_rate;
    (crit_mult * base * combo_factor * cfg.external_multiplier).floor().max(0.0) as u64
}

/// Pick a random equipped weapon, roll its crit and scale by the combo held
/// before this hit. Empty loadouts use the fallback profile.
pub fn roll_strike<R: Rng + ?Sized>(
    rng: &mut R,
    weapons: &[Weapon],
    combo: u32,
    cfg: &EngineConfig,
) -> Strike {
    if weapons.is_empty() {
        let fb = cfg.fallback;
        let crit = rng.r#gen::<f64>() < fb.crit_chance;
        let mult = if crit { fb.crit_multiplier } else { 1.0 };
        return Strike {
            damage: scaled_damage(fb.damage, mult, combo, cfg),
            crit,
            icon: FALLBACK_ICON.to_string(),
        };
    }

    let weapon = &weapons[rand_index(rng, weapons.len())];
    let crit = rng.r#gen::<f64>() < weapon.crit_chance;
    let mult = if crit { weapon.crit_multiplier } else { 1.0 };
    Strike {
        damage: scaled_damage(weapon.damage as f64, mult, combo, cfg),
        crit,
        icon: weapon.icon.clone(),
    }
}
