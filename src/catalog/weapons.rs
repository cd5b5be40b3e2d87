// Weapon pool definition
// This file contains the per-rarity generation table and the runtime-built WEAPON_INDEX.
use crate::model::{Rarity, Weapon};
use std::sync::OnceLock;

pub const WEAPONS_PER_RARITY: usize = 15;

const WEAPON_ICONS: [&str; 60] = [
    "🏴", "⚔️", "🛡️", "🐲", "🔱", "⚡", "🪐", "🏹", "💠", "🔪", "🗡️", "🪓", "🔨", "⚒️", "🛠️",
    "⛏️", "🔧", "🪛", "🔩", "⚙️", "🧱", "⛓️", "🪵", "🪚", "🧲", "🔫", "💣", "🧨", "🪃", "🪁",
    "🪄", "🔮", "🧿", "💎", "🧪", "🌡️", "🧬", "🏮", "🎐", "🛸", "☄️", "💥", "✨", "🔥", "💧",
    "🍃", "🌑", "☀️", "❄️", "🌈", "🌩️", "⭐", "☄️", "⚡", "🛡️", "🏹", "🗡️", "🔨", "⚒️", "⚔️",
];

const TITLES: [&str; 40] = [
    "Edge", "Soul", "Bane", "Will", "Heart", "Fang", "Claw", "Star", "Void", "Core", "Spire",
    "Vortex", "Shard", "Glow", "Reach", "Depth", "Height", "Width", "Length", "Blast", "Pulse",
    "Wave", "Tide", "Storm", "Frost", "Flame", "Bolt", "Quake", "Gale", "Sun", "Moon", "Zenith",
    "Apex", "Root", "Stem", "Leaf", "Vine", "Thorn", "Rose", "Dust",
];

/// (rarity, base damage, base bonus lives, icon offset)
const TIERS: [(Rarity, f64, u32, usize); 8] = [
    (Rarity::Common, 250.0, 2, 0),
    (Rarity::Basic, 2_500.0, 5, 15),
    (Rarity::Premium, 15_000.0, 10, 30),
    (Rarity::RareExpert, 85_000.0, 15, 45),
    (Rarity::Slayer, 350_000.0, 20, 0),
    (Rarity::Legendary, 1_500_000.0, 30, 15),
    (Rarity::Mythic, 12_000_000.0, 45, 30),
    (Rarity::Ancient, 60_000_000.0, 60, 45),
];

fn make_weapon(rarity: Rarity, i: usize, base_damage: f64, base_lives: u32, icon_offset: usize) -> Weapon {
    let damage = (base_damage + i as f64 * (base_damage * 0.1)).floor().max(1.0);
    Weapon {
        id: format!("{}_{}", rarity.as_str().to_lowercase(), i),
        name: format!(
            "{} {} {}",
            rarity.as_str().replace('_', " "),
            TITLES[i % TITLES.len()],
            i / TITLES.len() + 1
        ),
        description: format!("Elite {} grade equipment.", rarity.as_str()),
        price: 0,
        icon: WEAPON_ICONS[(icon_offset + i) % WEAPON_ICONS.len()].to_string(),
        rarity,
        damage: damage as u64,
        base_damage: damage,
        damage_multiplier: 1.0,
        extra_lives: base_lives + (i / 3) as u32,
        key_drop_bonus: 0.05,
        crit_chance: 0.05 + i as f64 * 0.005,
        crit_multiplier: 4.5,
        exp_bonus: 0.1,
        level: 1,
        max_level: 50,
    }
}

fn build_weapon_index() -> &'static [Weapon] {
    let mut pool = Vec::with_capacity(TIERS.len() * WEAPONS_PER_RARITY);
    for &(rarity, dmg, lives, offset) in TIERS.iter() {
        for i in 0..WEAPONS_PER_RARITY {
            pool.push(make_weapon(rarity, i, dmg, lives, offset));
        }
    }
    Box::leak(pool.into_boxed_slice())
}

pub fn weapon_index() -> &'static [Weapon] {
    static INDEX: OnceLock<&'static [Weapon]> = OnceLock::new();
    INDEX.get_or_init(build_weapon_index)
}
