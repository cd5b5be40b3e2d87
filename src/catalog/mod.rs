//! Static game tables: weapon pool, character roster, monster ladder and the
//! lootbox / daily / rank reward tables. Pure data plus lookups.
//!
//! Generated tables are built once on first access and leaked so callers can
//! hold `&'static` references, the same way for every table.

mod characters;
mod monsters;
mod rewards;
mod weapons;

pub use characters::characters;
pub use monsters::{STAGE_COUNT, monsters};
pub use rewards::{
    CHAR_BOX_SUCCESS_RATE, DAILY_COOLDOWN_MS, DAILY_CARDS, DailyCard, KeyCost, LootboxTier,
    RANK_CYCLE_MS, RankReward, rank_reward,
};
pub use weapons::{WEAPONS_PER_RARITY, weapon_index};

use crate::model::{Character, Monster, Rarity, Weapon};

pub fn weapon_by_name(name: &str) -> Option<&'static Weapon> {
    weapon_index().iter().find(|w| w.name == name)
}

pub fn weapons_of(rarity: Rarity) -> impl Iterator<Item = &'static Weapon> {
    weapon_index().iter().filter(move |w| w.rarity == rarity)
}

pub fn character_by_id(id: &str) -> Option<&'static Character> {
    characters().iter().find(|c| c.id == id)
}

pub fn monster_by_id(id: &str) -> Option<&'static Monster> {
    monsters().iter().find(|m| m.id == id)
}

/// Stage by 1-based level.
pub fn stage(level: u32) -> Option<&'static Monster> {
    let idx = (level as usize).checked_sub(1)?;
    monsters().get(idx)
}
