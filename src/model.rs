//! Core data types shared by the catalog, the player profile and the engine.

use serde::{Deserialize, Serialize};

/// Per-level damage growth of an upgraded weapon.
pub const LEVEL_DAMAGE_GROWTH: f64 = 1.15;
pub const MAX_WEAPON_LEVEL: u32 = 50;
/// Capacity of both the weapon and the character loadout.
pub const MAX_EQUIPPED: usize = 4;
pub const FRAGMENTS_TO_UNLOCK: u32 = 10;

/// Weapon rarity tiers, ordered weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Basic,
    Premium,
    #[serde(rename = "Rare_Expert")]
    RareExpert,
    Slayer,
    Legendary,
    Mythic,
    Ancient,
}

impl Rarity {
    pub const ALL: [Rarity; 8] = [
        Rarity::Common,
        Rarity::Basic,
        Rarity::Premium,
        Rarity::RareExpert,
        Rarity::Slayer,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::Ancient,
    ];

    /// Name as it appears in weapon names and saves.
    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Basic => "Basic",
            Rarity::Premium => "Premium",
            Rarity::RareExpert => "Rare_Expert",
            Rarity::Slayer => "Slayer",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
            Rarity::Ancient => "Ancient",
        }
    }

    pub fn from_name(name: &str) -> Option<Rarity> {
        Rarity::ALL.into_iter().find(|r| r.as_str().eq_ignore_ascii_case(name))
    }
}

/// `floor(base * 1.15^(level - 1))`, with `level` clamped to `1..=MAX_WEAPON_LEVEL`.
pub fn level_scaled_damage(base: f64, level: u32) -> u64 {
    let exp = (level.clamp(1, MAX_WEAPON_LEVEL) - 1) as i32;
    (base * LEVEL_DAMAGE_GROWTH.powi(exp)).floor() as u64
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub icon: String,
    pub rarity: Rarity,
    /// Effective damage at the current level.
    pub damage: u64,
    /// Level-1 damage that upgrades compound from.
    pub base_damage: f64,
    pub damage_multiplier: f64,
    pub extra_lives: u32,
    pub key_drop_bonus: f64,
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub exp_bonus: f64,
    pub level: u32,
    pub max_level: u32,
}

impl Weapon {
    /// Damage this weapon would have at `level`.
    pub fn effective_damage_at(&self, level: u32) -> u64 {
        level_scaled_damage(self.base_damage, level)
    }

    pub fn can_upgrade(&self) -> bool {
        self.level < self.max_level.min(MAX_WEAPON_LEVEL)
    }

    /// One level up. Damage is recomputed from the base so that any chain of
    /// single upgrades lands on the same value as a direct jump.
    pub fn upgraded(&self) -> Weapon {
        self.at_level(self.level + 1)
    }

    pub fn at_level(&self, level: u32) -> Weapon {
        let level = level.clamp(1, self.max_level.min(MAX_WEAPON_LEVEL));
        Weapon {
            level,
            damage: self.effective_damage_at(level),
            ..self.clone()
        }
    }

    /// Coins needed for the next upgrade.
    pub fn upgrade_cost(&self) -> u64 {
        self.level as u64 * 2500
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    M,
    F,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacterRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub rarity: CharacterRarity,
    pub fragments_needed: u32,
    pub icon: String,
    pub image: String,
    pub female_image: Option<String>,
}

impl Character {
    /// Portrait for the selected gender; falls back to the default image.
    pub fn portrait(&self, selected: Gender) -> &str {
        match (selected, &self.female_image) {
            (Gender::F, Some(img)) => img,
            _ => &self.image,
        }
    }
}

/// Immutable stage descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub max_health: u64,
    pub image: String,
    pub power_required: u64,
    pub exp_reward: u64,
    pub song_url: String,
    /// Session length in seconds.
    pub duration: u32,
}

impl Monster {
    pub fn duration_ms(&self) -> f64 {
        self.duration as f64 * 1000.0
    }

    /// Generated avatar used when the stage artwork fails to load.
    pub fn placeholder_image(&self) -> String {
        format!(
            "https://ui-avatars.com/api/?name={}&background=random&color=fff&size=512",
            self.name.replace(' ', "+")
        )
    }
}

/// Lootbox key kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Common,
    Basic,
    Premium,
}

/// Key counts per kind. Also the payload of the bonus round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keys {
    pub common: u64,
    pub basic: u64,
    pub premium: u64,
}

impl Keys {
    pub const fn new(common: u64, basic: u64, premium: u64) -> Self {
        Self { common, basic, premium }
    }

    pub fn get(&self, kind: KeyType) -> u64 {
        match kind {
            KeyType::Common => self.common,
            KeyType::Basic => self.basic,
            KeyType::Premium => self.premium,
        }
    }

    pub fn get_mut(&mut self, kind: KeyType) -> &mut u64 {
        match kind {
            KeyType::Common => &mut self.common,
            KeyType::Basic => &mut self.basic,
            KeyType::Premium => &mut self.premium,
        }
    }

    /// True when every count covers the matching count of `cost`.
    pub fn covers(&self, cost: &Keys) -> bool {
        self.common >= cost.common && self.basic >= cost.basic && self.premium >= cost.premium
    }

    pub fn saturating_sub(&self, cost: &Keys) -> Keys {
        Keys {
            common: self.common.saturating_sub(cost.common),
            basic: self.basic.saturating_sub(cost.basic),
            premium: self.premium.saturating_sub(cost.premium),
        }
    }

    pub fn saturating_add(&self, other: &Keys) -> Keys {
        Keys {
            common: self.common.saturating_add(other.common),
            basic: self.basic.saturating_add(other.basic),
            premium: self.premium.saturating_add(other.premium),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EquippedCharacter {
    pub character: Character,
    pub gender: Gender,
}

/// Resolved equipment the engine reads at session start.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Loadout {
    pub weapons: Vec<Weapon>,
    pub characters: Vec<EquippedCharacter>,
}

impl Loadout {
    /// Truncates to loadout capacity.
    pub fn new(mut weapons: Vec<Weapon>, mut characters: Vec<EquippedCharacter>) -> Self {
        weapons.truncate(MAX_EQUIPPED);
        characters.truncate(MAX_EQUIPPED);
        Self { weapons, characters }
    }

    pub fn bonus_lives(&self) -> u32 {
        self.weapons.iter().map(|w| w.extra_lives).sum()
    }
}
