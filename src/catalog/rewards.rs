// Reward and price tables
// This file contains lootbox prices/key costs, daily vault cards and rank reward brackets.
use crate::model::{KeyType, Keys, Rarity};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootboxTier {
    Common,
    Basic,
    Premium,
    Slayer,
    Legendary,
    Mythic,
    Ancient,
    RareExpert,
    EliteCombo,
    CharBox,
}

/// Key part of a lootbox price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCost {
    Single { kind: KeyType, amount: u64 },
    /// Every kind at once.
    Combo(Keys),
}

impl KeyCost {
    pub fn as_keys(&self) -> Keys {
        match *self {
            KeyCost::Single { kind, amount } => {
                let mut k = Keys::default();
                *k.get_mut(kind) = amount;
                k
            }
            KeyCost::Combo(keys) => keys,
        }
    }
}

impl LootboxTier {
    pub const ALL: [LootboxTier; 10] = [
        LootboxTier::Common,
        LootboxTier::Basic,
        LootboxTier::Premium,
        LootboxTier::Slayer,
        LootboxTier::Legendary,
        LootboxTier::Mythic,
        LootboxTier::Ancient,
        LootboxTier::RareExpert,
        LootboxTier::EliteCombo,
        LootboxTier::CharBox,
    ];

    pub fn coin_price(self) -> u64 {
        match self {
            LootboxTier::Common => 1_000,
            LootboxTier::Basic => 5_000,
            LootboxTier::Premium => 25_000,
            LootboxTier::Slayer => 75_000,
            LootboxTier::Legendary => 250_000,
            LootboxTier::Mythic => 500_000,
            LootboxTier::Ancient => 1_000_000,
            LootboxTier::RareExpert => 150_000,
            LootboxTier::EliteCombo => 1_500_000,
            LootboxTier::CharBox => 1_500,
        }
    }

    pub fn key_cost(self) -> KeyCost {
        use KeyType::*;
        let single = |kind, amount| KeyCost::Single { kind, amount };
        match self {
            LootboxTier::Common => single(Common, 10),
            LootboxTier::Basic => single(Basic, 20),
            LootboxTier::Premium => single(Premium, 50),
            LootboxTier::Slayer => single(Premium, 500),
            LootboxTier::Legendary => single(Premium, 200),
            LootboxTier::Mythic => single(Premium, 500),
            LootboxTier::Ancient => single(Premium, 1000),
            LootboxTier::RareExpert => single(Basic, 200),
            LootboxTier::EliteCombo => KeyCost::Combo(Keys::new(500, 1500, 1000)),
            LootboxTier::CharBox => single(Common, 15),
        }
    }

    /// Weapon pool the box rolls from; `None` for the character box.
    pub fn weapon_rarity(self) -> Option<Rarity> {
        match self {
            LootboxTier::Common => Some(Rarity::Common),
            LootboxTier::Basic => Some(Rarity::Basic),
            LootboxTier::Premium => Some(Rarity::Premium),
            LootboxTier::Slayer => Some(Rarity::Slayer),
            LootboxTier::Legendary => Some(Rarity::Legendary),
            LootboxTier::Mythic => Some(Rarity::Mythic),
            LootboxTier::Ancient => Some(Rarity::Ancient),
            LootboxTier::RareExpert => Some(Rarity::RareExpert),
            LootboxTier::EliteCombo => Some(Rarity::Ancient),
            LootboxTier::CharBox => None,
        }
    }
}

/// Chance that a character box yields a fragment.
pub const CHAR_BOX_SUCCESS_RATE: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCard {
    pub coins: u64,
    pub keys: Keys,
}

pub const DAILY_CARDS: [DailyCard; 6] = [
    DailyCard { coins: 10_000, keys: Keys::new(20, 10, 5) },
    DailyCard { coins: 25_000, keys: Keys::new(50, 25, 10) },
    DailyCard { coins: 15_000, keys: Keys::new(30, 15, 7) },
    DailyCard { coins: 50_000, keys: Keys::new(100, 50, 20) },
    DailyCard { coins: 12_000, keys: Keys::new(40, 12, 6) },
    DailyCard { coins: 100_000, keys: Keys::new(250, 125, 60) },
];

/// Vault cooldown between daily claims.
pub const DAILY_COOLDOWN_MS: f64 = 12.0 * 3_600_000.0;

/// Length of one leaderboard reward cycle.
pub const RANK_CYCLE_MS: f64 = 7.0 * 3_600_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankReward {
    pub coins: u64,
    pub keys: Keys,
}

/// Reward bracket for a 1-based leaderboard rank.
pub fn rank_reward(rank: usize) -> RankReward {
    let (coins, keys) = match rank {
        1 => (5_000_000, Keys::new(500, 250, 100)),
        2..=3 => (2_500_000, Keys::new(300, 150, 50)),
        4..=10 => (1_000_000, Keys::new(150, 75, 25)),
        11..=50 => (500_000, Keys::new(100, 50, 10)),
        _ => (100_000, Keys::new(50, 10, 0)),
    };
    RankReward { coins, keys }
}
