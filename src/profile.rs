//! Player profile and every economy operation that mutates it.
//!
//! Operations validate first and mutate last, so an `Err` leaves the profile
//! untouched.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{
    self, CHAR_BOX_SUCCESS_RATE, DAILY_CARDS, DAILY_COOLDOWN_MS, LootboxTier, RANK_CYCLE_MS,
};
use crate::engine::events::{ResultTag, SessionResult};
use crate::model::{
    EquippedCharacter, FRAGMENTS_TO_UNLOCK, Gender, Keys, Loadout, MAX_EQUIPPED, Monster, Weapon,
};
use crate::rng::rand_index;

/// Username that never reaches the leaderboard.
pub const DEFAULT_USERNAME: &str = "NewFighter";
pub const MIN_USERNAME_LEN: usize = 3;
const EXP_CURVE: f64 = 1.12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EconomyError {
    #[error("need {needed} coins, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },

    #[error("not enough keys, need {needed:?}")]
    InsufficientKeys { needed: Keys },

    #[error("weapon '{0}' is already at max level")]
    MaxLevel(String),

    #[error("no weapon with id '{0}' in inventory")]
    UnknownWeapon(String),

    #[error("no character with id '{0}'")]
    UnknownCharacter(String),

    #[error("character '{0}' is still locked")]
    CharacterLocked(String),

    #[error("weapon '{0}' is equipped and cannot be dismantled")]
    WeaponEquipped(String),

    #[error("stage {0} does not exist")]
    UnknownStage(u32),

    #[error("stage {0} is locked")]
    StageLocked(u32),

    #[error("username must be at least 3 characters")]
    UsernameTooShort,

    #[error("daily vault locked for another {remaining_ms} ms")]
    VaultLocked { remaining_ms: u64 },

    #[error("no daily card at index {0}")]
    UnknownCard(usize),

    #[error("rank rewards already claimed this cycle")]
    CycleNotReset,

    #[error("player is not ranked yet")]
    Unranked,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterState {
    pub unlocked: Vec<String>,
    pub fragments: BTreeMap<String, u32>,
    pub equipped: Vec<String>,
    pub selected_genders: BTreeMap<String, Gender>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub music_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { music_enabled: true, sound_enabled: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerProfile {
    pub username: String,
    pub exp: u64,
    pub exp_needed: u64,
    pub level: u32,
    pub power_level: u64,
    pub lives: u32,
    pub inventory: Vec<Weapon>,
    pub characters: CharacterState,
    /// Inventory ids of equipped weapons, in slot order.
    pub equipped: Vec<String>,
    pub coins: u64,
    pub stage_points: u64,
    pub unlocked_level: u32,
    /// Epoch ms of the last daily claim.
    pub last_daily_reward: f64,
    /// Rank reward cycle last claimed.
    pub last_rank_cycle: u64,
    pub keys: Keys,
    pub settings: Settings,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self::initial()
    }
}

/// What a lootbox produced.
#[derive(Clone, Debug, PartialEq)]
pub enum LootboxReward {
    Weapon(Weapon),
    Fragment { character_id: String, fragments: u32, unlocked: bool },
    RecruitFailed,
}

impl PlayerProfile {
    pub fn initial() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            exp: 0,
            exp_needed: 500,
            level: 1,
            power_level: 100,
            lives: 30,
            inventory: Vec::new(),
            characters: CharacterState {
                unlocked: vec!["c1".into()],
                fragments: BTreeMap::from([("c1".to_string(), 5)]),
                equipped: vec!["c1".into()],
                selected_genders: BTreeMap::from([("c1".to_string(), Gender::M)]),
            },
            equipped: Vec::new(),
            coins: 50_000,
            stage_points: 0,
            unlocked_level: 1,
            last_daily_reward: 0.0,
            last_rank_cycle: 0,
            keys: Keys::new(100, 50, 20),
            settings: Settings::default(),
        }
    }

    // --- Progression ---

    /// Add experience and apply every level-up it pays for.
    pub fn add_exp(&mut self, amount: u64) -> u32 {
        self.exp += amount;
        let mut gained = 0;
        while self.exp_needed > 0 && self.exp >= self.exp_needed {
            self.exp -= self.exp_needed;
            self.level += 1;
            self.exp_needed = (self.exp_needed as f64 * EXP_CURVE).floor() as u64;
            gained += 1;
        }
        if gained > 0 {
            log::info!("player reached level {}", self.level);
        }
        gained
    }

    pub fn rename(&mut self, name: &str) -> Result<(), EconomyError> {
        let trimmed = name.trim();
        if trimmed.chars().count() < MIN_USERNAME_LEN {
            return Err(EconomyError::UsernameTooShort);
        }
        self.username = trimmed.to_string();
        Ok(())
    }

    pub fn is_stage_unlocked(&self, level: u32) -> bool {
        level <= self.unlocked_level
    }

    /// Rewards for a finished battle. Only a win pays out.
    pub fn apply_battle_result(&mut self, monster: &Monster, result: &SessionResult) {
        if result.result != ResultTag::Win {
            return;
        }
        let exp = result.stats.exp.unwrap_or(monster.exp_reward);
        let level = monster.level as u64;
        self.add_exp(exp);
        self.stage_points += level * 1000;
        self.unlocked_level = self.unlocked_level.max(monster.level + 1);
        self.coins += level * 200;
    }

    pub fn apply_bonus_keys(&mut self, keys: &Keys) {
        self.keys = self.keys.saturating_add(keys);
    }

    // --- Loadout ---

    fn weapon_index(&self, id: &str) -> Result<usize, EconomyError> {
        self.inventory
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| EconomyError::UnknownWeapon(id.to_string()))
    }

    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.inventory.iter().find(|w| w.id == id)
    }

    pub fn is_equipped(&self, id: &str) -> bool {
        self.equipped.iter().any(|e| e == id)
    }

    /// Returns `false` when the weapon was already equipped or the loadout is full.
    pub fn equip_weapon(&mut self, id: &str) -> Result<bool, EconomyError> {
        self.weapon_index(id)?;
        if self.is_equipped(id) || self.equipped.len() >= MAX_EQUIPPED {
            return Ok(false);
        }
        self.equipped.push(id.to_string());
        Ok(true)
    }

    pub fn unequip_weapon(&mut self, id: &str) -> bool {
        let before = self.equipped.len();
        self.equipped.retain(|e| e != id);
        before != self.equipped.len()
    }

    /// Equip or remove a character. Returns whether it is equipped afterwards.
    pub fn toggle_character(&mut self, id: &str) -> Result<bool, EconomyError> {
        if catalog::character_by_id(id).is_none() {
            return Err(EconomyError::UnknownCharacter(id.to_string()));
        }
        let team = &mut self.characters.equipped;
        if let Some(pos) = team.iter().position(|c| c == id) {
            team.remove(pos);
            return Ok(false);
        }
        if !self.characters.unlocked.iter().any(|c| c == id) {
            return Err(EconomyError::CharacterLocked(id.to_string()));
        }
        if team.len() >= MAX_EQUIPPED {
            return Ok(false);
        }
        team.push(id.to_string());
        Ok(true)
    }

    pub fn select_gender(&mut self, id: &str, gender: Gender) -> Result<(), EconomyError> {
        if catalog::character_by_id(id).is_none() {
            return Err(EconomyError::UnknownCharacter(id.to_string()));
        }
        self.characters.selected_genders.insert(id.to_string(), gender);
        Ok(())
    }

    /// Equipped weapons and characters resolved to full records, in slot order.
    /// Stale ids are skipped.
    pub fn resolve_loadout(&self) -> Loadout {
        let weapons = self
            .equipped
            .iter()
            .filter_map(|id| self.weapon(id).cloned())
            .collect();
        let characters = self
            .characters
            .equipped
            .iter()
            .filter_map(|id| {
                let character = catalog::character_by_id(id)?.clone();
                let gender = self
                    .characters
                    .selected_genders
                    .get(id)
                    .copied()
                    .unwrap_or_default();
                Some(EquippedCharacter { character, gender })
            })
            .collect();
        Loadout::new(weapons, characters)
    }

    /// Equip the first inventory weapon if nothing is equipped, then resolve.
    pub fn prepare_for_battle(&mut self) -> Loadout {
        if self.equipped.is_empty() {
            if let Some(first) = self.inventory.first() {
                log::debug!("auto-equipping '{}'", first.name);
                self.equipped.push(first.id.clone());
            }
        }
        self.resolve_loadout()
    }

    // --- Workshop ---

    pub fn upgrade_weapon(&mut self, id: &str) -> Result<&Weapon, EconomyError> {
        let idx = self.weapon_index(id)?;
        let weapon = &self.inventory[idx];
        if !weapon.can_upgrade() {
            return Err(EconomyError::MaxLevel(weapon.name.clone()));
        }
        let cost = weapon.upgrade_cost();
        self.spend_coins(cost)?;
        self.inventory[idx] = self.inventory[idx].upgraded();
        Ok(&self.inventory[idx])
    }

    pub fn dismantle_weapon(&mut self, id: &str) -> Result<Weapon, EconomyError> {
        let idx = self.weapon_index(id)?;
        if self.is_equipped(id) {
            return Err(EconomyError::WeaponEquipped(self.inventory[idx].name.clone()));
        }
        Ok(self.inventory.remove(idx))
    }

    fn spend_coins(&mut self, amount: u64) -> Result<(), EconomyError> {
        if self.coins < amount {
            return Err(EconomyError::InsufficientCoins { needed: amount, available: self.coins });
        }
        self.coins -= amount;
        Ok(())
    }

    // --- Shop ---

    pub fn open_lootbox<R: Rng + ?Sized>(
        &mut self,
        tier: LootboxTier,
        rng: &mut R,
        now: f64,
    ) -> Result<LootboxReward, EconomyError> {
        let price = tier.coin_price();
        let cost = tier.key_cost().as_keys();
        if self.coins < price {
            return Err(EconomyError::InsufficientCoins { needed: price, available: self.coins });
        }
        if !self.keys.covers(&cost) {
            return Err(EconomyError::InsufficientKeys { needed: cost });
        }
        self.coins -= price;
        self.keys = self.keys.saturating_sub(&cost);

        let reward = match tier.weapon_rarity() {
            Some(rarity) => {
                let pool: Vec<&Weapon> = catalog::weapons_of(rarity).collect();
                match pool.get(rand_index(rng, pool.len())) {
                    Some(template) => {
                        let weapon = Weapon {
                            id: self.fresh_weapon_id(now),
                            level: 1,
                            ..(*template).clone()
                        };
                        self.inventory.push(weapon.clone());
                        LootboxReward::Weapon(weapon)
                    }
                    None => LootboxReward::RecruitFailed,
                }
            }
            None => self.recruit(rng),
        };
        log::debug!("opened {:?} box: {:?}", tier, reward);
        Ok(reward)
    }

    fn recruit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> LootboxReward {
        if rng.r#gen::<f64>() >= CHAR_BOX_SUCCESS_RATE {
            return LootboxReward::RecruitFailed;
        }
        let roster = catalog::characters();
        let Some(character) = roster.get(rand_index(rng, roster.len())) else {
            return LootboxReward::RecruitFailed;
        };
        let id = character.id.clone();
        let count = self.characters.fragments.entry(id.clone()).or_insert(0);
        *count = (*count + 1).min(FRAGMENTS_TO_UNLOCK);
        let fragments = *count;
        let unlocked =
            fragments == FRAGMENTS_TO_UNLOCK && !self.characters.unlocked.iter().any(|c| *c == id);
        if unlocked {
            log::info!("unlocked character {}", character.name);
            self.characters.unlocked.push(id.clone());
        }
        LootboxReward::Fragment { character_id: id, fragments, unlocked }
    }

    /// Inventory ids are the open timestamp, bumped until unique.
    fn fresh_weapon_id(&self, now: f64) -> String {
        let mut stamp = now.max(0.0) as u64;
        loop {
            let id = stamp.to_string();
            if self.weapon(&id).is_none() {
                return id;
            }
            stamp += 1;
        }
    }

    // --- Rewards ---

    pub fn daily_ready_in(&self, now: f64) -> f64 {
        (self.last_daily_reward + DAILY_COOLDOWN_MS - now).max(0.0)
    }

    pub fn claim_daily(&mut self, card: usize, now: f64) -> Result<(), EconomyError> {
        let remaining = self.daily_ready_in(now);
        if remaining > 0.0 {
            return Err(EconomyError::VaultLocked { remaining_ms: remaining.ceil() as u64 });
        }
        let reward = DAILY_CARDS.get(card).ok_or(EconomyError::UnknownCard(card))?;
        self.coins += reward.coins;
        self.keys = self.keys.saturating_add(&reward.keys);
        self.last_daily_reward = now;
        Ok(())
    }

    pub fn rank_cycle(now: f64) -> u64 {
        (now.max(0.0) / RANK_CYCLE_MS).floor() as u64
    }

    pub fn can_claim_rank(&self, now: f64) -> bool {
        Self::rank_cycle(now) > self.last_rank_cycle
    }

    /// `rank` is 1-based; `None` when the player is not on the board.
    pub fn claim_rank_reward(&mut self, rank: Option<usize>, now: f64) -> Result<u64, EconomyError> {
        if !self.can_claim_rank(now) {
            return Err(EconomyError::CycleNotReset);
        }
        let rank = rank.filter(|r| *r > 0).ok_or(EconomyError::Unranked)?;
        let reward = catalog::rank_reward(rank);
        self.coins += reward.coins;
        self.keys = self.keys.saturating_add(&reward.keys);
        self.last_rank_cycle = Self::rank_cycle(now);
        Ok(reward.coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::Outcome;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn armed() -> PlayerProfile {
        let mut p = PlayerProfile::initial();
        for (i, name) in ["Common Edge 1", "Common Soul 1", "Basic Edge 1"].iter().enumerate() {
            let mut w = catalog::weapon_by_name(name).unwrap().clone();
            w.id = format!("w{i}");
            p.inventory.push(w);
        }
        p
    }

    #[test]
    fn exp_levels_up_repeatedly() {
        let mut p = PlayerProfile::initial();
        let gained = p.add_exp(500 + 560 + 10);
        assert_eq!(gained, 2);
        assert_eq!(p.level, 3);
        assert_eq!(p.exp, 10);
        assert_eq!(p.exp_needed, 627);
    }

    #[test]
    fn rename_requires_three_chars() {
        let mut p = PlayerProfile::initial();
        assert_eq!(p.rename("  ab "), Err(EconomyError::UsernameTooShort));
        assert_eq!(p.username, DEFAULT_USERNAME);
        p.rename(" Zed ").unwrap();
        assert_eq!(p.username, "Zed");
    }

    #[test]
    fn equip_caps_at_four() {
        let mut p = armed();
        for i in 0..2 {
            let mut w = p.inventory[0].clone();
            w.id = format!("x{i}");
            p.inventory.push(w);
        }
        for id in ["w0", "w1", "w2", "x0"] {
            assert!(p.equip_weapon(id).unwrap());
        }
        assert!(!p.equip_weapon("x1").unwrap());
        assert_eq!(p.equipped.len(), 4);
        assert!(p.equip_weapon("nope").is_err());
        assert!(p.unequip_weapon("w1"));
        assert!(!p.unequip_weapon("w1"));
    }

    #[test]
    fn dismantle_rejects_equipped() {
        let mut p = armed();
        p.equip_weapon("w0").unwrap();
        assert!(matches!(p.dismantle_weapon("w0"), Err(EconomyError::WeaponEquipped(_))));
        assert_eq!(p.dismantle_weapon("w1").unwrap().name, "Common Soul 1");
        assert_eq!(p.inventory.len(), 2);
    }

    #[test]
    fn upgrade_charges_and_scales() {
        let mut p = armed();
        let before = p.coins;
        let w = p.upgrade_weapon("w0").unwrap();
        assert_eq!(w.level, 2);
        assert_eq!(w.damage, 287);
        assert_eq!(p.coins, before - 2500);

        p.coins = 100;
        let snapshot = p.clone();
        assert!(matches!(
            p.upgrade_weapon("w0"),
            Err(EconomyError::InsufficientCoins { needed: 5000, available: 100 })
        ));
        assert_eq!(p, snapshot);
    }

    #[test]
    fn upgrade_stops_at_max_level() {
        let mut p = armed();
        p.inventory[0] = p.inventory[0].at_level(50);
        assert!(matches!(p.upgrade_weapon("w0"), Err(EconomyError::MaxLevel(_))));
    }

    #[test]
    fn lootbox_checks_keys_before_spending() {
        let mut p = PlayerProfile::initial();
        p.coins = 10_000_000;
        let mut rng = StdRng::seed_from_u64(3);
        let snapshot = p.clone();
        assert!(matches!(
            p.open_lootbox(LootboxTier::EliteCombo, &mut rng, 1.0),
            Err(EconomyError::InsufficientKeys { .. })
        ));
        assert_eq!(p, snapshot);

        assert!(matches!(
            p.open_lootbox(LootboxTier::Premium, &mut rng, 1.0),
            Err(EconomyError::InsufficientKeys { .. })
        ));

        let reward = p.open_lootbox(LootboxTier::Basic, &mut rng, 1.0).unwrap();
        let LootboxReward::Weapon(w) = reward else { panic!("expected weapon") };
        assert_eq!(w.rarity, crate::model::Rarity::Basic);
        assert_eq!(w.id, "1");
        assert_eq!(p.keys.basic, 30);
        assert_eq!(p.coins, 10_000_000 - 5_000);
        assert_eq!(p.inventory.len(), 1);
    }

    #[test]
    fn lootbox_ids_are_unique() {
        let mut p = PlayerProfile::initial();
        let mut rng = StdRng::seed_from_u64(3);
        p.open_lootbox(LootboxTier::Common, &mut rng, 42.0).unwrap();
        p.open_lootbox(LootboxTier::Common, &mut rng, 42.0).unwrap();
        assert_eq!(p.inventory[0].id, "42");
        assert_eq!(p.inventory[1].id, "43");
    }

    #[test]
    fn character_box_unlocks_at_ten_fragments() {
        let mut p = PlayerProfile::initial();
        p.coins = u64::MAX / 2;
        p.keys = Keys::new(100_000, 0, 0);
        let mut rng = StdRng::seed_from_u64(11);
        let mut unlocked = None;
        for _ in 0..2000 {
            if let LootboxReward::Fragment { character_id, unlocked: true, .. } =
                p.open_lootbox(LootboxTier::CharBox, &mut rng, 0.0).unwrap()
            {
                unlocked = Some(character_id);
                break;
            }
        }
        let id = unlocked.expect("some character should unlock");
        assert_eq!(p.characters.fragments[&id], FRAGMENTS_TO_UNLOCK);
        assert!(p.characters.unlocked.contains(&id));
    }

    #[test]
    fn locked_characters_cannot_join() {
        let mut p = PlayerProfile::initial();
        assert!(matches!(p.toggle_character("c2"), Err(EconomyError::CharacterLocked(_))));
        assert!(!p.toggle_character("c1").unwrap());
        assert!(p.toggle_character("c1").unwrap());
        assert!(matches!(p.toggle_character("zz"), Err(EconomyError::UnknownCharacter(_))));
    }

    #[test]
    fn daily_vault_locks_for_twelve_hours() {
        let mut p = PlayerProfile::initial();
        let now = DAILY_COOLDOWN_MS * 3.0;
        p.claim_daily(1, now).unwrap();
        assert_eq!(p.coins, 75_000);
        assert!(matches!(p.claim_daily(0, now + 1000.0), Err(EconomyError::VaultLocked { .. })));
        p.claim_daily(0, now + DAILY_COOLDOWN_MS).unwrap();
        assert!(matches!(p.claim_daily(9, now * 10.0), Err(EconomyError::UnknownCard(9))));
    }

    #[test]
    fn rank_reward_once_per_cycle() {
        let mut p = PlayerProfile::initial();
        let now = RANK_CYCLE_MS * 5.5;
        assert_eq!(p.claim_rank_reward(None, now), Err(EconomyError::Unranked));
        assert_eq!(p.claim_rank_reward(Some(2), now), Ok(2_500_000));
        assert_eq!(p.claim_rank_reward(Some(2), now + 1.0), Err(EconomyError::CycleNotReset));
        assert!(p.claim_rank_reward(Some(60), now + RANK_CYCLE_MS).is_ok());
    }

    #[test]
    fn win_pays_out_and_unlocks_next_stage() {
        let mut p = PlayerProfile::initial();
        let m = catalog::stage(3).unwrap();
        p.apply_battle_result(m, &Outcome::Lose.to_result());
        assert_eq!(p.unlocked_level, 1);
        p.apply_battle_result(m, &Outcome::Win { exp: m.exp_reward }.to_result());
        assert_eq!(p.unlocked_level, 4);
        assert_eq!(p.stage_points, 3000);
        assert_eq!(p.coins, 50_600);
        assert_eq!(p.level, 3);
    }

    #[test]
    fn prepare_auto_equips_first_weapon() {
        let mut p = armed();
        let loadout = p.prepare_for_battle();
        assert_eq!(p.equipped, vec!["w0".to_string()]);
        assert_eq!(loadout.weapons.len(), 1);
        assert_eq!(loadout.characters.len(), 1);
        assert_eq!(loadout.characters[0].character.id, "c1");
    }
}
