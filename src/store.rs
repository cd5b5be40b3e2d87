//! Profile persistence.
//!
//! Saves are JSON under a fixed key. On load every inventory weapon passes
//! through a repair step: broken or missing damage is restored from the
//! catalog by name (rescaled to the weapon's level), or set to a fixed
//! sentinel when the name is unknown. Repair is idempotent.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::catalog;
use crate::model::{LEVEL_DAMAGE_GROWTH, MAX_WEAPON_LEVEL, Rarity, level_scaled_damage};
use crate::profile::PlayerProfile;

pub const STORAGE_KEY: &str = "slay-beat-v220";
/// Damage assigned to a broken weapon with no catalog match.
pub const SENTINEL_DAMAGE: u64 = 500;
pub const DEFAULT_CRIT_CHANCE: f64 = 0.1;
pub const DEFAULT_CRIT_MULTIPLIER: f64 = 4.5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Minimal string key-value store.
pub trait ProfileStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: ProfileStorage + ?Sized> ProfileStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<T: ProfileStorage + ?Sized> ProfileStorage for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory backend for native builds and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage`.
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn from_window() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| StoreError::Backend("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(js_err)?
            .ok_or_else(|| StoreError::Backend("localStorage unavailable".into()))?;
        Ok(Self { storage })
    }
}

impl ProfileStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(js_err)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(js_err)
    }
}

fn js_err(e: wasm_bindgen::JsValue) -> StoreError {
    StoreError::Backend(format!("{:?}", e))
}

/// On-disk layout. Unknown top-level fields are ignored.
#[derive(Deserialize)]
struct SaveFile {
    player: PlayerProfile,
}

#[derive(Serialize)]
struct SaveRef<'a> {
    player: &'a PlayerProfile,
}

/// Load the saved profile, or the initial one when nothing is stored.
pub fn load_profile(storage: &dyn ProfileStorage) -> Result<PlayerProfile> {
    let Some(raw) = storage.get(STORAGE_KEY)? else {
        log::info!("no save found, starting fresh");
        return Ok(PlayerProfile::initial());
    };
    parse_save(&raw)
}

/// Like [`load_profile`], but a corrupt save falls back to a fresh profile.
pub fn load_or_initial(storage: &dyn ProfileStorage) -> PlayerProfile {
    match load_profile(storage) {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("discarding unreadable save: {}", e);
            PlayerProfile::initial()
        }
    }
}

pub fn save_profile(storage: &dyn ProfileStorage, profile: &PlayerProfile) -> Result<()> {
    let raw = serde_json::to_string(&SaveRef { player: profile })?;
    storage.set(STORAGE_KEY, &raw)
}

/// Parse save JSON and repair its inventory.
pub fn parse_save(raw: &str) -> Result<PlayerProfile> {
    let mut value: Value = serde_json::from_str(raw)?;
    if let Some(inventory) = value
        .get_mut("player")
        .and_then(|p| p.get_mut("inventory"))
        .and_then(Value::as_array_mut)
    {
        for weapon in inventory.iter_mut().filter_map(Value::as_object_mut) {
            repair_weapon(weapon);
        }
    }
    let save: SaveFile = serde_json::from_value(value)?;
    Ok(save.player)
}

fn finite(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|x| x.is_finite())
}

/// Normalize one raw weapon object in place.
pub fn repair_weapon(w: &mut Map<String, Value>) {
    let name = w.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
    let template = catalog::weapon_by_name(&name);

    let cap = finite(w.get("maxLevel"))
        .filter(|l| *l >= 1.0)
        .map_or(MAX_WEAPON_LEVEL, |l| l.min(MAX_WEAPON_LEVEL as f64) as u32);
    let saved = finite(w.get("level")).filter(|l| *l >= 1.0).map(f64::floor);
    let level = saved.map_or(1, |l| l.min(cap as f64) as u32);
    w.insert("level".into(), json!(level));
    w.insert("maxLevel".into(), json!(cap));
    let over_cap = saved.is_some_and(|l| l > cap as f64);

    // level is in 1..=MAX_WEAPON_LEVEL here
    let growth = LEVEL_DAMAGE_GROWTH.powi((level - 1) as i32);
    match finite(w.get("damage")) {
        Some(_) if over_cap => {
            let base = finite(w.get("baseDamage"))
                .or(template.map(|t| t.base_damage))
                .unwrap_or(SENTINEL_DAMAGE as f64 / growth);
            let damage = level_scaled_damage(base, level).max(1);
            log::warn!("clamped '{}' to level {} with damage {}", name, level, damage);
            w.insert("damage".into(), json!(damage));
            w.insert("baseDamage".into(), json!(base));
        }
        Some(damage) => {
            if finite(w.get("baseDamage")).is_none() {
                w.insert("baseDamage".into(), json!(damage / growth));
            }
            w.insert("damage".into(), json!(damage.floor().max(0.0) as u64));
        }
        None => {
            let (damage, base) = match template {
                Some(t) => (level_scaled_damage(t.base_damage, level), t.base_damage),
                None => (SENTINEL_DAMAGE, SENTINEL_DAMAGE as f64 / growth),
            };
            log::warn!("repaired damage of '{}' to {}", name, damage);
            w.insert("damage".into(), json!(damage));
            w.insert("baseDamage".into(), json!(base));
        }
    }

    let rarity = w
        .get("rarity")
        .and_then(Value::as_str)
        .and_then(Rarity::from_name)
        .or(template.map(|t| t.rarity))
        .unwrap_or(Rarity::Common);
    w.insert("rarity".into(), Value::String(rarity.as_str().into()));

    if finite(w.get("critChance")).is_none() {
        w.insert("critChance".into(), json!(DEFAULT_CRIT_CHANCE));
    }
    if finite(w.get("critMultiplier")).is_none() {
        w.insert("critMultiplier".into(), json!(DEFAULT_CRIT_MULTIPLIER));
    }

    let defaults = [
        ("id", json!(name)),
        ("description", json!("")),
        ("price", json!(0)),
        ("icon", json!("🗡️")),
        ("damageMultiplier", json!(1.0)),
        ("extraLives", json!(template.map_or(0, |t| t.extra_lives))),
        ("keyDropBonus", json!(0.0)),
        ("expBonus", json!(0.0)),
        ("maxLevel", json!(50)),
    ];
    for (key, default) in defaults {
        if w.get(key).is_none_or(Value::is_null) {
            w.insert(key.into(), default);
        }
    }
    w.insert("name".into(), json!(name));
}
