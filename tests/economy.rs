// Integration tests (native) for the player economy: saves, the workshop, the
// shop, the daily vault and the full stage -> battle -> bonus flow.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use slay_beat::audio::{AudioService, SilentBackend};
use slay_beat::bonus::{BonusEnd, BonusGame, CatchResult, ItemKind};
use slay_beat::catalog::{self, DAILY_COOLDOWN_MS, LootboxTier, RANK_CYCLE_MS};
use slay_beat::config::FallbackProfile;
use slay_beat::leaderboard::{self, InMemoryLeaderboard};
use slay_beat::model::{Keys, Rarity, level_scaled_damage};
use slay_beat::profile::LootboxReward;
use slay_beat::shell::{Shell, View};
use slay_beat::store::{self, MemoryStorage, ProfileStorage, STORAGE_KEY};
use slay_beat::{BattleEvent, BonusConfig, EconomyError, EngineConfig, PlayerProfile};

fn stored(raw: &str) -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.set(STORAGE_KEY, raw).unwrap();
    storage
}

// A save whose weapon lost its damage gets it back from the catalog, and
// saving the repaired profile changes nothing on the next load.
#[test]
fn repaired_save_is_stable() {
    let raw = json!({
        "player": {
            "username": "Vex",
            "coins": 1234,
            "inventory": [
                { "id": "a", "name": "Common Edge 1", "level": 3, "damage": null },
                { "id": "b", "name": "Homebrew Spoon", "level": 2 }
            ]
        }
    })
    .to_string();
    let storage = stored(&raw);
    let first = store::load_profile(&storage).unwrap();
    assert_eq!(first.username, "Vex");
    assert_eq!(first.coins, 1234);

    let template = catalog::weapon_by_name("Common Edge 1").unwrap();
    let edge = first.weapon("a").unwrap();
    assert_eq!(edge.damage, level_scaled_damage(template.base_damage, 3));
    assert_eq!(edge.rarity, template.rarity);

    let spoon = first.weapon("b").unwrap();
    assert_eq!(spoon.damage, store::SENTINEL_DAMAGE);
    assert_eq!(spoon.rarity, Rarity::Common);
    assert_eq!(spoon.crit_chance, store::DEFAULT_CRIT_CHANCE);

    store::save_profile(&storage, &first).unwrap();
    let second = store::load_profile(&storage).unwrap();
    assert_eq!(first, second);
}

// An unreadable save falls back to a fresh profile instead of failing.
#[test]
fn corrupt_save_starts_fresh() {
    let storage = stored("{not json");
    assert!(store::load_profile(&storage).is_err());
    assert_eq!(store::load_or_initial(&storage), PlayerProfile::initial());
}

// Opening boxes spends coins and keys, and each weapon gets a unique id.
#[test]
fn lootbox_spends_and_grants() {
    let mut p = PlayerProfile::initial();
    let mut rng = StdRng::seed_from_u64(11);
    let first = p.open_lootbox(LootboxTier::Common, &mut rng, 1000.0).unwrap();
    let second = p.open_lootbox(LootboxTier::Common, &mut rng, 1000.0).unwrap();
    let (LootboxReward::Weapon(a), LootboxReward::Weapon(b)) = (first, second) else {
        panic!("common boxes always hold a weapon");
    };
    assert_eq!(a.rarity, Rarity::Common);
    assert_eq!(a.level, 1);
    assert_eq!((a.id.as_str(), b.id.as_str()), ("1000", "1001"));
    assert_eq!(p.coins, 48_000);
    assert_eq!(p.keys, Keys::new(80, 50, 20));
    assert_eq!(p.inventory.len(), 2);

    let err = p.open_lootbox(LootboxTier::Ancient, &mut rng, 2000.0).unwrap_err();
    assert!(matches!(err, EconomyError::InsufficientCoins { .. }));
    assert_eq!(p.coins, 48_000);
}

// Upgrading step by step lands on the same damage as the level formula.
#[test]
fn workshop_upgrades_compound_from_base() {
    let mut p = PlayerProfile::initial();
    let mut rng = StdRng::seed_from_u64(5);
    let LootboxReward::Weapon(w) = p.open_lootbox(LootboxTier::Basic, &mut rng, 1.0).unwrap() else {
        panic!("basic boxes always hold a weapon");
    };
    for _ in 0..4 {
        p.upgrade_weapon(&w.id).unwrap();
    }
    let upgraded = p.weapon(&w.id).unwrap();
    assert_eq!(upgraded.level, 5);
    assert_eq!(upgraded.damage, level_scaled_damage(w.base_damage, 5));
    // 5000 for the box, then 2500 + 5000 + 7500 + 10000
    assert_eq!(p.coins, 50_000 - 5_000 - 25_000);

    assert_eq!(p.equip_weapon(&w.id), Ok(true));
    assert_eq!(p.equip_weapon(&w.id), Ok(false));
    assert!(matches!(p.dismantle_weapon(&w.id), Err(EconomyError::WeaponEquipped(_))));
    assert!(p.unequip_weapon(&w.id));
    assert_eq!(p.dismantle_weapon(&w.id).unwrap().id, w.id);
    assert!(p.inventory.is_empty());
}

// The daily vault pays once per cooldown.
#[test]
fn daily_vault_cooldown() {
    let mut p = PlayerProfile::initial();
    let now = DAILY_COOLDOWN_MS;
    p.claim_daily(0, now).unwrap();
    assert_eq!(p.coins, 60_000);
    assert_eq!(p.keys, Keys::new(120, 60, 25));
    assert!(matches!(p.claim_daily(1, now + 1.0), Err(EconomyError::VaultLocked { .. })));
    assert_eq!(
        p.claim_daily(42, now + DAILY_COOLDOWN_MS),
        Err(EconomyError::UnknownCard(42))
    );
}

// Full loop: pick a stage, win the battle, blow up in the bonus round, return
// home. The progress survives a reload and shows on the leaderboard.
#[test]
fn stage_battle_bonus_flow() {
    let storage = MemoryStorage::new();
    let board = InMemoryLeaderboard::new();
    let mut shell = Shell::new(&storage, &board, AudioService::new(SilentBackend::default()));
    shell.update(0.0, |p| p.rename("Hero")).unwrap();
    shell.select_stage(1, 0.0).unwrap();
    assert_eq!(shell.view(), View::Battle);

    // One fallback hit is enough to clear stage 1.
    let cfg = EngineConfig {
        external_multiplier: 1000.0,
        fallback: FallbackProfile { damage: 50.0, crit_chance: 0.0, crit_multiplier: 1.0 },
        ..EngineConfig::default()
    };
    let mut session = shell.begin_battle_with(cfg, StdRng::seed_from_u64(3)).unwrap();
    session.start(0.0).unwrap();
    session.step(0.0);
    let note = session.notes()[0].clone();
    session.hit(note.lane, note.time);
    let result = session
        .step(note.time + 500.0)
        .into_iter()
        .find_map(|e| match e {
            BattleEvent::Finished { result } => Some(result),
            _ => None,
        })
        .unwrap();

    shell.finish_battle(&result, 1.0);
    assert_eq!(shell.view(), View::BonusGame);
    assert_eq!(shell.profile().unlocked_level, 2);
    assert_eq!(shell.profile().stage_points, 1000);
    assert_eq!(shell.profile().coins, 50_200);
    assert_eq!(shell.profile().exp, 400);

    let all_bombs = BonusConfig {
        common_threshold: 0.0,
        basic_threshold: 0.0,
        premium_threshold: 0.0,
        ..BonusConfig::default()
    };
    let mut bonus = BonusGame::new(all_bombs, StdRng::seed_from_u64(8));
    bonus.start(0.0);
    assert!(bonus.step(0.0).is_none());
    let bomb = bonus.items()[0].clone();
    assert_eq!(bomb.kind, ItemKind::Bomb);
    assert_eq!(bonus.catch(bomb.id), CatchResult::Detonated);
    let outcome = bonus.outcome().unwrap();
    assert_eq!(outcome.reason, BonusEnd::Bomb);
    assert_eq!(outcome.keys, Keys::default());

    shell.finish_bonus(&outcome, 2.0);
    assert_eq!(shell.view(), View::Start);

    let reloaded = store::load_profile(&storage).unwrap();
    assert_eq!(&reloaded, shell.profile());

    let top = leaderboard::fetch_top(&board, 2.0);
    assert_eq!(top.len(), 1);
    assert_eq!((top[0].username.as_str(), top[0].score), ("Hero", 1000));

    shell.navigate(View::Leaderboard, RANK_CYCLE_MS);
    assert_eq!(shell.my_rank(), Some(1));
    assert_eq!(shell.claim_rank_reward(RANK_CYCLE_MS), Ok(5_000_000));
    assert_eq!(
        shell.claim_rank_reward(RANK_CYCLE_MS + 1.0),
        Err(EconomyError::CycleNotReset)
    );
}

// Quitting a battle pays nothing and returns to the stage map.
#[test]
fn quit_returns_to_map() {
    let storage = MemoryStorage::new();
    let board = InMemoryLeaderboard::new();
    let mut shell = Shell::new(&storage, &board, AudioService::new(SilentBackend::default()));
    shell.select_stage(1, 0.0).unwrap();
    let mut session = shell
        .begin_battle_with(EngineConfig::default(), StdRng::seed_from_u64(1))
        .unwrap();
    session.start(0.0).unwrap();
    let result = session.quit().unwrap();
    shell.finish_battle(&result, 1.0);
    assert_eq!(shell.view(), View::LevelSelect);
    assert_eq!(*shell.profile(), PlayerProfile::initial());
}
