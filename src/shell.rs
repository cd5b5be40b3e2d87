//! Application shell: current view, toasts, and the glue between the profile,
//! persistence, the leaderboard and audio. Every successful profile change is
//! saved and synced.

use rand::Rng;
use rand::rngs::SmallRng;
use serde::Serialize;

use crate::audio::{AudioBackend, AudioService, BONUS_TRACK, MENU_TRACK, SoundEffect};
use crate::bonus::BonusOutcome;
use crate::catalog;
use crate::config::EngineConfig;
use crate::engine::{ResultTag, Session, SessionResult};
use crate::leaderboard::{self, LeaderboardEntry, LeaderboardService, RankTab};
use crate::model::Monster;
use crate::profile::{EconomyError, PlayerProfile};
use crate::store::{self, ProfileStorage};

pub const NOTIFICATION_MS: f64 = 3000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    #[default]
    Start,
    LevelSelect,
    Battle,
    Shop,
    Inventory,
    Leaderboard,
    Settings,
    BonusGame,
    Team,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NoticeKind,
    pub shown_at: f64,
}

pub struct Shell<S, L, B> {
    profile: PlayerProfile,
    storage: S,
    leaderboard: L,
    audio: AudioService<B>,
    view: View,
    stage: Option<&'static Monster>,
    notifications: Vec<Notification>,
    board: Vec<LeaderboardEntry>,
    rank_tab: RankTab,
}

impl<S: ProfileStorage, L: LeaderboardService, B: AudioBackend> Shell<S, L, B> {
    /// Load the saved profile (or start fresh) and apply its audio settings.
    pub fn new(storage: S, leaderboard: L, audio: AudioService<B>) -> Self {
        let profile = store::load_or_initial(&storage);
        let mut shell = Self {
            profile,
            storage,
            leaderboard,
            audio,
            view: View::Start,
            stage: None,
            notifications: Vec::new(),
            board: Vec::new(),
            rank_tab: RankTab::Points,
        };
        shell.apply_audio_settings();
        shell
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn stage(&self) -> Option<&'static Monster> {
        self.stage
    }

    pub fn audio_mut(&mut self) -> &mut AudioService<B> {
        &mut self.audio
    }

    pub fn navigate(&mut self, view: View, now: f64) {
        log::debug!("view {:?} -> {:?}", self.view, view);
        self.view = view;
        match view {
            View::Start | View::LevelSelect => self.audio.play_music(MENU_TRACK, 0.25),
            View::Leaderboard => self.refresh_leaderboard(now),
            _ => {}
        }
    }

    // --- Notifications ---

    pub fn notify(&mut self, message: impl Into<String>, kind: NoticeKind, now: f64) {
        match kind {
            NoticeKind::Success => self.audio.play(SoundEffect::Success),
            NoticeKind::Error => self.audio.play(SoundEffect::Error),
            NoticeKind::Info => {}
        }
        self.notifications.push(Notification { message: message.into(), kind, shown_at: now });
    }

    /// Drop expired toasts and return the live ones.
    pub fn notifications(&mut self, now: f64) -> &[Notification] {
        self.notifications.retain(|n| now - n.shown_at < NOTIFICATION_MS);
        &self.notifications
    }

    // --- Profile mutation ---

    /// Run an economy operation. Success persists and syncs; failure becomes an
    /// error toast and leaves the profile untouched.
    pub fn update<T>(
        &mut self,
        now: f64,
        op: impl FnOnce(&mut PlayerProfile) -> Result<T, EconomyError>,
    ) -> Result<T, EconomyError> {
        match op(&mut self.profile) {
            Ok(value) => {
                self.persist(now);
                Ok(value)
            }
            Err(e) => {
                self.notify(e.to_string(), NoticeKind::Error, now);
                Err(e)
            }
        }
    }

    fn persist(&mut self, now: f64) {
        if let Err(e) = store::save_profile(&self.storage, &self.profile) {
            log::error!("saving profile failed: {}", e);
        }
        leaderboard::sync_score(&self.leaderboard, &self.profile, now);
    }

    pub fn set_settings(&mut self, music: bool, sound: bool, now: f64) {
        self.profile.settings.music_enabled = music;
        self.profile.settings.sound_enabled = sound;
        self.apply_audio_settings();
        self.persist(now);
    }

    fn apply_audio_settings(&mut self) {
        let s = self.profile.settings;
        self.audio.set_settings(s.music_enabled, s.sound_enabled);
    }

    // --- Battle flow ---

    /// Pick a stage from the map. Locked stages are rejected.
    pub fn select_stage(&mut self, level: u32, now: f64) -> Result<&'static Monster, EconomyError> {
        let monster = self.update(now, |p| {
            let monster = catalog::stage(level).ok_or(EconomyError::UnknownStage(level))?;
            if !p.is_stage_unlocked(level) {
                return Err(EconomyError::StageLocked(level));
            }
            p.prepare_for_battle();
            Ok(monster)
        })?;
        self.stage = Some(monster);
        self.view = View::Battle;
        Ok(monster)
    }

    /// Build a session for the selected stage with the current loadout.
    pub fn begin_battle_with<R: Rng>(&mut self, config: EngineConfig, rng: R) -> Option<Session<R>> {
        let monster = self.stage?;
        self.audio.play_music(&monster.song_url, 0.4);
        Some(Session::new(monster.clone(), self.profile.resolve_loadout(), config, rng))
    }

    pub fn begin_battle(&mut self, config: EngineConfig) -> Option<Session<SmallRng>> {
        self.begin_battle_with(config, crate::rng::entropy_rng())
    }

    /// Apply a battle result. A win moves on to the bonus round; anything else
    /// returns to the stage map.
    pub fn finish_battle(&mut self, result: &SessionResult, now: f64) {
        self.audio.stop_music();
        let Some(monster) = self.stage else {
            log::warn!("battle finished with no stage selected");
            self.navigate(View::LevelSelect, now);
            return;
        };
        if result.result == ResultTag::Win {
            self.profile.apply_battle_result(monster, result);
            self.persist(now);
            self.notify(format!("{} defeated!", monster.name), NoticeKind::Success, now);
            self.view = View::BonusGame;
            self.audio.play_music(BONUS_TRACK, 0.3);
        } else {
            self.stage = None;
            self.navigate(View::LevelSelect, now);
        }
    }

    pub fn finish_bonus(&mut self, outcome: &BonusOutcome, now: f64) {
        self.audio.stop_music();
        self.profile.apply_bonus_keys(&outcome.keys);
        self.persist(now);
        self.stage = None;
        self.navigate(View::Start, now);
    }

    // --- Leaderboard ---

    pub fn refresh_leaderboard(&mut self, now: f64) {
        self.board = leaderboard::fetch_top(&self.leaderboard, now);
    }

    pub fn set_rank_tab(&mut self, tab: RankTab) {
        self.rank_tab = tab;
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::ranked(&self.board, self.rank_tab)
    }

    pub fn my_rank(&self) -> Option<usize> {
        leaderboard::rank_of(&self.board, &self.profile.username, self.rank_tab)
    }

    pub fn claim_rank_reward(&mut self, now: f64) -> Result<u64, EconomyError> {
        let rank = self.my_rank();
        let coins = self.update(now, |p| p.claim_rank_reward(rank, now))?;
        self.notify(format!("Claimed rank #{} rewards", rank.unwrap_or(0)), NoticeKind::Success, now);
        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentBackend;
    use crate::bonus::BonusEnd;
    use crate::engine::Outcome;
    use crate::leaderboard::InMemoryLeaderboard;
    use crate::model::Keys;
    use crate::store::MemoryStorage;

    type TestShell = Shell<MemoryStorage, InMemoryLeaderboard, SilentBackend>;

    fn shell() -> TestShell {
        Shell::new(
            MemoryStorage::new(),
            InMemoryLeaderboard::new(),
            AudioService::new(SilentBackend::default()),
        )
    }

    #[test]
    fn locked_stage_is_rejected() {
        let mut s = shell();
        assert_eq!(s.select_stage(2, 0.0), Err(EconomyError::StageLocked(2)));
        assert_eq!(s.select_stage(500, 0.0), Err(EconomyError::UnknownStage(500)));
        assert_eq!(s.view(), View::Start);
        assert_eq!(s.notifications(0.0).len(), 2);
    }

    #[test]
    fn win_goes_to_bonus_then_home() {
        let mut s = shell();
        let m = s.select_stage(1, 0.0).unwrap();
        assert_eq!(s.view(), View::Battle);
        s.finish_battle(&Outcome::Win { exp: m.exp_reward }.to_result(), 1.0);
        assert_eq!(s.view(), View::BonusGame);
        assert_eq!(s.profile().unlocked_level, 2);

        let outcome = BonusOutcome { reason: BonusEnd::Bomb, keys: Keys::new(3, 2, 1) };
        s.finish_bonus(&outcome, 2.0);
        assert_eq!(s.view(), View::Start);
        assert_eq!(s.profile().keys, Keys::new(103, 52, 21));
        assert!(s.stage().is_none());
    }

    #[test]
    fn loss_returns_to_map() {
        let mut s = shell();
        s.select_stage(1, 0.0).unwrap();
        s.finish_battle(&Outcome::Lose.to_result(), 1.0);
        assert_eq!(s.view(), View::LevelSelect);
        assert_eq!(s.profile().unlocked_level, 1);
    }

    #[test]
    fn changes_are_persisted() {
        let mut s = shell();
        s.update(0.0, |p| p.rename("Persisted")).unwrap();
        let reloaded = store::load_profile(&s.storage).unwrap();
        assert_eq!(reloaded.username, "Persisted");
    }

    #[test]
    fn toasts_expire_after_three_seconds() {
        let mut s = shell();
        s.notify("hello", NoticeKind::Info, 1000.0);
        assert_eq!(s.notifications(3999.0).len(), 1);
        assert!(s.notifications(4000.0).is_empty());
    }
}
