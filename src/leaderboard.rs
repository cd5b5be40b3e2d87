//! Seasonal leaderboard. Boards roll over every 48 hours; a player's entry
//! is upserted by username. Sync is best effort: failures are logged and the
//! game carries on.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::{DEFAULT_USERNAME, PlayerProfile};

pub const PERIOD_MS: f64 = 48.0 * 3_600_000.0;
/// Entries fetched per board.
pub const TOP_LIMIT: usize = 700;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    /// Stage points.
    pub score: u64,
    pub level: u32,
    pub coins: u64,
}

impl LeaderboardEntry {
    pub fn from_profile(profile: &PlayerProfile) -> Self {
        Self {
            username: profile.username.clone(),
            score: profile.stage_points,
            level: profile.level,
            coins: profile.coins,
        }
    }

    fn value(&self, tab: RankTab) -> u64 {
        match tab {
            RankTab::Points => self.score,
            RankTab::Coins => self.coins,
            RankTab::Level => self.level as u64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTab {
    #[default]
    Points,
    Coins,
    Level,
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard backend error: {0}")]
    Remote(String),
}

/// Board id for the period containing `now` (epoch ms).
pub fn period_id(now: f64) -> String {
    format!("leaderboard_p{}", (now.max(0.0) / PERIOD_MS).floor() as u64)
}

pub trait LeaderboardService {
    fn submit(&self, period: &str, entry: &LeaderboardEntry) -> Result<(), LeaderboardError>;
    /// Highest scores first, at most `limit`.
    fn top(&self, period: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}

impl<T: LeaderboardService + ?Sized> LeaderboardService for &T {
    fn submit(&self, period: &str, entry: &LeaderboardEntry) -> Result<(), LeaderboardError> {
        (**self).submit(period, entry)
    }

    fn top(&self, period: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        (**self).top(period, limit)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLeaderboard {
    boards: RefCell<HashMap<String, Vec<LeaderboardEntry>>>,
}

impl InMemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaderboardService for InMemoryLeaderboard {
    fn submit(&self, period: &str, entry: &LeaderboardEntry) -> Result<(), LeaderboardError> {
        let mut boards = self.boards.borrow_mut();
        let board = boards.entry(period.to_string()).or_default();
        match board.iter_mut().find(|e| e.username == entry.username) {
            Some(existing) => *existing = entry.clone(),
            None => board.push(entry.clone()),
        }
        Ok(())
    }

    fn top(&self, period: &str, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut entries = self.boards.borrow().get(period).cloned().unwrap_or_default();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Push the profile's standing. Skipped for unnamed players.
pub fn sync_score(service: &dyn LeaderboardService, profile: &PlayerProfile, now: f64) {
    if profile.username.is_empty() || profile.username == DEFAULT_USERNAME {
        return;
    }
    let entry = LeaderboardEntry::from_profile(profile);
    if let Err(e) = service.submit(&period_id(now), &entry) {
        log::error!("score sync failed: {}", e);
    }
}

pub fn fetch_top(service: &dyn LeaderboardService, now: f64) -> Vec<LeaderboardEntry> {
    match service.top(&period_id(now), TOP_LIMIT) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("leaderboard fetch failed: {}", e);
            Vec::new()
        }
    }
}

/// Entries ordered for a tab, best first. Ties keep fetch order.
pub fn ranked(entries: &[LeaderboardEntry], tab: RankTab) -> Vec<LeaderboardEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.value(tab).cmp(&a.value(tab)));
    sorted
}

/// 1-based rank of `username` under `tab`.
pub fn rank_of(entries: &[LeaderboardEntry], username: &str, tab: RankTab) -> Option<usize> {
    ranked(entries, tab)
        .iter()
        .position(|e| e.username == username)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    impl LeaderboardService for Offline {
        fn submit(&self, _: &str, _: &LeaderboardEntry) -> Result<(), LeaderboardError> {
            Err(LeaderboardError::Remote("offline".into()))
        }

        fn top(&self, _: &str, _: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            Err(LeaderboardError::Remote("offline".into()))
        }
    }

    fn entry(name: &str, score: u64, level: u32, coins: u64) -> LeaderboardEntry {
        LeaderboardEntry { username: name.into(), score, level, coins }
    }

    #[test]
    fn periods_roll_every_48h() {
        assert_eq!(period_id(0.0), "leaderboard_p0");
        assert_eq!(period_id(PERIOD_MS - 1.0), "leaderboard_p0");
        assert_eq!(period_id(PERIOD_MS), "leaderboard_p1");
    }

    #[test]
    fn default_name_is_not_submitted() {
        let board = InMemoryLeaderboard::new();
        let mut p = PlayerProfile::initial();
        sync_score(&board, &p, 0.0);
        assert!(fetch_top(&board, 0.0).is_empty());

        p.username = "Zed".into();
        p.stage_points = 3000;
        sync_score(&board, &p, 0.0);
        p.stage_points = 5000;
        sync_score(&board, &p, 0.0);
        let top = fetch_top(&board, 0.0);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].score, 5000);
        assert!(fetch_top(&board, PERIOD_MS).is_empty());
    }

    #[test]
    fn failures_degrade_to_empty() {
        let mut p = PlayerProfile::initial();
        p.username = "Zed".into();
        sync_score(&Offline, &p, 0.0);
        assert!(fetch_top(&Offline, 0.0).is_empty());
    }

    #[test]
    fn rank_by_tab() {
        let entries = vec![entry("a", 900, 2, 10), entry("b", 100, 9, 50), entry("c", 500, 5, 99)];
        assert_eq!(rank_of(&entries, "a", RankTab::Points), Some(1));
        assert_eq!(rank_of(&entries, "b", RankTab::Level), Some(1));
        assert_eq!(rank_of(&entries, "c", RankTab::Coins), Some(1));
        assert_eq!(rank_of(&entries, "b", RankTab::Points), Some(3));
        assert_eq!(rank_of(&entries, "zz", RankTab::Points), None);
    }
}
