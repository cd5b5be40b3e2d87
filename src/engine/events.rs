//! What a session reports back to its host: per-frame events and the
//! terminal result.

use serde::Serialize;

use super::projectile::Point;

/// Terminal outcome of a battle session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win { exp: u64 },
    Lose,
    Quit,
}

impl Outcome {
    pub fn tag(&self) -> ResultTag {
        match self {
            Outcome::Win { .. } => ResultTag::Win,
            Outcome::Lose => ResultTag::Lose,
            Outcome::Quit => ResultTag::Quit,
        }
    }

    pub fn to_result(&self) -> SessionResult {
        let exp = match *self {
            Outcome::Win { exp } => Some(exp),
            _ => None,
        };
        SessionResult {
            result: self.tag(),
            stats: ResultStats { exp },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultTag {
    Win,
    Lose,
    Quit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResultStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

/// Payload handed to the shell: `{"result":"WIN","stats":{"exp":400}}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub result: ResultTag,
    pub stats: ResultStats,
}

/// Things that happened during one `step` or `hit`, in order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BattleEvent {
    NoteSpawned { id: u64, lane: usize, time: f64 },
    NoteHit { id: u64, lane: usize, combo: u32 },
    NoteMissed { id: u64, lane: usize, lives: u32 },
    ProjectileLaunched { id: u64, damage: u64, crit: bool },
    Impact { projectile_id: u64, damage: u64, crit: bool, health: u64, at: Point },
    Finished { result: SessionResult },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_json_shape() {
        let win = serde_json::to_string(&Outcome::Win { exp: 400 }.to_result()).unwrap();
        assert_eq!(win, r#"{"result":"WIN","stats":{"exp":400}}"#);
        let lose = serde_json::to_string(&Outcome::Lose.to_result()).unwrap();
        assert_eq!(lose, r#"{"result":"LOSE","stats":{}}"#);
        let quit = serde_json::to_string(&Outcome::Quit.to_result()).unwrap();
        assert_eq!(quit, r#"{"result":"QUIT","stats":{}}"#);
    }

    #[test]
    fn events_are_tagged() {
        let ev = BattleEvent::NoteHit { id: 3, lane: 1, combo: 2 };
        assert_eq!(
            serde_json::to_string(&ev).unwrap(),
            r#"{"type":"note_hit","id":3,"lane":1,"combo":2}"#
        );
    }
}
