//! Music and sound effects. The service owns the enabled flags and forwards to
//! a backend; the browser backend plays through `HtmlAudioElement`.

use wasm_bindgen::JsValue;
use web_sys::HtmlAudioElement;

use crate::engine::BattleEvent;

pub const MENU_TRACK: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-8.mp3";
pub const BONUS_TRACK: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-16.mp3";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundEffect {
    Hit,
    Miss,
    Crit,
    Success,
    Error,
}

impl SoundEffect {
    pub fn url(self) -> &'static str {
        match self {
            SoundEffect::Hit => "https://assets.mixkit.co/active_storage/sfx/2571/2571-preview.mp3",
            SoundEffect::Miss | SoundEffect::Error => {
                "https://assets.mixkit.co/active_storage/sfx/2572/2572-preview.mp3"
            }
            SoundEffect::Crit => "https://assets.mixkit.co/active_storage/sfx/1110/1110-preview.mp3",
            SoundEffect::Success => "https://assets.mixkit.co/active_storage/sfx/2019/2019-preview.mp3",
        }
    }

    /// Cue for a battle event, if it has one. Crits sound on impact.
    pub fn for_event(event: &BattleEvent) -> Option<SoundEffect> {
        match event {
            BattleEvent::NoteHit { .. } => Some(SoundEffect::Hit),
            BattleEvent::NoteMissed { .. } => Some(SoundEffect::Miss),
            BattleEvent::Impact { crit: true, .. } => Some(SoundEffect::Crit),
            _ => None,
        }
    }
}

pub trait AudioBackend {
    fn play_music(&mut self, url: &str, looped: bool, volume: f64);
    fn stop_music(&mut self);
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    fn play_sound(&mut self, url: &str, volume: f64);
}

pub struct AudioService<B> {
    backend: B,
    music_enabled: bool,
    sound_enabled: bool,
}

impl<B: AudioBackend> AudioService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, music_enabled: true, sound_enabled: true }
    }

    pub fn set_settings(&mut self, music: bool, sound: bool) {
        self.music_enabled = music;
        self.sound_enabled = sound;
        if !music {
            self.backend.pause_music();
        }
    }

    pub fn play_music(&mut self, url: &str, volume: f64) {
        if !self.music_enabled {
            return;
        }
        self.backend.stop_music();
        self.backend.play_music(url, true, volume);
    }

    pub fn stop_music(&mut self) {
        self.backend.stop_music();
    }

    pub fn pause_music(&mut self) {
        self.backend.pause_music();
    }

    pub fn resume_music(&mut self) {
        if self.music_enabled {
            self.backend.resume_music();
        }
    }

    pub fn play(&mut self, effect: SoundEffect) {
        if self.sound_enabled {
            self.backend.play_sound(effect.url(), 0.6);
        }
    }

    /// Play the cue of every event that has one.
    pub fn play_events(&mut self, events: &[BattleEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.play(effect);
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Records calls instead of playing. Used natively and in tests.
#[derive(Debug, Default)]
pub struct SilentBackend {
    pub log: Vec<String>,
}

impl AudioBackend for SilentBackend {
    fn play_music(&mut self, url: &str, _looped: bool, _volume: f64) {
        self.log.push(format!("music {url}"));
    }

    fn stop_music(&mut self) {
        self.log.push("stop".into());
    }

    fn pause_music(&mut self) {
        self.log.push("pause".into());
    }

    fn resume_music(&mut self) {
        self.log.push("resume".into());
    }

    fn play_sound(&mut self, url: &str, _volume: f64) {
        self.log.push(format!("sound {url}"));
    }
}

#[derive(Default)]
pub struct WebAudioBackend {
    current: Option<HtmlAudioElement>,
}

fn warn_playback(what: &str, e: JsValue) {
    log::warn!("{} playback failed: {:?}", what, e);
}

impl AudioBackend for WebAudioBackend {
    fn play_music(&mut self, url: &str, looped: bool, volume: f64) {
        match HtmlAudioElement::new_with_src(url) {
            Ok(el) => {
                el.set_loop(looped);
                el.set_volume(volume);
                if let Err(e) = el.play() {
                    warn_playback("music", e);
                }
                self.current = Some(el);
            }
            Err(e) => warn_playback("music", e),
        }
    }

    fn stop_music(&mut self) {
        if let Some(el) = self.current.take() {
            let _ = el.pause();
            el.set_current_time(0.0);
        }
    }

    fn pause_music(&mut self) {
        if let Some(el) = &self.current {
            let _ = el.pause();
        }
    }

    fn resume_music(&mut self) {
        if let Some(el) = &self.current {
            if let Err(e) = el.play() {
                warn_playback("music", e);
            }
        }
    }

    fn play_sound(&mut self, url: &str, volume: f64) {
        match HtmlAudioElement::new_with_src(url) {
            Ok(el) => {
                el.set_volume(volume);
                if let Err(e) = el.play() {
                    warn_playback("sfx", e);
                }
            }
            Err(e) => warn_playback("sfx", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Outcome, Point};

    #[test]
    fn muted_sound_plays_nothing() {
        let mut audio = AudioService::new(SilentBackend::default());
        audio.set_settings(true, false);
        audio.play(SoundEffect::Hit);
        assert!(audio.backend().log.is_empty());
    }

    #[test]
    fn disabling_music_pauses_it() {
        let mut audio = AudioService::new(SilentBackend::default());
        audio.play_music(MENU_TRACK, 0.25);
        audio.set_settings(false, true);
        audio.play_music(BONUS_TRACK, 0.3);
        audio.resume_music();
        assert_eq!(
            audio.backend().log,
            vec!["stop".to_string(), format!("music {MENU_TRACK}"), "pause".to_string()]
        );
    }

    #[test]
    fn events_map_to_cues() {
        let events = vec![
            BattleEvent::NoteHit { id: 1, lane: 0, combo: 1 },
            BattleEvent::Impact {
                projectile_id: 1,
                damage: 10,
                crit: false,
                health: 5,
                at: Point { x: 0.0, y: 0.0 },
            },
            BattleEvent::Impact {
                projectile_id: 2,
                damage: 10,
                crit: true,
                health: 0,
                at: Point { x: 0.0, y: 0.0 },
            },
            BattleEvent::NoteMissed { id: 2, lane: 1, lives: 3 },
            BattleEvent::Finished { result: Outcome::Lose.to_result() },
        ];
        let mut audio = AudioService::new(SilentBackend::default());
        audio.play_events(&events);
        let expected: Vec<String> = [SoundEffect::Hit, SoundEffect::Crit, SoundEffect::Miss]
            .iter()
            .map(|e| format!("sound {}", e.url()))
            .collect();
        assert_eq!(audio.backend().log, expected);
    }
}
