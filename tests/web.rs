// Browser tests, run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

use slay_beat::PlayerProfile;
use slay_beat::store::{self, LocalStorage};

wasm_bindgen_test_configure!(run_in_browser);

// Profiles round-trip through window.localStorage.
#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let storage = LocalStorage::from_window().unwrap();
    let mut profile = PlayerProfile::initial();
    profile.rename("Browser").unwrap();
    profile.coins = 777;
    store::save_profile(&storage, &profile).unwrap();
    assert_eq!(store::load_profile(&storage).unwrap(), profile);
}

// Engine overrides are accepted from JSON and bad JSON is reported.
#[wasm_bindgen_test]
fn engine_config_from_js() {
    assert!(slay_beat::arena::set_engine_config(r#"{"hit_window_ms": 250.0}"#).is_ok());
    assert!(slay_beat::arena::set_engine_config("{").is_err());
}
