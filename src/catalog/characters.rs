// Character roster definition
// This file contains the recruitable characters built once at first access.
use crate::model::{Character, CharacterRarity, Gender, FRAGMENTS_TO_UNLOCK};
use std::sync::OnceLock;

const NAMES: [&str; 30] = [
    "Kael", "Lia", "Vax", "Sera", "Zion", "Nova", "Jax", "Rey", "Finn", "Mora", "Cyrus", "Lyra",
    "Eon", "Xena", "Dante", "Selene", "Ryu", "Mai", "Ken", "Chun", "Sol", "Ky", "Leo", "Ram",
    "I-No", "Pot", "Axl", "Zato", "Millia", "Venom",
];

fn build_characters() -> &'static [Character] {
    let roster: Vec<Character> = NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Character {
            id: format!("c{}", i + 1),
            name: (*name).to_string(),
            gender: if i == 0 {
                Gender::Both
            } else if i % 2 == 0 {
                Gender::M
            } else {
                Gender::F
            },
            rarity: match i {
                0..5 => CharacterRarity::Common,
                5..15 => CharacterRarity::Rare,
                15..25 => CharacterRarity::Epic,
                _ => CharacterRarity::Legendary,
            },
            fragments_needed: FRAGMENTS_TO_UNLOCK,
            icon: if i % 2 == 0 { "👨‍🚀" } else { "👩‍🚀" }.to_string(),
            image: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={name}Male"),
            female_image: Some(format!(
                "https://api.dicebear.com/7.x/avataaars/svg?seed={name}Female"
            )),
        })
        .collect();
    Box::leak(roster.into_boxed_slice())
}

pub fn characters() -> &'static [Character] {
    static ROSTER: OnceLock<&'static [Character]> = OnceLock::new();
    ROSTER.get_or_init(build_characters)
}
