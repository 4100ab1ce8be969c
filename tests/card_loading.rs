//! Card database, deck files and match setup, from files on disk

use duel_engine::core::{CardType, Keyword, PlayerId};
use duel_engine::game::{snapshot, Intent, MatchConfig, Phase};
use duel_engine::loader::{CardDatabase, DeckLoader, MatchInitializer};
use duel_engine::zones::Zone;
use duel_engine::DuelError;
use similar_asserts::assert_eq;
use std::fs;
use std::path::PathBuf;

const CARDS: &str = r#"[
    {"id": "T-001", "name": "Loose Cannon", "type": "Legend", "domains": ["Fury", "Chaos"]},
    {"id": "T-002", "name": "Jinx, Rebel", "type": "Champion Unit", "domains": ["Fury"],
     "cost": {"energy": 3, "power": "C"}, "might": 4,
     "ability": {"trigger": "When you play me", "effect": "Deal 2 to an enemy unit here.", "keywords": ["Assault 2"]},
     "tags": ["champion"]},
    {"id": "T-003", "name": "The Grand Plaza", "type": "Battlefield"},
    {"id": "T-004", "name": "Pit Rookie", "type": "Unit", "domains": "Fury",
     "cost": {"energy": 2}, "might": 2, "ability": {"keywords": ["Tank"]}},
    {"id": "T-005", "name": "Get Excited!", "type": "Spell", "domains": ["Fury"],
     "cost": {"energy": 1, "power": 0}, "ability": {"effect": "Draw 1.", "keywords": ["Action"]}},
    {"id": "T-006", "name": "Fury Rune", "type": "Rune", "domain": "Fury"}
]"#;

const DECK: &str = r#"
# Test deck
[Legend]
1 Loose Cannon
[Champion]
1 Jinx, Rebel
[Battlefield]
1 The Grand Plaza
[Main]
8 Pit Rookie
8 Get Excited!
[Runes]
12 Fury Rune
"#;

/// Write the fixtures into a fresh directory under the system temp dir
fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("duel-engine-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("cards.json"), CARDS).unwrap();
    fs::write(dir.join("fury.deck"), DECK).unwrap();
    dir
}

#[test]
fn test_database_loads_from_file() {
    let dir = fixture_dir("db");
    let db = CardDatabase::load_from_file(&dir.join("cards.json")).unwrap();
    assert_eq!(db.len(), 6);

    let jinx = db.get_card("JINX, REBEL").unwrap();
    assert_eq!(jinx.card_type, CardType::Unit);
    assert_eq!(jinx.power, 1);
    assert!(jinx.is_champion());
    assert!(jinx.has_keyword(&Keyword::Assault(0)));

    let rookie = db.get_card("pit rookie").unwrap();
    assert!(rookie.has_keyword(&Keyword::Tank));
    assert_eq!(rookie.domains.len(), 1);

    assert!(matches!(
        CardDatabase::load_from_file(&dir.join("missing.json")),
        Err(DuelError::IoError(_))
    ));
}

#[test]
fn test_match_from_deck_files() {
    let dir = fixture_dir("match");
    let db = CardDatabase::load_from_file(&dir.join("cards.json")).unwrap();
    let deck = DeckLoader::load_from_file(&dir.join("fury.deck")).unwrap();
    assert_eq!(deck.total_cards(), 16);

    let m = MatchInitializer::new(&db)
        .init_match("Alice", &deck, "Bob", &deck, MatchConfig::default())
        .unwrap();

    assert_eq!(m.phase(), Phase::Mulligan);
    for player in m.players.iter() {
        assert_eq!(player.hand_size(), 4);
        assert_eq!(player.zones.main_deck.len(), 12);
        assert_eq!(player.zones.rune_deck.len(), 12);
        let champion = player.champion.expect("champion slot filled");
        assert_eq!(m.card(champion).unwrap().zone, Zone::Champion);
        let legend = player.legend.expect("legend placed");
        assert_eq!(m.card(legend).unwrap().name(), "Loose Cannon");
    }
}

#[test]
fn test_redacted_views_agree_on_public_state() {
    let dir = fixture_dir("redact");
    let db = CardDatabase::load_from_file(&dir.join("cards.json")).unwrap();
    let deck = DeckLoader::load_from_file(&dir.join("fury.deck")).unwrap();
    let m = MatchInitializer::new(&db)
        .init_match("Alice", &deck, "Bob", &deck, MatchConfig::default())
        .unwrap();

    let alice = snapshot::redacted_for(&m, PlayerId::new(0));
    let bob = snapshot::redacted_for(&m, PlayerId::new(1));

    assert_eq!(alice.battlefields, bob.battlefields);
    assert_eq!(alice.log, bob.log);
    assert_eq!(alice.players[0].hand.count, bob.players[0].hand.count);
    assert_eq!(alice.players[1].hand.cards, None);
    assert_eq!(bob.players[0].hand.cards, None);

    let alice_hand = m.players[0].zones.hand.cards.clone();
    assert!(alice_hand.iter().all(|c| alice.cards.iter().any(|v| v.id == *c)));
    assert!(alice_hand.iter().all(|c| !bob.cards.iter().any(|v| v.id == *c)));
}

#[test]
fn test_same_seed_replays_identically() {
    let dir = fixture_dir("replay");
    let db = CardDatabase::load_from_file(&dir.join("cards.json")).unwrap();
    let deck = DeckLoader::load_from_file(&dir.join("fury.deck")).unwrap();

    let run = |seed: u64| {
        let config = MatchConfig {
            seed,
            ..MatchConfig::default()
        };
        let mut m = MatchInitializer::new(&db)
            .init_match("Alice", &deck, "Bob", &deck, config)
            .unwrap();
        let script = [
            Intent::ConfirmMulligan {
                player: PlayerId::new(0),
                recycle: vec![],
            },
            Intent::ConfirmMulligan {
                player: PlayerId::new(1),
                recycle: vec![],
            },
        ];
        for intent in script {
            m.apply(intent).unwrap();
        }
        for _ in 0..12 {
            let active = m.active_player();
            m.apply(Intent::AdvancePhase { player: active }).unwrap();
        }
        snapshot::capture(&m).to_json().unwrap()
    };

    assert_eq!(run(42), run(42));
}
