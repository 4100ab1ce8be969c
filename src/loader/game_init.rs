//! Match initialization from decks
//!
//! Creates a match from two deck lists and a card database: every card is
//! instantiated in its starting zone, decks are shuffled with the match's
//! seeded RNG and both players draw their opening hands. The match is left in
//! the mulligan phase.

use crate::core::{BattlefieldId, CardType, PlayerId, PlayerName};
use crate::game::{LogCategory, Match, MatchConfig};
use crate::loader::{CardDatabase, DeckEntry, DeckList};
use crate::zones::Zone;
use crate::{DuelError, Result};

/// Match builder for initializing matches from decks
pub struct MatchInitializer<'a> {
    card_db: &'a CardDatabase,
}

impl<'a> MatchInitializer<'a> {
    /// Create a new match initializer with a card database
    pub fn new(card_db: &'a CardDatabase) -> Self {
        MatchInitializer { card_db }
    }

    /// Initialize a two-player match from two decks; seat 0 goes first
    pub fn init_match(
        &self,
        player0_name: impl Into<PlayerName>,
        player0_deck: &DeckList,
        player1_name: impl Into<PlayerName>,
        player1_deck: &DeckList,
        config: MatchConfig,
    ) -> Result<Match> {
        config.validate()?;
        let mut m = Match::new_two_player(player0_name, player1_name, config);
        let [p0, p1] = m.player_ids();
        let [bf0, bf1] = BattlefieldId::all();

        self.load_deck_into_match(&mut m, p0, player0_deck, bf0)?;
        self.load_deck_into_match(&mut m, p1, player1_deck, bf1)?;

        if m.config.shuffle_decks {
            let rng = &mut m.rng;
            for player in m.players.iter_mut() {
                player.zones.main_deck.shuffle(rng);
                player.zones.rune_deck.shuffle(rng);
            }
        }

        let hand = m.config.starting_hand as u32;
        for player in [p0, p1] {
            m.draw_cards(player, hand)?;
        }
        m.logger.normal(
            LogCategory::Phase,
            &format!("match begins: {} goes first", m.player_name(p0)),
        );
        Ok(m)
    }

    /// Instantiate one player's cards in their starting zones
    fn load_deck_into_match(
        &self,
        m: &mut Match,
        player: PlayerId,
        deck: &DeckList,
        battlefield: BattlefieldId,
    ) -> Result<()> {
        self.create_entries(m, player, &deck.legend, Zone::Legend, Some(CardType::Legend))?;
        self.create_entries(m, player, &deck.champion, Zone::Champion, Some(CardType::Unit))?;
        self.create_entries(
            m,
            player,
            &deck.battlefields,
            Zone::Location(battlefield),
            Some(CardType::Battlefield),
        )?;
        self.create_entries(m, player, &deck.main_deck, Zone::MainDeck, None)?;
        self.create_entries(m, player, &deck.runes, Zone::RuneDeck, Some(CardType::Rune))?;
        Ok(())
    }

    fn create_entries(
        &self,
        m: &mut Match,
        player: PlayerId,
        entries: &[DeckEntry],
        zone: Zone,
        expected: Option<CardType>,
    ) -> Result<()> {
        for entry in entries {
            let definition = self.card_db.require(&entry.card_name)?;
            if let Some(expected) = expected {
                if definition.card_type != expected {
                    return Err(DuelError::InvalidDeckFormat(format!(
                        "{} is a {:?}, not a {:?}",
                        entry.card_name, definition.card_type, expected
                    )));
                }
            }
            // Create the requested number of copies
            for _ in 0..entry.count {
                m.create_card(definition.clone(), player, zone)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, Domain};
    use crate::game::Phase;
    use crate::loader::DeckLoader;

    fn database() -> CardDatabase {
        let mut db = CardDatabase::new();
        db.add_card(CardDefinition::new("u1", "Soldier", CardType::Unit).with_might(2));
        db.add_card(CardDefinition::new("r1", "Fury Rune", CardType::Rune).with_domain(Domain::Fury));
        db.add_card(CardDefinition::new("b1", "The Grand Plaza", CardType::Battlefield));
        db.add_card(CardDefinition::new("l1", "Loose Cannon", CardType::Legend));
        db
    }

    const DECK: &str = r#"
[Legend]
1 Loose Cannon
[Battlefield]
1 The Grand Plaza
[Main]
10 Soldier
[Runes]
6 Fury Rune
"#;

    #[test]
    fn test_init_match_places_cards() {
        let db = database();
        let deck = DeckLoader::parse(DECK).unwrap();
        let m = MatchInitializer::new(&db)
            .init_match("Alice", &deck, "Bob", &deck, MatchConfig::default())
            .unwrap();

        assert_eq!(m.phase(), Phase::Mulligan);
        assert_eq!(m.cards.len(), 36);
        for player in m.players.iter() {
            assert_eq!(player.hand_size(), 4);
            assert_eq!(player.zones.main_deck.len(), 6);
            assert_eq!(player.zones.rune_deck.len(), 6);
            assert!(player.legend.is_some());
        }
        for bf in m.battlefields.iter() {
            let card = bf.card.unwrap();
            assert_eq!(m.card(card).unwrap().zone, Zone::Location(bf.id));
        }
    }

    #[test]
    fn test_same_seed_same_deal() {
        let db = database();
        let deck = DeckLoader::parse(DECK).unwrap();
        let config = MatchConfig {
            seed: 7,
            ..MatchConfig::default()
        };
        let init = MatchInitializer::new(&db);
        let a = init.init_match("A", &deck, "B", &deck, config.clone()).unwrap();
        let b = init.init_match("A", &deck, "B", &deck, config).unwrap();
        assert_eq!(a.players[0].zones.main_deck.cards, b.players[0].zones.main_deck.cards);
        assert_eq!(a.players[1].zones.hand.cards, b.players[1].zones.hand.cards);
    }

    #[test]
    fn test_missing_card_error() {
        let db = CardDatabase::new();
        let deck = DeckLoader::parse("1 Nonexistent Card\n").unwrap();
        let result = MatchInitializer::new(&db).init_match("Alice", &deck, "Bob", &deck, MatchConfig::default());
        assert!(matches!(result, Err(DuelError::InvalidDeckFormat(_))));
    }

    #[test]
    fn test_wrong_section_type_rejected() {
        let db = database();
        let deck = DeckLoader::parse("[Runes]\n1 Soldier\n[Main]\n1 Soldier\n").unwrap();
        assert!(MatchInitializer::new(&db)
            .init_match("Alice", &deck, "Bob", &deck, MatchConfig::default())
            .is_err());
    }
}
