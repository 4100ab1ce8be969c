//! Card zones (Hand, Main deck, Discard, Base, Battlefields, etc.)

use crate::core::{BattlefieldId, CardId, PlayerId};
use serde::{Deserialize, Serialize};

/// Where a card currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Hand,
    MainDeck,
    Discard,
    Banishment,
    Legend,
    Champion,
    /// The player's base (units and gear not at a battlefield)
    Base,
    Battlefield(BattlefieldId),
    /// Hidden facedown slot at a battlefield
    Facedown(BattlefieldId),
    /// The battlefield card itself
    Location(BattlefieldId),
    Runes,
    RuneDeck,
    /// On the chain while a play waits to resolve
    Chain,
}

impl Zone {
    /// Units and gear in these zones are "in play"
    pub fn is_in_play(&self) -> bool {
        matches!(self, Zone::Base | Zone::Battlefield(_) | Zone::Runes)
    }

    /// Zones whose contents the opponent may not see
    pub fn is_secret(&self) -> bool {
        matches!(self, Zone::Hand | Zone::MainDeck | Zone::RuneDeck | Zone::Facedown(_))
    }

    pub fn battlefield(&self) -> Option<BattlefieldId> {
        match self {
            Zone::Battlefield(bf) => Some(*bf),
            _ => None,
        }
    }
}

/// An ordered list of cards belonging to one player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardZone {
    pub zone_type: Zone,

    pub owner: PlayerId,

    /// Cards in this zone (for decks the top is the end of the vec)
    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub fn remove(&mut self, card_id: CardId) -> bool {
        if let Some(pos) = self.cards.iter().position(|&id| id == card_id) {
            // Order matters for deterministic iteration, so no swap_remove
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Draw from top
    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    pub fn add_to_bottom(&mut self, card_id: CardId) {
        self.cards.insert(0, card_id);
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

/// Collection of the per-player zones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub hand: CardZone,
    pub main_deck: CardZone,
    pub discard: CardZone,
    pub banishment: CardZone,
    pub base: CardZone,
    pub runes: CardZone,
    pub rune_deck: CardZone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            hand: CardZone::new(Zone::Hand, player_id),
            main_deck: CardZone::new(Zone::MainDeck, player_id),
            discard: CardZone::new(Zone::Discard, player_id),
            banishment: CardZone::new(Zone::Banishment, player_id),
            base: CardZone::new(Zone::Base, player_id),
            runes: CardZone::new(Zone::Runes, player_id),
            rune_deck: CardZone::new(Zone::RuneDeck, player_id),
        }
    }

    pub fn get_zone(&self, zone: Zone) -> Option<&CardZone> {
        match zone {
            Zone::Hand => Some(&self.hand),
            Zone::MainDeck => Some(&self.main_deck),
            Zone::Discard => Some(&self.discard),
            Zone::Banishment => Some(&self.banishment),
            Zone::Base => Some(&self.base),
            Zone::Runes => Some(&self.runes),
            Zone::RuneDeck => Some(&self.rune_deck),
            _ => None,
        }
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Hand => Some(&mut self.hand),
            Zone::MainDeck => Some(&mut self.main_deck),
            Zone::Discard => Some(&mut self.discard),
            Zone::Banishment => Some(&mut self.banishment),
            Zone::Base => Some(&mut self.base),
            Zone::Runes => Some(&mut self.runes),
            Zone::RuneDeck => Some(&mut self.rune_deck),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_zone() {
        let player_id = PlayerId::new(1);
        let mut zone = CardZone::new(Zone::Hand, player_id);

        assert_eq!(zone.len(), 0);
        assert!(zone.is_empty());

        let card1 = CardId::new(10);
        let card2 = CardId::new(11);

        zone.add(card1);
        zone.add(card2);

        assert_eq!(zone.len(), 2);
        assert!(zone.contains(card1));
        assert!(zone.remove(card1));
        assert!(!zone.remove(card1), "Removing twice must report absence");
        assert_eq!(zone.cards, vec![card2]);
    }

    #[test]
    fn test_deck_operations() {
        let mut deck = CardZone::new(Zone::MainDeck, PlayerId::new(0));

        let card1 = CardId::new(10);
        let card2 = CardId::new(11);
        let card3 = CardId::new(12);

        deck.add(card1); // Bottom
        deck.add(card2);
        deck.add(card3); // Top

        assert_eq!(deck.peek_top(), Some(card3));
        assert_eq!(deck.draw_top(), Some(card3));
        deck.add_to_bottom(card3);
        assert_eq!(deck.cards, vec![card3, card1, card2]);
        assert_eq!(deck.draw_top(), Some(card2));
    }

    #[test]
    fn test_zone_classification() {
        let bf = BattlefieldId::new(1);
        assert!(Zone::Base.is_in_play());
        assert!(Zone::Battlefield(bf).is_in_play());
        assert!(!Zone::Facedown(bf).is_in_play());
        assert!(Zone::Facedown(bf).is_secret());
        assert_eq!(Zone::Battlefield(bf).battlefield(), Some(bf));

        let zones = PlayerZones::new(PlayerId::new(0));
        assert_eq!(zones.get_zone(Zone::RuneDeck).map(|z| z.zone_type), Some(Zone::RuneDeck));
        assert!(zones.get_zone(Zone::Chain).is_none());
    }
}
