//! Serializable views of a match
//!
//! `capture` produces the complete picture (for replays and debugging);
//! `redacted_for` produces what one player is allowed to see: the opponent's
//! hand and facedown cards and the order of every deck are reduced to counts.

use crate::core::{BattlefieldId, CardId, CardType, ChainItemId, DecisionId, PlayerId, ResourcePool, TargetRef};
use crate::game::chain::{ChainItemKind, Window};
use crate::game::combat::CombatState;
use crate::game::decision::DecisionKind;
use crate::game::state::Match;
use crate::game::{queries, LogEntry, Phase};
use crate::zones::{CardZone, Zone};
use serde::{Deserialize, Serialize};

/// Bumped whenever the snapshot layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

/// A list zone: always its size, its cards only when visible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneView {
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardId>>,
}

impl ZoneView {
    fn open(zone: &CardZone) -> Self {
        ZoneView {
            count: zone.len(),
            cards: Some(zone.cards.clone()),
        }
    }

    fn closed(zone: &CardZone) -> Self {
        ZoneView {
            count: zone.len(),
            cards: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub pool: ResourcePool,
    pub hand: ZoneView,
    pub main_deck: ZoneView,
    pub discard: ZoneView,
    pub banishment: ZoneView,
    pub base: ZoneView,
    pub runes: ZoneView,
    pub rune_deck: ZoneView,
    pub legend: Option<CardId>,
    pub champion: Option<CardId>,
    pub mulligan_done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacedownView {
    pub occupied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlefieldView {
    pub id: BattlefieldId,
    pub controller: Option<PlayerId>,
    pub contested_by: Option<PlayerId>,
    pub units: [Vec<CardId>; 2],
    pub facedown: [FacedownView; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: CardId,
    pub name: String,
    pub card_type: CardType,
    pub owner: PlayerId,
    pub controller: PlayerId,
    pub zone: Zone,
    pub ready: bool,
    /// Might including buffs, gear and combat bonuses
    pub might: u32,
    pub damage: u32,
    pub buffed: bool,
    pub stunned: bool,
    pub keywords: Vec<String>,
    pub attached_to: Option<CardId>,
    pub is_token: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainItemView {
    pub id: ChainItemId,
    pub controller: PlayerId,
    pub source: CardId,
    pub name: String,
    pub kind: ChainItemKind,
    pub effect_text: String,
    pub targets: Option<Vec<TargetRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionView {
    pub id: DecisionId,
    pub player: PlayerId,
    pub prompt: String,
    /// Withheld from the other player when it lists hand cards
    pub kind: Option<DecisionKind>,
}

/// Everything a client needs to render a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub version: u32,
    /// `None` for an unredacted capture
    pub viewer: Option<PlayerId>,
    pub turn: u32,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub priority: PlayerId,
    pub winner: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub battlefields: Vec<BattlefieldView>,
    pub cards: Vec<CardView>,
    pub chain: Vec<ChainItemView>,
    pub window: Option<Window>,
    pub combat: Option<CombatState>,
    pub decision: Option<DecisionView>,
    pub pending_contests: Vec<BattlefieldId>,
    pub log: Vec<LogEntry>,
}

impl MatchSnapshot {
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Full, unredacted snapshot
pub fn capture(m: &Match) -> MatchSnapshot {
    build(m, None)
}

/// Snapshot as seen by `viewer`
pub fn redacted_for(m: &Match, viewer: PlayerId) -> MatchSnapshot {
    build(m, Some(viewer))
}

fn card_visible(m: &Match, card: CardId, viewer: Option<PlayerId>) -> bool {
    let Some(viewer) = viewer else { return true };
    let Ok(c) = m.card(card) else { return false };
    match c.zone {
        Zone::MainDeck | Zone::RuneDeck => false,
        Zone::Hand | Zone::Facedown(_) => c.owner == viewer,
        _ => true,
    }
}

fn build(m: &Match, viewer: Option<PlayerId>) -> MatchSnapshot {
    let sees_own = |owner: PlayerId| viewer.map_or(true, |v| v == owner);

    let players = m
        .players
        .iter()
        .map(|p| {
            let zones = &p.zones;
            let deck_view = |zone: &CardZone| {
                if viewer.is_none() {
                    ZoneView::open(zone)
                } else {
                    ZoneView::closed(zone)
                }
            };
            PlayerView {
                id: p.id,
                name: p.name.to_string(),
                score: p.score,
                pool: p.pool,
                hand: if sees_own(p.id) {
                    ZoneView::open(&zones.hand)
                } else {
                    ZoneView::closed(&zones.hand)
                },
                main_deck: deck_view(&zones.main_deck),
                discard: ZoneView::open(&zones.discard),
                banishment: ZoneView::open(&zones.banishment),
                base: ZoneView::open(&zones.base),
                runes: ZoneView::open(&zones.runes),
                rune_deck: deck_view(&zones.rune_deck),
                legend: p.legend,
                champion: p.champion,
                mulligan_done: p.mulligan_done,
            }
        })
        .collect();

    let battlefields = m
        .battlefields
        .iter()
        .map(|bf| {
            let facedown = |seat: usize| FacedownView {
                occupied: bf.facedown[seat].is_some(),
                card: bf.facedown[seat].filter(|c| card_visible(m, *c, viewer)),
            };
            BattlefieldView {
                id: bf.id,
                controller: bf.controller,
                contested_by: bf.contested_by,
                units: bf.units.clone(),
                facedown: [facedown(0), facedown(1)],
            }
        })
        .collect();

    let cards = m
        .cards
        .ids_sorted()
        .into_iter()
        .filter(|id| card_visible(m, *id, viewer))
        .filter_map(|id| {
            let c = m.card(id).ok()?;
            Some(CardView {
                id,
                name: c.name().to_string(),
                card_type: c.card_type(),
                owner: c.owner,
                controller: c.controller,
                zone: c.zone,
                ready: c.ready,
                might: if c.is_unit() {
                    queries::effective_might(m, id)
                } else {
                    c.definition.might
                },
                damage: c.damage,
                buffed: c.buff > 0,
                stunned: queries::is_stunned(m, id),
                keywords: queries::keywords(m, id).iter().map(|k| k.to_string()).collect(),
                attached_to: c.attached_to,
                is_token: c.is_token,
            })
        })
        .collect();

    let chain = m
        .chain
        .items
        .iter()
        .map(|item| ChainItemView {
            id: item.id,
            controller: item.controller,
            source: item.source,
            name: item.source_def.name.to_string(),
            kind: item.kind.clone(),
            effect_text: item.effect_text.clone(),
            targets: item.targets.clone(),
        })
        .collect();

    let decision = m.decision.as_ref().map(|d| {
        let hides_cards = matches!(d.kind, DecisionKind::HandCard { .. });
        DecisionView {
            id: d.id,
            player: d.player,
            prompt: d.prompt.clone(),
            kind: if hides_cards && !sees_own(d.player) {
                None
            } else {
                Some(d.kind.clone())
            },
        }
    });

    MatchSnapshot {
        version: SNAPSHOT_VERSION,
        viewer,
        turn: m.turn_number(),
        phase: m.phase(),
        active_player: m.active_player(),
        priority: m.priority,
        winner: m.winner,
        players,
        battlefields,
        cards,
        chain,
        window: m.window,
        combat: m.combat.clone(),
        decision,
        pending_contests: m.pending_contests.iter().copied().collect(),
        log: m.logger.logs().iter().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, Keyword};
    use crate::game::MatchConfig;

    fn setup() -> (Match, CardId, CardId, CardId) {
        let mut m = Match::new_two_player("Alice", "Bob", MatchConfig::default());
        let spell = CardDefinition::new("s", "Secret", CardType::Spell)
            .with_keyword(Keyword::Hidden)
            .into_shared();
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        let bob_hand = m.create_card(spell.clone(), p1, Zone::Hand).unwrap();
        let alice_deck = m.create_card(spell.clone(), p0, Zone::MainDeck).unwrap();
        let bf = BattlefieldId::new(0);
        m.battlefield_mut(bf).unwrap().controller = Some(p1);
        let hidden = m.create_card(spell, p1, Zone::Facedown(bf)).unwrap();
        (m, bob_hand, alice_deck, hidden)
    }

    #[test]
    fn test_capture_shows_everything() {
        let (m, bob_hand, alice_deck, hidden) = setup();
        let snap = capture(&m);
        assert_eq!(snap.version, SNAPSHOT_VERSION);
        assert_eq!(snap.cards.len(), 3);
        assert!(snap.cards.iter().any(|c| c.id == bob_hand));
        assert!(snap.cards.iter().any(|c| c.id == alice_deck));
        assert_eq!(snap.battlefields[0].facedown[1].card, Some(hidden));
    }

    #[test]
    fn test_redaction_hides_opponent_secrets() {
        let (m, bob_hand, alice_deck, hidden) = setup();
        let snap = redacted_for(&m, PlayerId::new(0));

        assert!(!snap.cards.iter().any(|c| c.id == bob_hand));
        assert!(!snap.cards.iter().any(|c| c.id == alice_deck), "deck order is hidden even from its owner");
        assert!(!snap.cards.iter().any(|c| c.id == hidden));
        assert_eq!(snap.players[1].hand.count, 1);
        assert_eq!(snap.players[1].hand.cards, None);
        assert_eq!(snap.players[0].main_deck.cards, None);
        assert!(snap.battlefields[0].facedown[1].occupied);
        assert_eq!(snap.battlefields[0].facedown[1].card, None);
    }

    #[test]
    fn test_owner_sees_own_hidden_card() {
        let (m, bob_hand, _, hidden) = setup();
        let snap = redacted_for(&m, PlayerId::new(1));
        assert!(snap.cards.iter().any(|c| c.id == bob_hand));
        assert_eq!(snap.battlefields[0].facedown[1].card, Some(hidden));
        assert_eq!(snap.players[1].hand.cards, Some(vec![bob_hand]));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let (m, ..) = setup();
        let snap = redacted_for(&m, PlayerId::new(0));
        let json = snap.to_json().unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
