//! Read-only questions about a match
//!
//! Everything here is a pure function of the `Match`. Rules code calls these
//! instead of reading card fields directly so that keyword grants, equipment
//! and combat roles are always folded in the same way.

use crate::core::{BattlefieldId, CardId, Keyword, PlayerId};
use crate::game::state::Match;
use crate::zones::Zone;
use smallvec::SmallVec;

/// Role of a unit in the combat currently being fought
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatRole {
    Attacker,
    Defender,
}

pub fn combat_role(m: &Match, card: CardId) -> Option<CombatRole> {
    let combat = m.combat.as_ref()?;
    let c = m.card(card).ok()?;
    if c.zone != Zone::Battlefield(combat.battlefield) {
        return None;
    }
    if c.controller == combat.attacker {
        Some(CombatRole::Attacker)
    } else if c.controller == combat.defender {
        Some(CombatRole::Defender)
    } else {
        None
    }
}

/// Keywords of a card including grants, removals and attached gear
pub fn keywords(m: &Match, card: CardId) -> SmallVec<[Keyword; 4]> {
    let Ok(c) = m.card(card) else {
        return SmallVec::new();
    };
    let mut result = c.own_keywords();
    for gear in &c.attachments {
        if let Ok(g) = m.card(*gear) {
            for kw in g.own_keywords() {
                if !matches!(kw, Keyword::Equip(_)) {
                    result.push(kw);
                }
            }
        }
    }
    result
}

pub fn has_keyword(m: &Match, card: CardId, keyword: &Keyword) -> bool {
    keywords(m, card).iter().any(|k| k.same_kind(keyword))
}

/// Sum of all instances of a numeric keyword (Assault 1 + Assault 2 = 3)
pub fn keyword_amount(m: &Match, card: CardId, keyword: &Keyword) -> u32 {
    keywords(m, card)
        .iter()
        .filter(|k| k.same_kind(keyword))
        .map(|k| k.amount())
        .sum()
}

/// Might without combat-role keywords
pub fn base_might(m: &Match, card: CardId) -> u32 {
    let Ok(c) = m.card(card) else {
        return 0;
    };
    let mut might = c.definition.might as i64 + c.buff as i64 + c.might_bonus as i64 + c.temp_might as i64;
    for gear in &c.attachments {
        if let Ok(g) = m.card(*gear) {
            might += g.definition.might as i64 + g.might_bonus as i64 + g.temp_might as i64;
        }
    }
    might.max(0) as u32
}

/// Combat strength: base might plus Assault when attacking or Shield when
/// defending in the current combat
pub fn effective_might(m: &Match, card: CardId) -> u32 {
    let might = base_might(m, card);
    match combat_role(m, card) {
        Some(CombatRole::Attacker) => might + keyword_amount(m, card, &Keyword::Assault(0)),
        Some(CombatRole::Defender) => might + keyword_amount(m, card, &Keyword::Shield(0)),
        None => might,
    }
}

/// Damage still needed to kill a unit (at least 1)
pub fn lethal_remaining(m: &Match, card: CardId) -> u32 {
    let damage = m.card(card).map(|c| c.damage).unwrap_or(0);
    effective_might(m, card).saturating_sub(damage).max(1)
}

pub fn is_stunned(m: &Match, card: CardId) -> bool {
    m.card(card).is_ok_and(|c| c.is_stunned(m.turn_number()))
}

/// Where a unit is: its base or a battlefield
pub fn unit_location(m: &Match, card: CardId) -> Option<Zone> {
    let c = m.card(card).ok()?;
    match c.zone {
        Zone::Base | Zone::Battlefield(_) if c.is_unit() => Some(c.zone),
        _ => None,
    }
}

pub fn units_at(m: &Match, battlefield: BattlefieldId, player: PlayerId) -> Vec<CardId> {
    m.battlefield(battlefield)
        .map(|bf| bf.units_of(player).to_vec())
        .unwrap_or_default()
}

/// Units of both players at a battlefield, seat 0 first
pub fn all_units_at(m: &Match, battlefield: BattlefieldId) -> Vec<CardId> {
    m.player_ids()
        .into_iter()
        .flat_map(|p| units_at(m, battlefield, p))
        .collect()
}

pub fn units_in_base(m: &Match, player: PlayerId) -> Vec<CardId> {
    m.player(player)
        .map(|p| {
            p.zones
                .base
                .cards
                .iter()
                .copied()
                .filter(|id| m.card(*id).is_ok_and(|c| c.is_unit()))
                .collect()
        })
        .unwrap_or_default()
}

/// Units a player controls, base first then battlefields in order
pub fn units_in_play(m: &Match, player: PlayerId) -> Vec<CardId> {
    let mut units = units_in_base(m, player);
    for bf in BattlefieldId::all() {
        units.extend(units_at(m, bf, player));
    }
    units
}

pub fn all_units_in_play(m: &Match) -> Vec<CardId> {
    m.player_ids()
        .into_iter()
        .flat_map(|p| units_in_play(m, p))
        .collect()
}

/// Gear a player controls: loose in base and attached to units
pub fn gear_in_play(m: &Match, player: PlayerId) -> Vec<CardId> {
    let mut gear: Vec<CardId> = m
        .player(player)
        .map(|p| {
            p.zones
                .base
                .cards
                .iter()
                .copied()
                .filter(|id| m.card(*id).is_ok_and(|c| c.is_gear()))
                .collect()
        })
        .unwrap_or_default();
    for unit in units_in_play(m, player) {
        if let Ok(c) = m.card(unit) {
            gear.extend(c.attachments.iter().copied());
        }
    }
    gear
}

pub fn runes_in_play(m: &Match, player: PlayerId) -> Vec<CardId> {
    m.player(player)
        .map(|p| p.zones.runes.cards.clone())
        .unwrap_or_default()
}

pub fn ready_runes(m: &Match, player: PlayerId) -> Vec<CardId> {
    runes_in_play(m, player)
        .into_iter()
        .filter(|id| m.card(*id).is_ok_and(|c| c.ready))
        .collect()
}

pub fn controls_battlefield(m: &Match, player: PlayerId, battlefield: BattlefieldId) -> bool {
    m.battlefield(battlefield).is_ok_and(|bf| bf.is_controlled_by(player))
}

pub fn controlled_battlefields(m: &Match, player: PlayerId) -> Vec<BattlefieldId> {
    BattlefieldId::all()
        .into_iter()
        .filter(|bf| controls_battlefield(m, player, *bf))
        .collect()
}

/// Units that deal damage in combat (stunned units deal none)
pub fn damage_dealers(m: &Match, battlefield: BattlefieldId, player: PlayerId) -> Vec<CardId> {
    units_at(m, battlefield, player)
        .into_iter()
        .filter(|id| !is_stunned(m, *id))
        .collect()
}
