//! Target requirements inferred from ability text
//!
//! `infer` scans normalized effect text for target phrases ("an enemy unit
//! here", "up to two friendly units", "a gear") and combines them into one
//! `TargetRequirement`. Wording it cannot pin down comes back `Ambiguous`;
//! callers treat that as "no targets" and report the text as unsupported.

use crate::core::{BattlefieldId, CardId, Keyword, PlayerId, Side, TargetRef};
use crate::game::effect_parser::{normalize, parse_number};
use crate::game::queries;
use crate::game::state::Match;
use crate::zones::Zone;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCount {
    Exactly(u32),
    UpTo(u32),
}

impl TargetCount {
    pub fn max(&self) -> u32 {
        match self {
            TargetCount::Exactly(n) | TargetCount::UpTo(n) => *n,
        }
    }

    pub fn min(&self) -> u32 {
        match self {
            TargetCount::Exactly(n) => *n,
            TargetCount::UpTo(_) => 0,
        }
    }
}

/// Where a targeted unit must be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitZone {
    Anywhere,
    /// At the battlefield the ability originates from
    Here,
    AnyBattlefield,
    Base,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRequirement {
    None,
    Units {
        count: TargetCount,
        side: Side,
        zone: UnitZone,
        /// Only units with at most this much might
        #[serde(default)]
        max_might: Option<u32>,
    },
    Gear {
        side: Side,
    },
    Battlefield,
    /// A unit and a gear with the same controller, in that order
    UnitAndGear,
    /// A friendly unit then an enemy unit
    FriendlyAndEnemyUnit,
}

impl TargetRequirement {
    /// Requirement that can be satisfied with no targets
    pub fn allows_empty(&self) -> bool {
        match self {
            TargetRequirement::None => true,
            TargetRequirement::Units { count, .. } => count.min() == 0,
            _ => false,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == TargetRequirement::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inferred {
    Known(TargetRequirement),
    Ambiguous(String),
}

impl Inferred {
    /// Fail closed: ambiguous text targets nothing
    pub fn requirement(&self) -> TargetRequirement {
        match self {
            Inferred::Known(req) => req.clone(),
            Inferred::Ambiguous(_) => TargetRequirement::None,
        }
    }
}

/// Who is choosing, and from where
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetContext {
    pub controller: PlayerId,
    pub origin: Option<BattlefieldId>,
    pub source: Option<CardId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Noun {
    Unit,
    Gear,
    Battlefield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Phrase {
    count: TargetCount,
    side: Side,
    noun: Noun,
    zone: UnitZone,
    max_might: Option<u32>,
}

fn noun_of(word: &str) -> Option<Noun> {
    match word {
        "unit" | "units" => Some(Noun::Unit),
        "gear" | "gears" => Some(Noun::Gear),
        "battlefield" | "battlefields" => Some(Noun::Battlefield),
        _ => None,
    }
}

fn side_of(word: &str) -> Option<Side> {
    match word {
        "friendly" => Some(Side::Friendly),
        "enemy" => Some(Side::Enemy),
        _ => None,
    }
}

/// Find target phrases in normalized text
fn scan_phrases(text: &str) -> Result<Vec<Phrase>, String> {
    let words: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.' || c == ';')
        .filter(|w| !w.is_empty())
        .collect();
    let mut phrases = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];

        // "all/each ... unit(s)" is an area, but "at a battlefield" after it
        // still targets a battlefield
        if matches!(word, "all" | "each" | "every") {
            let mut j = i + 1;
            while j < words.len() && noun_of(words[j]).is_none() {
                j += 1;
            }
            i = j + 1;
            if words.get(i..i + 3) == Some(&["at", "a", "battlefield"][..]) {
                phrases.push(Phrase {
                    count: TargetCount::Exactly(1),
                    side: Side::Any,
                    noun: Noun::Battlefield,
                    zone: UnitZone::Anywhere,
                    max_might: None,
                });
                i += 3;
            }
            continue;
        }

        if word == "another" {
            return Err("'another' target wording".to_string());
        }

        let (count, mut j) = if word == "up" && words.get(i + 1) == Some(&"to") {
            match words.get(i + 2).and_then(|w| parse_number(w)) {
                Some(n) => (TargetCount::UpTo(n), i + 3),
                None => {
                    i += 1;
                    continue;
                }
            }
        } else if word == "target" {
            (TargetCount::Exactly(1), i + 1)
        } else if let Some(n) = parse_number(word) {
            (TargetCount::Exactly(n), i + 1)
        } else {
            i += 1;
            continue;
        };

        let mut side = Side::Any;
        if let Some(s) = words.get(j).and_then(|w| side_of(w)) {
            side = s;
            j += 1;
        }
        let Some(noun) = words.get(j).and_then(|w| noun_of(w)) else {
            i += 1;
            continue;
        };
        j += 1;

        if matches!(words.get(j), Some(&"token") | Some(&"tokens")) {
            i = j + 1;
            continue;
        }
        if words.get(j) == Some(&"or") && words.get(j + 1).and_then(|w| noun_of(w)).is_some() {
            return Err(format!("'{} or {}' target wording", words[j - 1], words[j + 1]));
        }

        let mut zone = UnitZone::Anywhere;
        let mut max_might = None;
        loop {
            match words.get(j..) {
                Some(["here", ..]) => {
                    zone = UnitZone::Here;
                    j += 1;
                }
                Some(["at", "a", "battlefield", ..]) => {
                    zone = UnitZone::AnyBattlefield;
                    j += 3;
                }
                Some(["in", "your", "base", ..]) | Some(["at", "your", "base", ..]) => {
                    zone = UnitZone::Base;
                    j += 3;
                }
                Some(["you", "control", ..]) => {
                    side = Side::Friendly;
                    j += 2;
                }
                Some(["with", n, "might", "or", "less", ..]) if parse_number(n).is_some() => {
                    max_might = parse_number(n);
                    j += 5;
                }
                _ => break,
            }
        }

        phrases.push(Phrase {
            count,
            side,
            noun,
            zone,
            max_might,
        });
        i = j;
    }
    Ok(phrases)
}

/// Infer what an ability needs targeted from its effect text
pub fn infer(text: &str, _ctx: &TargetContext) -> Inferred {
    let normalized = normalize(text);
    let phrases = match scan_phrases(&normalized) {
        Ok(p) => p,
        Err(reason) => return Inferred::Ambiguous(reason),
    };

    let units: Vec<&Phrase> = phrases.iter().filter(|p| p.noun == Noun::Unit).collect();
    let gear: Vec<&Phrase> = phrases.iter().filter(|p| p.noun == Noun::Gear).collect();
    let fields: Vec<&Phrase> = phrases.iter().filter(|p| p.noun == Noun::Battlefield).collect();

    let requirement = match (units.as_slice(), gear.as_slice(), fields.as_slice()) {
        ([], [], []) => TargetRequirement::None,
        ([unit], [], []) => TargetRequirement::Units {
            count: unit.count,
            side: unit.side,
            zone: unit.zone,
            max_might: unit.max_might,
        },
        ([], [g], []) if g.count == TargetCount::Exactly(1) => TargetRequirement::Gear { side: g.side },
        ([], [], [f]) if f.count == TargetCount::Exactly(1) => TargetRequirement::Battlefield,
        ([unit], [g], []) if unit.count == TargetCount::Exactly(1) && g.count == TargetCount::Exactly(1) => {
            TargetRequirement::UnitAndGear
        }
        ([a, b], [], [])
            if a.count == TargetCount::Exactly(1)
                && b.count == TargetCount::Exactly(1)
                && a.side == Side::Friendly
                && b.side == Side::Enemy =>
        {
            TargetRequirement::FriendlyAndEnemyUnit
        }
        _ => {
            return Inferred::Ambiguous(format!(
                "{} unit, {} gear and {} battlefield phrases",
                units.len(),
                gear.len(),
                fields.len()
            ))
        }
    };
    Inferred::Known(requirement)
}

fn side_matches(side: Side, controller: PlayerId, ctx: &TargetContext) -> bool {
    match side {
        Side::Any => true,
        Side::Friendly => controller == ctx.controller,
        Side::Enemy => controller != ctx.controller,
    }
}

/// One card is a legal unit target for the given filters
fn unit_ok(m: &Match, card: CardId, side: Side, zone: UnitZone, ctx: &TargetContext) -> bool {
    let Ok(c) = m.card(card) else {
        return false;
    };
    if !c.is_unit() || !side_matches(side, c.controller, ctx) {
        return false;
    }
    match (zone, c.zone) {
        (UnitZone::Anywhere, Zone::Base | Zone::Battlefield(_)) => true,
        (UnitZone::Here, Zone::Battlefield(bf)) => ctx.origin == Some(bf),
        (UnitZone::AnyBattlefield, Zone::Battlefield(_)) => true,
        (UnitZone::Base, Zone::Base) => true,
        _ => false,
    }
}

fn might_ok(m: &Match, card: CardId, max_might: Option<u32>) -> bool {
    max_might.map_or(true, |max| queries::effective_might(m, card) <= max)
}

fn gear_ok(m: &Match, card: CardId, side: Side, ctx: &TargetContext) -> bool {
    m.card(card)
        .is_ok_and(|c| c.is_gear() && c.is_in_play() && side_matches(side, c.controller, ctx))
}

fn distinct(targets: &[TargetRef]) -> bool {
    let mut seen = targets.to_vec();
    seen.sort();
    seen.dedup();
    seen.len() == targets.len()
}

/// Whether a target list satisfies the requirement right now
pub fn validate(req: &TargetRequirement, targets: &[TargetRef], m: &Match, ctx: &TargetContext) -> bool {
    if !distinct(targets) {
        return false;
    }
    match req {
        TargetRequirement::None => targets.is_empty(),
        TargetRequirement::Units {
            count,
            side,
            zone,
            max_might,
        } => {
            let n = targets.len() as u32;
            n >= count.min()
                && n <= count.max()
                && targets.iter().all(|t| {
                    t.card()
                        .is_some_and(|c| unit_ok(m, c, *side, *zone, ctx) && might_ok(m, c, *max_might))
                })
        }
        TargetRequirement::Gear { side } => match targets {
            [TargetRef::Card(g)] => gear_ok(m, *g, *side, ctx),
            _ => false,
        },
        TargetRequirement::Battlefield => matches!(targets, [TargetRef::Battlefield(_)]),
        TargetRequirement::UnitAndGear => match targets {
            [TargetRef::Card(u), TargetRef::Card(g)] => {
                unit_ok(m, *u, Side::Any, UnitZone::Anywhere, ctx)
                    && gear_ok(m, *g, Side::Any, ctx)
                    && m.card(*u).ok().map(|c| c.controller) == m.card(*g).ok().map(|c| c.controller)
            }
            _ => false,
        },
        TargetRequirement::FriendlyAndEnemyUnit => match targets {
            [TargetRef::Card(a), TargetRef::Card(b)] => {
                unit_ok(m, *a, Side::Friendly, UnitZone::Anywhere, ctx)
                    && unit_ok(m, *b, Side::Enemy, UnitZone::Anywhere, ctx)
            }
            _ => false,
        },
    }
}

/// Drop card targets that changed zone since they were chosen. A card that
/// left play and came back is a different object and no longer the target.
pub fn drop_stale(targets: &[TargetRef], stamps: &[(CardId, u32)], m: &Match) -> Vec<TargetRef> {
    targets
        .iter()
        .copied()
        .filter(|t| match t.card() {
            None => true,
            Some(c) => match stamps.iter().find(|(id, _)| *id == c) {
                Some((_, generation)) => m.card(c).is_ok_and(|card| card.generation == *generation),
                None => m.card(c).is_ok(),
            },
        })
        .collect()
}

/// Targets still legal at resolution. "Up to" requirements keep the legal
/// subset; any other requirement keeps all targets or none (None = fizzle).
pub fn retain_legal(
    req: &TargetRequirement,
    targets: &[TargetRef],
    m: &Match,
    ctx: &TargetContext,
) -> Option<Vec<TargetRef>> {
    match req {
        TargetRequirement::Units {
            count: TargetCount::UpTo(_),
            side,
            zone,
            max_might,
        } => Some(
            targets
                .iter()
                .copied()
                .filter(|t| {
                    t.card()
                        .is_some_and(|c| unit_ok(m, c, *side, *zone, ctx) && might_ok(m, c, *max_might))
                })
                .collect(),
        ),
        _ => validate(req, targets, m, ctx).then(|| targets.to_vec()),
    }
}

/// Every card or battlefield that could fill some slot of the requirement
pub fn candidates(req: &TargetRequirement, m: &Match, ctx: &TargetContext) -> Vec<TargetRef> {
    let units = queries::all_units_in_play(m);
    let gear: Vec<CardId> = m
        .player_ids()
        .into_iter()
        .flat_map(|p| queries::gear_in_play(m, p))
        .collect();
    match req {
        TargetRequirement::None => Vec::new(),
        TargetRequirement::Units {
            side, zone, max_might, ..
        } => units
            .into_iter()
            .filter(|u| unit_ok(m, *u, *side, *zone, ctx) && might_ok(m, *u, *max_might))
            .map(TargetRef::Card)
            .collect(),
        TargetRequirement::Gear { side } => gear
            .into_iter()
            .filter(|g| gear_ok(m, *g, *side, ctx))
            .map(TargetRef::Card)
            .collect(),
        TargetRequirement::Battlefield => BattlefieldId::all().into_iter().map(TargetRef::Battlefield).collect(),
        TargetRequirement::UnitAndGear => units.into_iter().chain(gear).map(TargetRef::Card).collect(),
        TargetRequirement::FriendlyAndEnemyUnit => units.into_iter().map(TargetRef::Card).collect(),
    }
}

/// The only legal target list, if the choice is forced
pub fn forced_targets(req: &TargetRequirement, m: &Match, ctx: &TargetContext) -> Option<Vec<TargetRef>> {
    match req {
        TargetRequirement::None => Some(Vec::new()),
        TargetRequirement::Units { count, .. } => {
            let legal = candidates(req, m, ctx);
            match count {
                TargetCount::Exactly(n) if legal.len() as u32 == *n => Some(legal),
                TargetCount::UpTo(_) if legal.is_empty() => Some(Vec::new()),
                _ => None,
            }
        }
        TargetRequirement::Gear { .. } => {
            let legal = candidates(req, m, ctx);
            (legal.len() == 1).then_some(legal)
        }
        TargetRequirement::FriendlyAndEnemyUnit => {
            let friendly = candidates(
                &TargetRequirement::Units {
                    count: TargetCount::Exactly(1),
                    side: Side::Friendly,
                    zone: UnitZone::Anywhere,
                    max_might: None,
                },
                m,
                ctx,
            );
            let enemy = candidates(
                &TargetRequirement::Units {
                    count: TargetCount::Exactly(1),
                    side: Side::Enemy,
                    zone: UnitZone::Anywhere,
                    max_might: None,
                },
                m,
                ctx,
            );
            match (friendly.as_slice(), enemy.as_slice()) {
                ([a], [b]) => Some(vec![*a, *b]),
                _ => None,
            }
        }
        TargetRequirement::Battlefield | TargetRequirement::UnitAndGear => None,
    }
}

/// No legal choice exists at all for a mandatory requirement
pub fn is_unsatisfiable(req: &TargetRequirement, m: &Match, ctx: &TargetContext) -> bool {
    match req {
        TargetRequirement::Units { count, .. } => (candidates(req, m, ctx).len() as u32) < count.min(),
        TargetRequirement::Gear { .. } => candidates(req, m, ctx).is_empty(),
        TargetRequirement::FriendlyAndEnemyUnit => {
            let units = candidates(req, m, ctx);
            let has = |side| {
                units
                    .iter()
                    .any(|t| t.card().is_some_and(|c| unit_ok(m, c, side, UnitZone::Anywhere, ctx)))
            };
            !(has(Side::Friendly) && has(Side::Enemy))
        }
        TargetRequirement::UnitAndGear => {
            let gear = candidates(&TargetRequirement::Gear { side: Side::Any }, m, ctx);
            gear.is_empty()
        }
        TargetRequirement::None | TargetRequirement::Battlefield => false,
    }
}

/// Extra power an opponent pays to target cards with Deflect
pub fn deflect_tax(m: &Match, targets: &[TargetRef], player: PlayerId) -> u32 {
    targets
        .iter()
        .filter_map(|t| t.card())
        .filter(|c| m.card(*c).is_ok_and(|card| card.controller != player))
        .map(|c| queries::keyword_amount(m, c, &Keyword::Deflect(0)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, CardType};
    use crate::game::MatchConfig;

    fn ctx(origin: Option<BattlefieldId>) -> TargetContext {
        TargetContext {
            controller: PlayerId::new(0),
            origin,
            source: None,
        }
    }

    fn req(text: &str) -> TargetRequirement {
        match infer(text, &ctx(None)) {
            Inferred::Known(r) => r,
            Inferred::Ambiguous(reason) => panic!("{:?} was ambiguous: {}", text, reason),
        }
    }

    #[test]
    fn test_infer_shapes() {
        assert_eq!(req("Draw 2."), TargetRequirement::None);
        assert_eq!(
            req("Deal 3 to an enemy unit here."),
            TargetRequirement::Units {
                count: TargetCount::Exactly(1),
                side: Side::Enemy,
                zone: UnitZone::Here,
                max_might: None,
            }
        );
        assert_eq!(
            req("Stun up to two units at a battlefield."),
            TargetRequirement::Units {
                count: TargetCount::UpTo(2),
                side: Side::Any,
                zone: UnitZone::AnyBattlefield,
                max_might: None,
            }
        );
        assert_eq!(
            req("Ready a unit you control."),
            TargetRequirement::Units {
                count: TargetCount::Exactly(1),
                side: Side::Friendly,
                zone: UnitZone::Anywhere,
                max_might: None,
            }
        );
        assert_eq!(req("Kill a gear."), TargetRequirement::Gear { side: Side::Any });
        assert_eq!(req("Deal 1 to all units at a battlefield."), TargetRequirement::Battlefield);
        assert_eq!(req("Attach a gear to a unit."), TargetRequirement::UnitAndGear);
        assert_eq!(
            req("Choose a friendly unit and an enemy unit. They fight."),
            TargetRequirement::FriendlyAndEnemyUnit
        );
        assert_eq!(req("Play a 1 might Recruit unit token here."), TargetRequirement::None);
        assert_eq!(req("Create a Gold gear token."), TargetRequirement::None);
        assert_eq!(req("Deal 1 to each enemy unit here."), TargetRequirement::None);
    }

    #[test]
    fn test_infer_fails_closed() {
        assert!(matches!(
            infer("Deal 2 to a unit. Deal 1 to another unit.", &ctx(None)),
            Inferred::Ambiguous(_)
        ));
        assert!(matches!(infer("Kill a unit or gear.", &ctx(None)), Inferred::Ambiguous(_)));
        assert_eq!(
            infer("Kill a unit or gear.", &ctx(None)).requirement(),
            TargetRequirement::None
        );
    }

    fn board() -> (Match, CardId, CardId, CardId) {
        let mut m = Match::new_two_player("Alice", "Bob", MatchConfig::default());
        let def = CardDefinition::new("u", "Unit", CardType::Unit).with_might(2).into_shared();
        let bf = BattlefieldId::new(0);
        let mine = m.create_card(def.clone(), PlayerId::new(0), Zone::Base).unwrap();
        let theirs_here = m.create_card(def.clone(), PlayerId::new(1), Zone::Battlefield(bf)).unwrap();
        let theirs_base = m.create_card(def, PlayerId::new(1), Zone::Base).unwrap();
        (m, mine, theirs_here, theirs_base)
    }

    #[test]
    fn test_validate_side_and_zone() {
        let (m, mine, here, base) = board();
        let enemy_here = TargetRequirement::Units {
            count: TargetCount::Exactly(1),
            side: Side::Enemy,
            zone: UnitZone::Here,
            max_might: None,
        };
        let c = ctx(Some(BattlefieldId::new(0)));
        assert!(validate(&enemy_here, &[TargetRef::Card(here)], &m, &c));
        assert!(!validate(&enemy_here, &[TargetRef::Card(base)], &m, &c));
        assert!(!validate(&enemy_here, &[TargetRef::Card(mine)], &m, &c));
        assert!(!validate(&enemy_here, &[], &m, &c));
        assert_eq!(forced_targets(&enemy_here, &m, &c), Some(vec![TargetRef::Card(here)]));
    }

    #[test]
    fn test_might_limit_filters_targets() {
        let (m, _, here, base) = board();
        let small = req("Kill a unit with 1 might or less.");
        assert_eq!(
            small,
            TargetRequirement::Units {
                count: TargetCount::Exactly(1),
                side: Side::Any,
                zone: UnitZone::Anywhere,
                max_might: Some(1),
            }
        );
        assert!(!validate(&small, &[TargetRef::Card(here)], &m, &ctx(None)));
        assert!(candidates(&small, &m, &ctx(None)).is_empty());
        assert!(is_unsatisfiable(&small, &m, &ctx(None)));

        let two = req("Kill a unit with two might or less.");
        assert!(validate(&two, &[TargetRef::Card(base)], &m, &ctx(None)));
        assert_eq!(candidates(&two, &m, &ctx(None)).len(), 3);
    }

    #[test]
    fn test_stale_target_dropped_after_reentry() {
        let (mut m, mine, here, _) = board();
        let targets = [TargetRef::Card(mine), TargetRef::Card(here)];
        let stamps: Vec<(CardId, u32)> = [mine, here]
            .iter()
            .map(|c| (*c, m.card(*c).unwrap().generation))
            .collect();
        assert_eq!(drop_stale(&targets, &stamps, &m), targets.to_vec());

        m.move_card(here, Zone::Hand).unwrap();
        m.move_card(here, Zone::Base).unwrap();
        assert_eq!(drop_stale(&targets, &stamps, &m), vec![TargetRef::Card(mine)]);
    }

    #[test]
    fn test_duplicates_rejected() {
        let (m, _, here, _) = board();
        let two = TargetRequirement::Units {
            count: TargetCount::UpTo(2),
            side: Side::Any,
            zone: UnitZone::Anywhere,
            max_might: None,
        };
        assert!(!validate(&two, &[TargetRef::Card(here), TargetRef::Card(here)], &m, &ctx(None)));
        assert!(validate(&two, &[], &m, &ctx(None)));
    }

    #[test]
    fn test_retain_legal_after_zone_change() {
        let (mut m, mine, here, _) = board();
        let up_to = TargetRequirement::Units {
            count: TargetCount::UpTo(2),
            side: Side::Any,
            zone: UnitZone::Anywhere,
            max_might: None,
        };
        let exactly = TargetRequirement::Units {
            count: TargetCount::Exactly(2),
            side: Side::Any,
            zone: UnitZone::Anywhere,
            max_might: None,
        };
        let targets = [TargetRef::Card(mine), TargetRef::Card(here)];
        m.move_card(here, Zone::Hand).unwrap();

        assert_eq!(
            retain_legal(&up_to, &targets, &m, &ctx(None)),
            Some(vec![TargetRef::Card(mine)])
        );
        assert_eq!(retain_legal(&exactly, &targets, &m, &ctx(None)), None);
    }

    #[test]
    fn test_deflect_tax_only_for_enemy_targets() {
        let (mut m, mine, here, _) = board();
        for id in [mine, here] {
            m.card_mut(id)
                .unwrap()
                .granted
                .push((Keyword::Deflect(1), crate::core::Duration::Permanent));
        }
        assert_eq!(deflect_tax(&m, &[TargetRef::Card(mine)], PlayerId::new(0)), 0);
        assert_eq!(deflect_tax(&m, &[TargetRef::Card(here)], PlayerId::new(0)), 1);
    }
}
