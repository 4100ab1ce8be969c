//! Effect executor
//!
//! Runs classified clauses against the match, starting at the progress
//! cursor. A clause that needs a player's choice first looks for a recorded
//! answer under its key; without one it returns `AwaitingDecision` and the
//! cursor stays put, so resuming re-enters the same clause and never repeats
//! completed ones. Handlers gather every answer they need before mutating.

use crate::core::{
    Amount, BattlefieldId, CardDefinition, CardId, CardType, Destination, Domain, Duration, EffectPrimitive,
    PlayerId, PowerSource, Selector, Side, TargetRef,
};
use crate::game::decision::{DecisionAnswer, DecisionKind, DecisionRequest, ResolutionProgress};
use crate::game::state::Match;
use crate::game::{queries, LogCategory};
use crate::zones::Zone;
use crate::core::EffectClause;
use crate::Result;
use std::sync::Arc;

/// Per-clause trace, compiled out without the verbose-logging feature
macro_rules! trace_clause {
    ($m:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $m.logger.verbose(LogCategory::Chain, &format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$m;
        }
    };
}

/// Everything a clause may need to know about who resolves it and from where
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub controller: PlayerId,
    pub source: Option<CardId>,
    pub source_def: Option<Arc<CardDefinition>>,
    /// Battlefield the ability originates from ("here")
    pub origin: Option<BattlefieldId>,
    /// Played with Accelerate
    pub boosted: bool,
    /// Answer decisions with defaults instead of suspending
    pub auto_decide: bool,
}

impl ResolveContext {
    fn source_name(&self) -> String {
        self.source_def
            .as_ref()
            .map(|d| d.name.to_string())
            .unwrap_or_else(|| "effect".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// At least one clause changed the match
    Resolved,
    /// Nothing happened (no legal cards, declined, unsupported)
    NoOp,
    AwaitingDecision(DecisionRequest),
}

enum Step {
    Done { changed: bool },
    Await(DecisionRequest),
}

/// Look up or request an answer
fn answer_for(
    progress: &mut ResolutionProgress,
    ctx: &ResolveContext,
    clause: usize,
    suffix: &str,
    kind: DecisionKind,
    prompt: String,
) -> std::result::Result<DecisionAnswer, DecisionRequest> {
    let key = progress.key(clause, suffix);
    if let Some(answer) = progress.answers.get(&key) {
        return Ok(*answer);
    }
    if ctx.auto_decide {
        let answer = kind.default_answer();
        progress.answers.insert(key, answer);
        return Ok(answer);
    }
    Err(DecisionRequest {
        player: ctx.controller,
        prompt,
        kind,
        key,
    })
}

/// Resolve clauses from `progress.next_clause` onward
pub fn resolve_effect(
    m: &mut Match,
    ctx: &ResolveContext,
    clauses: &[EffectClause],
    targets: &[TargetRef],
    progress: &mut ResolutionProgress,
) -> Result<Outcome> {
    progress.started = true;
    while progress.next_clause < clauses.len() {
        let idx = progress.next_clause;
        let clause = &clauses[idx];
        trace_clause!(m, "{} clause {}: {}", ctx.source_name(), idx, clause.text);
        match execute(m, ctx, idx, &clause.primitive, &clause.text, targets, progress)? {
            Step::Done { changed } => {
                progress.any_effect |= changed;
                progress.next_clause += 1;
            }
            Step::Await(request) => return Ok(Outcome::AwaitingDecision(request)),
        }
        if m.is_over() {
            break;
        }
    }
    Ok(if progress.any_effect {
        Outcome::Resolved
    } else {
        Outcome::NoOp
    })
}

fn side_ok(m: &Match, card: CardId, side: Side, controller: PlayerId) -> bool {
    let Ok(c) = m.card(card) else { return false };
    match side {
        Side::Any => true,
        Side::Friendly => c.controller == controller,
        Side::Enemy => c.controller != controller,
    }
}

fn in_play(m: &Match, card: CardId) -> bool {
    m.card(card).is_ok_and(|c| c.is_in_play())
}

/// Cards a selector picks right now
pub fn select(m: &Match, ctx: &ResolveContext, selector: Selector, targets: &[TargetRef]) -> Vec<CardId> {
    let card_targets: Vec<CardId> = targets.iter().filter_map(|t| t.card()).collect();
    let units_where = |cards: Vec<CardId>, side: Side| -> Vec<CardId> {
        cards
            .into_iter()
            .filter(|c| side_ok(m, *c, side, ctx.controller))
            .collect()
    };
    match selector {
        Selector::Targets => card_targets.into_iter().filter(|c| in_play(m, *c)).collect(),
        Selector::FirstTarget => card_targets.first().copied().filter(|c| in_play(m, *c)).into_iter().collect(),
        Selector::SecondTarget => card_targets.get(1).copied().filter(|c| in_play(m, *c)).into_iter().collect(),
        Selector::This => ctx.source.filter(|c| in_play(m, *c)).into_iter().collect(),
        Selector::AllHere(side) => match ctx.origin {
            Some(bf) => units_where(queries::all_units_at(m, bf), side),
            None => Vec::new(),
        },
        Selector::AllAtTargetBattlefield(side) => match targets.iter().find_map(|t| t.battlefield()) {
            Some(bf) => units_where(queries::all_units_at(m, bf), side),
            None => Vec::new(),
        },
        Selector::AllUnits(side) => units_where(queries::all_units_in_play(m), side),
    }
}

fn amount_value(m: &Match, ctx: &ResolveContext, amount: Amount, targets: &[TargetRef]) -> u32 {
    match amount {
        Amount::Fixed(n) => n,
        Amount::SourceMight => match ctx.source {
            Some(src) if in_play(m, src) => queries::effective_might(m, src),
            _ => ctx.source_def.as_ref().map(|d| d.might).unwrap_or(0),
        },
        Amount::FirstTargetMight => targets
            .iter()
            .find_map(|t| t.card())
            .map(|c| queries::effective_might(m, c))
            .unwrap_or(0),
    }
}

fn token_definition(name: &str, card_type: CardType, might: u32) -> Arc<CardDefinition> {
    let id = format!("token-{}", crate::core::types::normalize_name(name).replace(' ', "-"));
    CardDefinition::new(id, name, card_type)
        .with_might(might)
        .with_tag("token")
        .into_shared()
}

#[allow(clippy::too_many_arguments)]
fn execute(
    m: &mut Match,
    ctx: &ResolveContext,
    idx: usize,
    primitive: &EffectPrimitive,
    text: &str,
    targets: &[TargetRef],
    progress: &mut ResolutionProgress,
) -> Result<Step> {
    let who = m.player_name(ctx.controller);
    let source = ctx.source_name();

    let step = match primitive {
        EffectPrimitive::Optional(inner) => {
            let answer = match answer_for(
                progress,
                ctx,
                idx,
                "may",
                DecisionKind::YesNo,
                format!("{}: {}?", source, text.trim_start_matches("you may ")),
            ) {
                Ok(a) => a,
                Err(request) => return Ok(Step::Await(request)),
            };
            if answer == DecisionAnswer::YesNo(true) {
                return execute(m, ctx, idx, inner, text, targets, progress);
            }
            m.logger.event(&format!("{} declines: {}", who, text));
            Step::Done { changed: false }
        }

        EffectPrimitive::Draw { count } => {
            let drawn = m.draw_cards(ctx.controller, *count)?;
            Step::Done {
                changed: !drawn.is_empty(),
            }
        }

        EffectPrimitive::DrawUpTo { max } => {
            let n = match answer_for(
                progress,
                ctx,
                idx,
                "count",
                DecisionKind::Number { min: 0, max: *max },
                format!("{}: draw how many (0-{})?", source, max),
            ) {
                Ok(DecisionAnswer::Number(n)) => n,
                Ok(_) => 0,
                Err(request) => return Ok(Step::Await(request)),
            };
            let drawn = m.draw_cards(ctx.controller, n)?;
            Step::Done {
                changed: !drawn.is_empty(),
            }
        }

        EffectPrimitive::Discard { count } => {
            let hand = m.player(ctx.controller)?.zones.hand.cards.clone();
            let needed = (*count as usize).min(hand.len());
            let mut chosen: Vec<CardId> = Vec::new();
            for i in 0..needed {
                let options: Vec<CardId> = hand.iter().copied().filter(|c| !chosen.contains(c)).collect();
                match answer_for(
                    progress,
                    ctx,
                    idx,
                    &format!("discard:{}", i),
                    DecisionKind::HandCard { options },
                    format!("{}: choose a card to discard", source),
                ) {
                    Ok(DecisionAnswer::Card(card)) => chosen.push(card),
                    Ok(_) => {}
                    Err(request) => return Ok(Step::Await(request)),
                }
            }
            for card in &chosen {
                if m.player(ctx.controller)?.zones.hand.contains(*card) {
                    m.move_card(*card, Zone::Discard)?;
                    m.logger.event(&format!("{} discards {}", who, m.describe(*card)));
                }
            }
            Step::Done {
                changed: !chosen.is_empty(),
            }
        }

        EffectPrimitive::AddEnergy { amount } => {
            m.player_mut(ctx.controller)?.pool.add_energy(*amount);
            m.logger.event(&format!("{} adds {} energy", who, amount));
            Step::Done { changed: *amount > 0 }
        }

        EffectPrimitive::AddPower { source: power, amount } => {
            let fixed = match power {
                PowerSource::Domain(d) => Some(*d),
                PowerSource::SourceDomain => ctx.source_def.as_ref().and_then(|d| d.domains.first().copied()),
                PowerSource::AnyDomain => None,
            };
            let domain = match fixed {
                Some(d) => d,
                None => {
                    let names: Vec<String> = Domain::ALL
                        .iter()
                        .enumerate()
                        .map(|(i, d)| format!("{}={}", i, d))
                        .collect();
                    match answer_for(
                        progress,
                        ctx,
                        idx,
                        "domain",
                        DecisionKind::Number { min: 0, max: 5 },
                        format!("{}: choose a domain ({})", source, names.join(", ")),
                    ) {
                        Ok(DecisionAnswer::Number(n)) => Domain::from_index(n as usize).unwrap_or(Domain::Fury),
                        Ok(_) => Domain::Fury,
                        Err(request) => return Ok(Step::Await(request)),
                    }
                }
            };
            m.player_mut(ctx.controller)?.pool.add_power(domain, *amount);
            m.logger.event(&format!("{} adds {} {} power", who, amount, domain));
            Step::Done { changed: *amount > 0 }
        }

        EffectPrimitive::ChannelRunes { count, exhausted } => {
            let runes = m.channel_runes(ctx.controller, *count, *exhausted)?;
            Step::Done {
                changed: !runes.is_empty(),
            }
        }

        EffectPrimitive::CreateUnitToken { count, might, name, at } => {
            let def = token_definition(name, CardType::Unit, *might);
            let zone = match (at, ctx.origin) {
                (Destination::Here, Some(bf)) => Zone::Battlefield(bf),
                _ => Zone::Base,
            };
            for _ in 0..*count {
                let token = m.create_token(def.clone(), ctx.controller, zone)?;
                m.card_mut(token)?.exhaust();
            }
            if let Zone::Battlefield(bf) = zone {
                m.note_arrival(bf, ctx.controller)?;
            }
            m.logger.event(&format!("{} plays {} {} token(s)", who, count, name));
            Step::Done { changed: *count > 0 }
        }

        EffectPrimitive::CreateGearToken { count, name } => {
            let def = token_definition(name, CardType::Gear, 0);
            for _ in 0..*count {
                m.create_token(def.clone(), ctx.controller, Zone::Base)?;
            }
            m.logger.event(&format!("{} creates {} {} token(s)", who, count, name));
            Step::Done { changed: *count > 0 }
        }

        EffectPrimitive::GrantKeyword {
            selector,
            keyword,
            duration,
        } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                m.card_mut(*card)?.granted.push((keyword.clone(), *duration));
                m.logger
                    .event(&format!("{} gains {}{}", m.describe(*card), keyword, duration_suffix(*duration)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::RemoveKeyword {
            selector,
            keyword,
            duration,
        } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                m.card_mut(*card)?.removed.push((keyword.clone(), *duration));
                m.logger
                    .event(&format!("{} loses {}{}", m.describe(*card), keyword, duration_suffix(*duration)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Stun { selector } => {
            let cards = select(m, ctx, *selector, targets);
            let until = m.turn_number() + 1;
            for card in &cards {
                m.card_mut(*card)?.stunned_until = Some(until);
                m.logger.event(&format!("{} is stunned", m.describe(*card)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Ready { selector } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                m.card_mut(*card)?.ready_up();
                m.logger.event(&format!("{} is readied", m.describe(*card)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Exhaust { selector } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                m.card_mut(*card)?.exhaust();
                m.logger.event(&format!("{} is exhausted", m.describe(*card)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Buff { selector } => {
            let cards = select(m, ctx, *selector, targets);
            let mut buffed = Vec::new();
            for card in &cards {
                if m.card_mut(*card)?.add_buff() {
                    m.logger.event(&format!("{} is buffed", m.describe(*card)));
                    buffed.push(*card);
                }
            }
            done_with(m, &buffed, text)
        }

        EffectPrimitive::Might {
            selector,
            delta,
            duration,
        } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                let c = m.card_mut(*card)?;
                match duration {
                    Duration::ThisTurn => c.temp_might += delta,
                    Duration::Permanent => c.might_bonus += delta,
                }
                m.logger.event(&format!(
                    "{} gets {:+} might{}",
                    m.describe(*card),
                    delta,
                    duration_suffix(*duration)
                ));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Move { selector, to } => {
            let cards: Vec<CardId> = select(m, ctx, *selector, targets)
                .into_iter()
                .filter(|c| m.card(*c).is_ok_and(|card| card.is_unit()))
                .collect();
            let destination = match (to, ctx.origin) {
                (Destination::Base, _) => Some(Zone::Base),
                (Destination::Here, Some(bf)) => Some(Zone::Battlefield(bf)),
                (Destination::Here, None) => None,
            };
            let mut moved = Vec::new();
            if let Some(zone) = destination {
                for card in cards {
                    if m.card(card)?.zone == zone {
                        continue;
                    }
                    m.relocate_unit(card, zone)?;
                    m.logger.event(&format!("{} moves to {}", m.describe(card), zone_label(zone)));
                    moved.push(card);
                }
                if let (Zone::Battlefield(bf), false) = (zone, moved.is_empty()) {
                    for player in m.player_ids() {
                        if moved.iter().any(|c| m.card(*c).is_ok_and(|card| card.controller == player)) {
                            m.note_arrival(bf, player)?;
                        }
                    }
                }
            }
            done_with(m, &moved, text)
        }

        EffectPrimitive::ReturnToHand { selector } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                let name = m.describe(*card);
                m.move_card(*card, Zone::Hand)?;
                m.logger.event(&format!("{} returns to its owner's hand", name));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Kill { selector, max_might } => {
            let cards: Vec<CardId> = select(m, ctx, *selector, targets)
                .into_iter()
                .filter(|c| max_might.map_or(true, |max| queries::effective_might(m, *c) <= max))
                .collect();
            for card in &cards {
                m.kill_card(*card)?;
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Banish { selector } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                let name = m.describe(*card);
                m.move_card(*card, Zone::Banishment)?;
                m.logger.event(&format!("{} is banished", name));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Damage { selector, amount } => {
            let value = amount_value(m, ctx, *amount, targets);
            let cards: Vec<CardId> = select(m, ctx, *selector, targets)
                .into_iter()
                .filter(|c| m.card(*c).is_ok_and(|card| card.is_unit()))
                .collect();
            for card in &cards {
                m.card_mut(*card)?.damage += value;
                m.logger
                    .event(&format!("{} deals {} to {}", source, value, m.describe(*card)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Heal { selector } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                m.card_mut(*card)?.damage = 0;
                m.logger.event(&format!("{} is healed", m.describe(*card)));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Fight => {
            let units: Vec<CardId> = select(m, ctx, Selector::Targets, targets)
                .into_iter()
                .filter(|c| m.card(*c).is_ok_and(|card| card.is_unit()))
                .collect();
            match units.as_slice() {
                [a, b] => {
                    let (might_a, might_b) = (queries::effective_might(m, *a), queries::effective_might(m, *b));
                    m.card_mut(*b)?.damage += might_a;
                    m.card_mut(*a)?.damage += might_b;
                    m.logger.event(&format!(
                        "{} ({}) and {} ({}) fight",
                        m.describe(*a),
                        might_a,
                        m.describe(*b),
                        might_b
                    ));
                    Step::Done { changed: true }
                }
                _ => {
                    m.logger
                        .verbose(LogCategory::Fizzle, &format!("{}: fight needs two units", source));
                    Step::Done { changed: false }
                }
            }
        }

        EffectPrimitive::Attach => {
            let cards = select(m, ctx, Selector::Targets, targets);
            let unit = cards.iter().copied().find(|c| m.card(*c).is_ok_and(|card| card.is_unit()));
            let gear = cards.iter().copied().find(|c| m.card(*c).is_ok_and(|card| card.is_gear()));
            match (unit, gear) {
                (Some(unit), Some(gear)) => {
                    m.attach_gear(gear, unit)?;
                    Step::Done { changed: true }
                }
                _ => Step::Done { changed: false },
            }
        }

        EffectPrimitive::Score { points } => {
            m.award_points(ctx.controller, *points, &source)?;
            Step::Done { changed: *points > 0 }
        }

        EffectPrimitive::RecycleToDeck { selector } => {
            let cards = select(m, ctx, *selector, targets);
            for card in &cards {
                let name = m.describe(*card);
                m.move_card_to_bottom(*card, Zone::MainDeck)?;
                m.logger.event(&format!("{} is recycled into its owner's deck", name));
            }
            done_with(m, &cards, text)
        }

        EffectPrimitive::Unsupported(clause) => {
            m.logger
                .unsupported(&format!("{}: no handler for \"{}\"", source, clause));
            Step::Done { changed: false }
        }
    };
    Ok(step)
}

/// A selector-driven clause finished; an empty selection is a silent no-op
fn done_with(m: &Match, cards: &[CardId], text: &str) -> Step {
    if cards.is_empty() {
        m.logger
            .verbose(LogCategory::Event, &format!("\"{}\" affects nothing", text));
    }
    Step::Done {
        changed: !cards.is_empty(),
    }
}

fn duration_suffix(duration: Duration) -> &'static str {
    match duration {
        Duration::ThisTurn => " this turn",
        Duration::Permanent => "",
    }
}

fn zone_label(zone: Zone) -> String {
    match zone {
        Zone::Battlefield(bf) => bf.to_string(),
        Zone::Base => "base".to_string(),
        other => format!("{:?}", other),
    }
}
