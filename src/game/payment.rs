//! Cost payment and the auto-pay planner
//!
//! Producers are the permanents a player can turn into resources:
//!
//! - **Runes**: exhaust a ready rune for 1 energy, recycle any rune (to the
//!   bottom of the rune deck) for 1 power of its domain. A ready rune may do
//!   both.
//! - **Seals**: ready gear whose only ability is "exhaust: add power".
//!
//! `plan_auto_payment` is a pure search over a copied pool. Nothing is
//! touched until `Match::commit_plan` runs the chosen plan.

use crate::core::{AbilityTiming, CardId, CostSpec, Domain, DomainSet, EffectPrimitive, PlayerId, PowerSource, ResourcePool};
use crate::game::state::Match;
use crate::game::{effect_parser, queries, LogCategory};
use crate::zones::Zone;
use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};

/// What a producer can yield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProducerKind {
    /// Rune in play; `domain` is None for runes without a domain
    Rune { domain: Option<Domain> },
    /// Exhaust for `amount` power of `domain`
    Seal { domain: Domain, amount: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Producer {
    pub card: CardId,
    pub ready: bool,
    pub kind: ProducerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStep {
    /// Exhaust a rune for 1 energy
    ExhaustRune,
    /// Recycle a rune for 1 power of its domain
    RecycleRune(Domain),
    ExhaustSeal(Domain, u32),
}

/// A chosen set of producer activations
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub steps: Vec<(CardId, PaymentStep)>,
    /// Producers permanently consumed (recycled runes)
    pub recycled: usize,
    /// Producers merely exhausted
    pub exhausted: usize,
    pub touched: usize,
    pub runes_touched: usize,
}

impl PaymentPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Lexicographic ranking; lower is better
    fn score(&self) -> (usize, usize, usize, usize) {
        (self.recycled, self.exhausted, self.touched, self.runes_touched)
    }
}

/// Producers available to `player`, runes first then seals, board order
pub fn producers_for(m: &Match, player: PlayerId) -> Vec<Producer> {
    let mut producers = Vec::new();
    for rune in queries::runes_in_play(m, player) {
        if let Ok(card) = m.card(rune) {
            producers.push(Producer {
                card: rune,
                ready: card.ready,
                kind: ProducerKind::Rune {
                    domain: card.definition.domains.first().copied(),
                },
            });
        }
    }
    for gear in queries::gear_in_play(m, player) {
        let Ok(card) = m.card(gear) else { continue };
        if !card.ready {
            continue;
        }
        if let Some((domain, amount)) = seal_output(m, gear) {
            producers.push(Producer {
                card: gear,
                ready: true,
                kind: ProducerKind::Seal { domain, amount },
            });
        }
    }
    producers
}

/// Power a seal produces, if the gear is a seal
fn seal_output(m: &Match, gear: CardId) -> Option<(Domain, u32)> {
    let card = m.card(gear).ok()?;
    let def = &card.definition;
    match effect_parser::parse_trigger(&def.trigger, def) {
        AbilityTiming::Activated { cost, .. } if cost.exhaust && cost.energy == 0 && cost.power == 0 && !cost.kill_self => {}
        _ => return None,
    }
    let clauses = effect_parser::parse_effect(&def.effect);
    match clauses.as_slice() {
        [clause] => match clause.primitive {
            EffectPrimitive::AddPower {
                source: PowerSource::Domain(d),
                amount,
            } => Some((d, amount)),
            EffectPrimitive::AddPower {
                source: PowerSource::SourceDomain,
                amount,
            } => def.domains.first().map(|d| (*d, amount)),
            _ => None,
        },
        _ => None,
    }
}

/// Search for the cheapest way to cover `cost` from `pool` plus producers.
///
/// Enumerates every subset of the first `cap` producers (rune in subset =
/// recycle it, seal in subset = exhaust it), then exhausts ready runes for the
/// remaining energy, preferring runes the plan already touches. Seals take
/// their slots in the bound before runes do. Returns None if no subset pays.
pub fn plan_auto_payment(
    pool: &ResourcePool,
    producers: &[Producer],
    cost: &CostSpec,
    matching: DomainSet,
    cap: usize,
) -> Option<PaymentPlan> {
    let mut ordered: Vec<Producer> = producers
        .iter()
        .filter(|p| matches!(p.kind, ProducerKind::Seal { .. }))
        .copied()
        .collect();
    ordered.extend(
        producers
            .iter()
            .filter(|p| matches!(p.kind, ProducerKind::Rune { .. }))
            .copied(),
    );
    let candidates = &ordered[..ordered.len().min(cap).min(16)];
    let mut best: Option<PaymentPlan> = None;

    for mask in 0u32..(1u32 << candidates.len()) {
        let mut trial = *pool;
        let mut used = vec![false; candidates.len()];
        let mut recycled = 0;
        let mut seals = 0;
        let mut feasible = true;

        for (i, producer) in candidates.iter().enumerate() {
            if mask & (1 << i) == 0 {
                continue;
            }
            match producer.kind {
                ProducerKind::Rune { domain: Some(d) } => {
                    trial.add_power(d, 1);
                    recycled += 1;
                }
                ProducerKind::Rune { domain: None } => {
                    feasible = false;
                    break;
                }
                ProducerKind::Seal { domain, amount } => {
                    if !producer.ready {
                        feasible = false;
                        break;
                    }
                    trial.add_power(domain, amount);
                    seals += 1;
                }
            }
            used[i] = true;
        }
        if !feasible {
            continue;
        }

        // Energy shortfall comes from exhausting ready runes, touched ones first
        let shortfall = cost.energy.saturating_sub(trial.energy) as usize;
        let mut energy_runes: Vec<usize> = Vec::new();
        let ready_runes = candidates
            .iter()
            .enumerate()
            .filter(|(_, p)| p.ready && matches!(p.kind, ProducerKind::Rune { .. }));
        let (touched_first, untouched): (Vec<_>, Vec<_>) = ready_runes.partition(|(i, _)| used[*i]);
        for (i, _) in touched_first.into_iter().chain(untouched) {
            if energy_runes.len() >= shortfall {
                break;
            }
            energy_runes.push(i);
        }
        if energy_runes.len() < shortfall {
            continue;
        }
        trial.add_energy(energy_runes.len() as u32);

        if !trial.can_pay(cost, matching) {
            continue;
        }

        let mut steps = Vec::new();
        for &i in &energy_runes {
            steps.push((candidates[i].card, PaymentStep::ExhaustRune));
        }
        for (i, producer) in candidates.iter().enumerate() {
            if !used[i] {
                continue;
            }
            match producer.kind {
                ProducerKind::Rune { domain: Some(d) } => steps.push((producer.card, PaymentStep::RecycleRune(d))),
                ProducerKind::Seal { domain, amount } => {
                    steps.push((producer.card, PaymentStep::ExhaustSeal(domain, amount)))
                }
                ProducerKind::Rune { domain: None } => {}
            }
        }

        let mut touched_set: Vec<usize> = energy_runes.clone();
        touched_set.extend((0..candidates.len()).filter(|i| used[*i]));
        touched_set.sort_unstable();
        touched_set.dedup();
        let runes_touched = touched_set
            .iter()
            .filter(|i| matches!(candidates[**i].kind, ProducerKind::Rune { .. }))
            .count();

        let plan = PaymentPlan {
            steps,
            recycled,
            exhausted: energy_runes.len() + seals,
            touched: touched_set.len(),
            runes_touched,
        };
        let better = match &best {
            Some(current) => plan.score() < current.score(),
            None => true,
        };
        if better {
            best = Some(plan);
        }
    }
    best
}

impl Match {
    /// Pay a cost from the pool, generating the shortfall with the
    /// auto-pay planner when `auto_pay` is set. On failure nothing changes.
    pub fn pay_cost(&mut self, player: PlayerId, cost: &CostSpec, matching: DomainSet, auto_pay: bool) -> Result<()> {
        let pool = self.player(player)?.pool;
        if pool.can_pay(cost, matching) {
            self.player_mut(player)?.pool.pay(cost, matching)?;
            self.logger.verbose(
                LogCategory::Payment,
                &format!("{} pays {} from pool", self.player_name(player), cost),
            );
            return Ok(());
        }
        if !auto_pay {
            return Err(DuelError::illegal(format!("cannot pay {} from pool {}", cost, pool)));
        }
        let producers = producers_for(self, player);
        let plan = plan_auto_payment(&pool, &producers, cost, matching, self.config.planner_candidate_cap)
            .ok_or_else(|| DuelError::illegal(format!("cannot afford {}", cost)))?;
        self.commit_plan(player, &plan)?;
        self.player_mut(player)?.pool.pay(cost, matching)?;
        self.logger.normal(
            LogCategory::Payment,
            &format!(
                "{} pays {} (auto-pay: {} exhausted, {} recycled)",
                self.player_name(player),
                cost,
                plan.exhausted,
                plan.recycled
            ),
        );
        Ok(())
    }

    /// Apply a plan's producer activations: exhausts first, then recycles
    pub fn commit_plan(&mut self, player: PlayerId, plan: &PaymentPlan) -> Result<()> {
        for (card, step) in &plan.steps {
            match step {
                PaymentStep::ExhaustRune => self.exhaust_rune(player, *card)?,
                PaymentStep::ExhaustSeal(domain, amount) => {
                    let c = self.card_mut(*card)?;
                    if !c.ready {
                        return Err(DuelError::invariant("planned seal is exhausted"));
                    }
                    c.exhaust();
                    self.player_mut(player)?.pool.add_power(*domain, *amount);
                }
                PaymentStep::RecycleRune(_) => {}
            }
        }
        for (card, step) in &plan.steps {
            if let PaymentStep::RecycleRune(_) = step {
                self.recycle_rune(player, *card)?;
            }
        }
        Ok(())
    }

    /// Exhaust a ready rune for 1 energy
    pub fn exhaust_rune(&mut self, player: PlayerId, rune: CardId) -> Result<()> {
        let name = self.describe(rune);
        let card = self.card_mut(rune)?;
        if card.controller != player || card.zone != Zone::Runes {
            return Err(DuelError::illegal(format!("{} is not one of your runes", name)));
        }
        if !card.ready {
            return Err(DuelError::illegal(format!("{} is already exhausted", name)));
        }
        card.exhaust();
        self.player_mut(player)?.pool.add_energy(1);
        self.logger
            .verbose(LogCategory::Payment, &format!("{} exhausted for 1 energy", name));
        Ok(())
    }

    /// Recycle a rune to the bottom of the rune deck for 1 power of its domain
    pub fn recycle_rune(&mut self, player: PlayerId, rune: CardId) -> Result<()> {
        let name = self.describe(rune);
        let domain = {
            let card = self.card(rune)?;
            if card.controller != player || card.zone != Zone::Runes {
                return Err(DuelError::illegal(format!("{} is not one of your runes", name)));
            }
            card.definition
                .domains
                .first()
                .copied()
                .ok_or_else(|| DuelError::illegal(format!("{} has no domain to recycle for", name)))?
        };
        self.move_card_to_bottom(rune, Zone::RuneDeck)?;
        self.player_mut(player)?.pool.add_power(domain, 1);
        self.logger
            .verbose(LogCategory::Payment, &format!("{} recycled for 1 {} power", name, domain));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PowerKind;

    fn rune(id: u32, domain: Domain, ready: bool) -> Producer {
        Producer {
            card: CardId::new(id),
            ready,
            kind: ProducerKind::Rune { domain: Some(domain) },
        }
    }

    fn fury_cost(energy: u32, power: u32) -> CostSpec {
        CostSpec::new(energy, power, DomainSet::single(Domain::Fury))
    }

    #[test]
    fn test_no_plan_needed_when_pool_covers_cost() {
        let pool = ResourcePool::with_energy(2);
        let plan = plan_auto_payment(&pool, &[rune(1, Domain::Fury, true)], &fury_cost(2, 0), DomainSet::empty(), 12)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_energy_from_exhausting_runes() {
        let producers = [rune(1, Domain::Fury, true), rune(2, Domain::Fury, true), rune(3, Domain::Calm, true)];
        let plan =
            plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(2, 0), DomainSet::empty(), 12).unwrap();
        assert_eq!(plan.recycled, 0);
        assert_eq!(plan.exhausted, 2);
        assert_eq!(
            plan.steps,
            vec![
                (CardId::new(1), PaymentStep::ExhaustRune),
                (CardId::new(2), PaymentStep::ExhaustRune)
            ]
        );
    }

    #[test]
    fn test_power_prefers_exhausting_the_recycled_rune() {
        // 1 energy + 1 Fury: exhaust and recycle the same Fury rune
        let producers = [rune(1, Domain::Calm, true), rune(2, Domain::Fury, true)];
        let plan =
            plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(1, 1), DomainSet::empty(), 12).unwrap();
        assert_eq!(plan.recycled, 1);
        assert_eq!(plan.touched, 1, "the recycled rune also supplies the energy");
        assert!(plan.steps.contains(&(CardId::new(2), PaymentStep::ExhaustRune)));
        assert!(plan.steps.contains(&(CardId::new(2), PaymentStep::RecycleRune(Domain::Fury))));
    }

    #[test]
    fn test_seal_preferred_over_recycling() {
        let producers = [
            rune(1, Domain::Fury, true),
            Producer {
                card: CardId::new(5),
                ready: true,
                kind: ProducerKind::Seal {
                    domain: Domain::Fury,
                    amount: 1,
                },
            },
        ];
        let plan =
            plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(0, 1), DomainSet::empty(), 12).unwrap();
        assert_eq!(plan.recycled, 0);
        assert_eq!(plan.steps, vec![(CardId::new(5), PaymentStep::ExhaustSeal(Domain::Fury, 1))]);
    }

    #[test]
    fn test_wrong_domain_cannot_pay() {
        let producers = [rune(1, Domain::Calm, true), rune(2, Domain::Mind, true)];
        assert!(plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(0, 1), DomainSet::empty(), 12).is_none());
    }

    #[test]
    fn test_exhausted_runes_still_recycle() {
        let producers = [rune(1, Domain::Fury, false)];
        let plan =
            plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(0, 1), DomainSet::empty(), 12).unwrap();
        assert_eq!(plan.steps, vec![(CardId::new(1), PaymentStep::RecycleRune(Domain::Fury))]);
        assert!(plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(1, 0), DomainSet::empty(), 12).is_none());
    }

    #[test]
    fn test_candidate_cap_limits_search() {
        let producers = [rune(1, Domain::Fury, true), rune(2, Domain::Fury, true)];
        assert!(plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(2, 0), DomainSet::empty(), 1).is_none());
    }

    #[test]
    fn test_seal_survives_the_candidate_cap() {
        let mut producers: Vec<Producer> = (1..=14).map(|id| rune(id, Domain::Calm, true)).collect();
        producers.push(Producer {
            card: CardId::new(20),
            ready: true,
            kind: ProducerKind::Seal {
                domain: Domain::Fury,
                amount: 1,
            },
        });
        let plan =
            plan_auto_payment(&ResourcePool::new(), &producers, &fury_cost(2, 1), DomainSet::empty(), 12).unwrap();
        assert_eq!(plan.recycled, 0);
        assert!(plan.steps.contains(&(CardId::new(20), PaymentStep::ExhaustSeal(Domain::Fury, 1))));
        assert_eq!(plan.exhausted, 3);
    }

    #[test]
    fn test_matching_extra_uses_card_domains() {
        let producers = [rune(1, Domain::Calm, true), rune(2, Domain::Fury, true)];
        let cost = CostSpec::energy_only(0).with_extra(1, PowerKind::Matching);
        let plan =
            plan_auto_payment(&ResourcePool::new(), &producers, &cost, DomainSet::single(Domain::Fury), 12).unwrap();
        assert_eq!(plan.steps, vec![(CardId::new(2), PaymentStep::RecycleRune(Domain::Fury))]);
    }
}
