//! Combat at a battlefield
//!
//! A combat showdown closes into damage assignment. Each side's damage is
//! the summed might of its non-stunned units (attackers add Assault,
//! defenders add Shield). A side facing a single recipient is assigned
//! automatically; otherwise its controller splits the damage, Tank units
//! first. Damage lands simultaneously, then control is decided.

use crate::core::{BattlefieldId, CardId, Keyword, PlayerId, TriggerKind};
use crate::game::config::TiePolicy;
use crate::game::state::Match;
use crate::game::{queries, LogCategory};
use crate::zones::Zone;
use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStep {
    /// Showdown window open, spells and abilities still allowed
    Showdown,
    /// Waiting for one or both damage assignments
    DamageAssignment,
    Damage,
    Resolution,
}

/// One combat in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub battlefield: BattlefieldId,
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub step: CombatStep,
    /// Damage each seat deals, fixed when damage assignment begins
    pub damage_pool: [u32; 2],
    /// Damage each seat assigns to opposing units
    pub assignments: [Option<Vec<(CardId, u32)>>; 2],
}

impl CombatState {
    pub fn new(battlefield: BattlefieldId, attacker: PlayerId, defender: PlayerId) -> Self {
        CombatState {
            battlefield,
            attacker,
            defender,
            step: CombatStep::Showdown,
            damage_pool: [0, 0],
            assignments: [None, None],
        }
    }

    pub fn is_participant(&self, player: PlayerId) -> bool {
        player == self.attacker || player == self.defender
    }

    /// Seats that still owe an assignment
    pub fn awaiting(&self) -> Vec<PlayerId> {
        [self.attacker, self.defender]
            .into_iter()
            .filter(|p| self.assignments[p.index()].is_none())
            .collect()
    }
}

impl Match {
    fn combat_ref(&self) -> Result<&CombatState> {
        self.combat
            .as_ref()
            .ok_or_else(|| DuelError::illegal("no combat in progress"))
    }

    fn combat_mut(&mut self) -> Result<&mut CombatState> {
        self.combat
            .as_mut()
            .ok_or_else(|| DuelError::illegal("no combat in progress"))
    }

    /// Total damage `player`'s units deal in the current combat
    pub fn combat_damage_of(&self, player: PlayerId) -> Result<u32> {
        let bf = self.combat_ref()?.battlefield;
        Ok(queries::damage_dealers(self, bf, player)
            .into_iter()
            .map(|u| queries::effective_might(self, u))
            .sum())
    }

    /// Units `player`'s damage can be assigned to
    pub fn combat_recipients(&self, player: PlayerId) -> Result<Vec<CardId>> {
        let bf = self.combat_ref()?.battlefield;
        Ok(queries::units_at(self, bf, self.opponent(player)))
    }

    /// Tank units first, then board order; lethal to each, the rest on the
    /// last recipient
    pub fn auto_assignment(&self, player: PlayerId) -> Result<Vec<(CardId, u32)>> {
        let mut remaining = self.combat_ref()?.damage_pool[player.index()];
        let recipients = self.combat_recipients(player)?;
        let (tanks, others): (Vec<CardId>, Vec<CardId>) = recipients
            .into_iter()
            .partition(|u| queries::has_keyword(self, *u, &Keyword::Tank));
        let order: Vec<CardId> = tanks.into_iter().chain(others).collect();

        let mut assignment: Vec<(CardId, u32)> = Vec::new();
        for unit in &order {
            if remaining == 0 {
                break;
            }
            let amount = queries::lethal_remaining(self, *unit).min(remaining);
            assignment.push((*unit, amount));
            remaining -= amount;
        }
        if remaining > 0 {
            if let Some(last) = order.last() {
                match assignment.iter_mut().find(|(u, _)| u == last) {
                    Some(entry) => entry.1 += remaining,
                    None => assignment.push((*last, remaining)),
                }
            }
        }
        Ok(assignment)
    }

    fn validate_assignment(&self, player: PlayerId, assignment: &[(CardId, u32)]) -> Result<()> {
        let total = self.combat_ref()?.damage_pool[player.index()];
        let recipients = self.combat_recipients(player)?;

        let mut seen: Vec<CardId> = Vec::new();
        for (unit, _) in assignment {
            if !recipients.contains(unit) {
                return Err(DuelError::illegal(format!(
                    "{} is not a legal damage recipient",
                    self.describe(*unit)
                )));
            }
            if seen.contains(unit) {
                return Err(DuelError::illegal(format!("{} is listed twice", self.describe(*unit))));
            }
            seen.push(*unit);
        }

        let assigned: u32 = assignment.iter().map(|(_, amount)| amount).sum();
        if assigned != total {
            return Err(DuelError::illegal(format!(
                "assignment totals {} but {} damage must be assigned",
                assigned, total
            )));
        }

        let amount_for = |unit: CardId| -> u32 {
            assignment
                .iter()
                .filter(|(u, _)| *u == unit)
                .map(|(_, a)| *a)
                .sum()
        };
        let tanks: Vec<CardId> = recipients
            .iter()
            .copied()
            .filter(|u| queries::has_keyword(self, *u, &Keyword::Tank))
            .collect();
        let non_tank_hit = recipients
            .iter()
            .any(|u| !tanks.contains(u) && amount_for(*u) > 0);
        if non_tank_hit {
            if let Some(tank) = tanks
                .iter()
                .find(|t| amount_for(**t) < queries::lethal_remaining(self, **t))
            {
                return Err(DuelError::illegal(format!(
                    "{} has Tank and must be assigned lethal damage first",
                    self.describe(*tank)
                )));
            }
        }
        Ok(())
    }

    /// The showdown closed: fix damage pools and assign what needs no choice
    pub(crate) fn begin_combat_damage(&mut self) -> Result<()> {
        let (attacker, defender) = {
            let combat = self.combat_ref()?;
            (combat.attacker, combat.defender)
        };
        let pools = {
            let mut pools = [0u32; 2];
            pools[attacker.index()] = self.combat_damage_of(attacker)?;
            pools[defender.index()] = self.combat_damage_of(defender)?;
            pools
        };
        {
            let combat = self.combat_mut()?;
            combat.step = CombatStep::DamageAssignment;
            combat.damage_pool = pools;
        }
        self.logger.normal(
            LogCategory::Combat,
            &format!(
                "combat damage: {} deals {}, {} deals {}",
                self.player_name(attacker),
                pools[attacker.index()],
                self.player_name(defender),
                pools[defender.index()]
            ),
        );

        for seat in [attacker, defender] {
            let forced = pools[seat.index()] == 0 || self.combat_recipients(seat)?.len() <= 1;
            if forced || self.config.auto_decisions {
                let assignment = self.auto_assignment(seat)?;
                self.combat_mut()?.assignments[seat.index()] = Some(assignment);
            } else {
                self.logger.normal(
                    LogCategory::Combat,
                    &format!(
                        "{} must assign {} damage",
                        self.player_name(seat),
                        pools[seat.index()]
                    ),
                );
            }
        }
        self.try_apply_combat_damage()
    }

    pub(crate) fn assign_combat_damage(&mut self, player: PlayerId, assignment: Vec<(CardId, u32)>) -> Result<()> {
        self.check_can_assign(player)?;
        self.validate_assignment(player, &assignment)?;
        self.combat_mut()?.assignments[player.index()] = Some(assignment);
        self.logger.normal(
            LogCategory::Combat,
            &format!("{} assigns combat damage", self.player_name(player)),
        );
        self.try_apply_combat_damage()
    }

    pub(crate) fn auto_assign_combat_damage(&mut self, player: PlayerId) -> Result<()> {
        self.check_can_assign(player)?;
        let assignment = self.auto_assignment(player)?;
        self.combat_mut()?.assignments[player.index()] = Some(assignment);
        self.logger.normal(
            LogCategory::Combat,
            &format!("{} auto-assigns combat damage", self.player_name(player)),
        );
        self.try_apply_combat_damage()
    }

    fn check_can_assign(&self, player: PlayerId) -> Result<()> {
        let combat = self.combat_ref()?;
        if combat.step != CombatStep::DamageAssignment {
            return Err(DuelError::illegal("combat is not waiting for damage assignment"));
        }
        if !combat.is_participant(player) {
            return Err(DuelError::illegal("only combatants assign damage"));
        }
        if combat.assignments[player.index()].is_some() {
            return Err(DuelError::illegal(format!(
                "{} already assigned damage",
                self.player_name(player)
            )));
        }
        Ok(())
    }

    fn try_apply_combat_damage(&mut self) -> Result<()> {
        let assignments = {
            let combat = self.combat_ref()?;
            match (&combat.assignments[0], &combat.assignments[1]) {
                (Some(a), Some(b)) => [a.clone(), b.clone()],
                _ => return Ok(()),
            }
        };
        self.combat_mut()?.step = CombatStep::Damage;
        for (unit, amount) in assignments.iter().flatten() {
            if *amount == 0 {
                continue;
            }
            if let Ok(card) = self.card_mut(*unit) {
                card.damage += amount;
            }
            self.logger
                .event(&format!("{} takes {} combat damage", self.describe(*unit), amount));
        }
        self.combat_mut()?.step = CombatStep::Resolution;
        self.resolve_combat()
    }

    fn resolve_combat(&mut self) -> Result<()> {
        self.state_based_check()?;
        let Some(combat) = self.combat.clone() else {
            return Ok(());
        };
        let bf = combat.battlefield;
        let attacking = self.battlefield(bf)?.has_units(combat.attacker);
        let defending = self.battlefield(bf)?.has_units(combat.defender);

        match (attacking, defending) {
            (true, true) => match self.config.tie_policy {
                TiePolicy::RecallAttacker => {
                    self.recall_units(bf, combat.attacker)?;
                    self.retain_control(bf, combat.defender)?;
                }
                TiePolicy::RecallBoth => {
                    self.recall_units(bf, combat.attacker)?;
                    self.recall_units(bf, combat.defender)?;
                    self.logger
                        .normal(LogCategory::Combat, &format!("both sides withdraw from {}", bf));
                }
            },
            (true, false) => self.conquer(bf, combat.attacker)?,
            (false, true) => self.conquer(bf, combat.defender)?,
            (false, false) => {
                self.battlefield_mut(bf)?.controller = None;
                self.logger
                    .normal(LogCategory::Combat, &format!("{} is left empty", bf));
            }
        }

        self.battlefield_mut(bf)?.contested_by = None;
        self.combat = None;
        self.window = None;
        self.priority = self.active_player();
        self.consecutive_passes = 0;
        Ok(())
    }

    /// Send a side's units at `bf` back to base, exhausted
    fn recall_units(&mut self, bf: BattlefieldId, player: PlayerId) -> Result<()> {
        for unit in queries::units_at(self, bf, player) {
            self.relocate_unit(unit, Zone::Base)?;
            self.card_mut(unit)?.exhaust();
            self.logger
                .event(&format!("{} is recalled to base", self.describe(unit)));
        }
        Ok(())
    }

    /// The defender holds after a tie: control without scoring or triggers
    fn retain_control(&mut self, bf: BattlefieldId, player: PlayerId) -> Result<()> {
        self.battlefield_mut(bf)?.controller = Some(player);
        self.logger
            .normal(LogCategory::Combat, &format!("{} holds {}", self.player_name(player), bf));
        Ok(())
    }

    /// `player` takes (or keeps) control. A new controller scores once per
    /// battlefield per turn and fires conquer triggers.
    pub(crate) fn conquer(&mut self, bf: BattlefieldId, player: PlayerId) -> Result<()> {
        if self.battlefield(bf)?.controller == Some(player) {
            self.logger.verbose(
                LogCategory::Combat,
                &format!("{} keeps {}", self.player_name(player), bf),
            );
            return Ok(());
        }
        self.battlefield_mut(bf)?.controller = Some(player);
        self.logger
            .normal(LogCategory::Event, &format!("{} conquers {}", self.player_name(player), bf));

        if self.player_mut(player)?.note_conquest(bf) {
            self.award_points(player, 1, "conquer")?;
        }
        if self.is_over() {
            return Ok(());
        }
        for unit in queries::units_at(self, bf, player) {
            self.queue_triggers(unit, TriggerKind::OnConquer, Some(bf))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, CardType};
    use crate::game::{MatchConfig, Phase};

    fn unit(m: &mut Match, player: u32, might: u32, keywords: &[Keyword], bf: BattlefieldId) -> CardId {
        let mut def = CardDefinition::new("u", "Unit", CardType::Unit).with_might(might);
        for k in keywords {
            def = def.with_keyword(k.clone());
        }
        m.create_card(def.into_shared(), PlayerId::new(player), Zone::Battlefield(bf))
            .unwrap()
    }

    fn setup() -> Match {
        let mut m = Match::new_two_player("Alice", "Bob", MatchConfig::default());
        m.turn.phase = Phase::Action;
        m
    }

    fn start_combat(m: &mut Match, bf: BattlefieldId) {
        m.combat = Some(CombatState::new(bf, PlayerId::new(0), PlayerId::new(1)));
        m.battlefield_mut(bf).unwrap().contested_by = Some(PlayerId::new(0));
        m.begin_combat_damage().unwrap();
    }

    #[test]
    fn test_one_on_one_resolves_without_input() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        let attacker = unit(&mut m, 0, 4, &[], bf);
        let defender = unit(&mut m, 1, 2, &[], bf);
        m.battlefield_mut(bf).unwrap().controller = Some(PlayerId::new(1));

        start_combat(&mut m, bf);

        assert!(m.combat.is_none(), "combat finished");
        assert!(!m.card(defender).unwrap().is_in_play());
        assert_eq!(m.card(attacker).unwrap().damage, 2);
        assert_eq!(m.battlefield(bf).unwrap().controller, Some(PlayerId::new(0)));
        assert_eq!(m.player(PlayerId::new(0)).unwrap().score, 1);
    }

    #[test]
    fn test_two_attackers_wait_for_defender() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        let a1 = unit(&mut m, 0, 2, &[], bf);
        let a2 = unit(&mut m, 0, 2, &[], bf);
        let d = unit(&mut m, 1, 5, &[], bf);

        start_combat(&mut m, bf);

        let combat = m.combat.as_ref().expect("combat waits for an assignment");
        assert_eq!(combat.step, CombatStep::DamageAssignment);
        assert!(combat.assignments[0].is_some(), "attacker has one recipient");
        assert!(combat.assignments[1].is_none());
        assert_eq!(combat.awaiting(), vec![PlayerId::new(1)]);

        let err = m.assign_combat_damage(PlayerId::new(1), vec![(a1, 1)]).unwrap_err();
        assert!(err.is_rejection(), "wrong total is refused");

        m.assign_combat_damage(PlayerId::new(1), vec![(a1, 2), (a2, 3)]).unwrap();
        assert!(m.combat.is_none());
        assert_eq!(m.card(a1).unwrap().zone, Zone::Discard);
        assert_eq!(m.card(a2).unwrap().zone, Zone::Discard);
        assert_eq!(m.card(d).unwrap().damage, 4);
        assert_eq!(m.battlefield(bf).unwrap().controller, Some(PlayerId::new(1)));
    }

    #[test]
    fn test_tie_recalls_attacker() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        let a = unit(&mut m, 0, 2, &[], bf);
        let d = unit(&mut m, 1, 3, &[], bf);
        m.card_mut(d).unwrap().stunned_until = Some(m.turn_number() + 1);
        m.battlefield_mut(bf).unwrap().controller = Some(PlayerId::new(1));

        start_combat(&mut m, bf);

        assert_eq!(m.card(a).unwrap().zone, Zone::Base);
        assert!(!m.card(a).unwrap().ready);
        assert_eq!(m.card(d).unwrap().zone, Zone::Battlefield(bf));
        assert_eq!(m.battlefield(bf).unwrap().controller, Some(PlayerId::new(1)));
        assert_eq!(m.battlefield(bf).unwrap().contested_by, None);
    }

    #[test]
    fn test_tie_on_open_battlefield_scores_nothing() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        let a = unit(&mut m, 0, 2, &[], bf);
        let d = unit(&mut m, 1, 3, &[], bf);
        m.card_mut(d).unwrap().stunned_until = Some(m.turn_number() + 1);
        assert_eq!(m.battlefield(bf).unwrap().controller, None);

        start_combat(&mut m, bf);

        assert_eq!(m.card(a).unwrap().zone, Zone::Base);
        assert_eq!(m.battlefield(bf).unwrap().controller, Some(PlayerId::new(1)));
        assert_eq!(m.player(PlayerId::new(1)).unwrap().score, 0);
        assert_eq!(m.player(PlayerId::new(0)).unwrap().score, 0);
    }

    #[test]
    fn test_tank_must_take_lethal_first() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        unit(&mut m, 0, 4, &[], bf);
        let tank = unit(&mut m, 1, 3, &[Keyword::Tank], bf);
        let other = unit(&mut m, 1, 1, &[], bf);
        m.combat = Some(CombatState::new(bf, PlayerId::new(0), PlayerId::new(1)));
        m.begin_combat_damage().unwrap();

        let err = m
            .assign_combat_damage(PlayerId::new(0), vec![(tank, 2), (other, 2)])
            .unwrap_err();
        assert!(err.to_string().contains("Tank"));

        let auto = m.auto_assignment(PlayerId::new(0)).unwrap();
        assert_eq!(auto, vec![(tank, 3), (other, 1)]);
    }

    #[test]
    fn test_auto_assignment_spills_remainder() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        unit(&mut m, 0, 9, &[], bf);
        let d1 = unit(&mut m, 1, 2, &[], bf);
        let d2 = unit(&mut m, 1, 3, &[], bf);
        m.combat = Some(CombatState::new(bf, PlayerId::new(0), PlayerId::new(1)));
        m.begin_combat_damage().unwrap();
        let auto = m.auto_assignment(PlayerId::new(0)).unwrap();
        assert_eq!(auto, vec![(d1, 2), (d2, 7)]);
    }

    #[test]
    fn test_recall_both_keeps_control() {
        let mut m = setup();
        m.config.tie_policy = TiePolicy::RecallBoth;
        let bf = BattlefieldId::new(1);
        let a = unit(&mut m, 0, 2, &[], bf);
        let d = unit(&mut m, 1, 3, &[], bf);
        m.card_mut(d).unwrap().stunned_until = Some(m.turn_number() + 1);
        m.battlefield_mut(bf).unwrap().controller = Some(PlayerId::new(1));

        start_combat(&mut m, bf);

        assert_eq!(m.card(a).unwrap().zone, Zone::Base);
        assert_eq!(m.card(d).unwrap().zone, Zone::Base);
        assert_eq!(m.card(d).unwrap().damage, 2, "recall keeps damage");
        assert_eq!(m.battlefield(bf).unwrap().controller, Some(PlayerId::new(1)));
        assert_eq!(m.player(PlayerId::new(1)).unwrap().score, 0, "keeping control scores nothing");
    }

    #[test]
    fn test_assault_and_stun_change_damage() {
        let mut m = setup();
        let bf = BattlefieldId::new(0);
        unit(&mut m, 0, 2, &[Keyword::Assault(2)], bf);
        let stunned = unit(&mut m, 1, 5, &[], bf);
        m.card_mut(stunned).unwrap().stunned_until = Some(m.turn_number() + 1);
        m.combat = Some(CombatState::new(bf, PlayerId::new(0), PlayerId::new(1)));
        assert_eq!(m.combat_damage_of(PlayerId::new(0)).unwrap(), 4);
        assert_eq!(m.combat_damage_of(PlayerId::new(1)).unwrap(), 0);
    }
}
