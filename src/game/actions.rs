//! Player intents and the atomic `apply` entry point
//!
//! Every request a player can make is an `Intent`. `Match::apply` checks it,
//! runs it on a working copy of the match, settles the aftermath and commits
//! only if everything succeeded. A rejected intent leaves the match exactly
//! as it was, apart from a `Rejected` log entry.

use crate::core::{
    AbilityTiming, BattlefieldId, CardId, CardType, ChainItemId, CostSpec, DecisionId, DomainSet, Keyword, PlayerId,
    PowerKind, Speed, TargetRef,
};
use crate::game::chain::{ChainItem, ChainItemKind};
use crate::game::decision::{DecisionAnswer, DirectEffect};
use crate::game::effect_parser::{ability_timing, parse_effect};
use crate::game::state::Match;
use crate::game::targeting::{self, Inferred, TargetContext, TargetRequirement};
use crate::game::{queries, LogCategory, Phase};
use crate::zones::Zone;
use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};

/// Where a unit is played or moved: base or a battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Base,
    Battlefield(BattlefieldId),
}

impl Location {
    pub fn zone(&self) -> Zone {
        match self {
            Location::Base => Zone::Base,
            Location::Battlefield(bf) => Zone::Battlefield(*bf),
        }
    }
}

/// A request from a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Intent {
    AdvancePhase {
        player: PlayerId,
    },
    PassPriority {
        player: PlayerId,
    },
    Concede {
        player: PlayerId,
    },
    ConfirmMulligan {
        player: PlayerId,
        #[serde(default)]
        recycle: Vec<CardId>,
    },
    SetChainTargets {
        player: PlayerId,
        item: ChainItemId,
        targets: Vec<TargetRef>,
    },
    AnswerDecision {
        player: PlayerId,
        decision: DecisionId,
        answer: DecisionAnswer,
    },
    PlayCard {
        player: PlayerId,
        card: CardId,
        #[serde(default)]
        destination: Option<Location>,
        #[serde(default)]
        targets: Vec<TargetRef>,
        #[serde(default)]
        accelerate: bool,
        #[serde(default)]
        auto_pay: bool,
    },
    HideCard {
        player: PlayerId,
        card: CardId,
        battlefield: BattlefieldId,
    },
    DeclareMove {
        player: PlayerId,
        from: Location,
        to: Location,
        units: Vec<CardId>,
    },
    ActivateAbility {
        player: PlayerId,
        source: CardId,
        #[serde(default)]
        targets: Vec<TargetRef>,
        #[serde(default)]
        auto_pay: bool,
    },
    EquipGear {
        player: PlayerId,
        gear: CardId,
        unit: CardId,
        #[serde(default)]
        auto_pay: bool,
    },
    AssignCombatDamage {
        player: PlayerId,
        assignment: Vec<(CardId, u32)>,
    },
    AutoAssignCombatDamage {
        player: PlayerId,
    },
    ExhaustRune {
        player: PlayerId,
        rune: CardId,
    },
    RecycleRune {
        player: PlayerId,
        rune: CardId,
    },
}

impl Intent {
    pub fn player(&self) -> PlayerId {
        match self {
            Intent::AdvancePhase { player }
            | Intent::PassPriority { player }
            | Intent::Concede { player }
            | Intent::ConfirmMulligan { player, .. }
            | Intent::SetChainTargets { player, .. }
            | Intent::AnswerDecision { player, .. }
            | Intent::PlayCard { player, .. }
            | Intent::HideCard { player, .. }
            | Intent::DeclareMove { player, .. }
            | Intent::ActivateAbility { player, .. }
            | Intent::EquipGear { player, .. }
            | Intent::AssignCombatDamage { player, .. }
            | Intent::AutoAssignCombatDamage { player }
            | Intent::ExhaustRune { player, .. }
            | Intent::RecycleRune { player, .. } => *player,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Intent::AdvancePhase { .. } => "AdvancePhase",
            Intent::PassPriority { .. } => "PassPriority",
            Intent::Concede { .. } => "Concede",
            Intent::ConfirmMulligan { .. } => "ConfirmMulligan",
            Intent::SetChainTargets { .. } => "SetChainTargets",
            Intent::AnswerDecision { .. } => "AnswerDecision",
            Intent::PlayCard { .. } => "PlayCard",
            Intent::HideCard { .. } => "HideCard",
            Intent::DeclareMove { .. } => "DeclareMove",
            Intent::ActivateAbility { .. } => "ActivateAbility",
            Intent::EquipGear { .. } => "EquipGear",
            Intent::AssignCombatDamage { .. } => "AssignCombatDamage",
            Intent::AutoAssignCombatDamage { .. } => "AutoAssignCombatDamage",
            Intent::ExhaustRune { .. } => "ExhaustRune",
            Intent::RecycleRune { .. } => "RecycleRune",
        }
    }
}

/// Speed printed on a card
fn card_speed(m: &Match, card: CardId) -> Speed {
    if queries::has_keyword(m, card, &Keyword::Reaction) {
        Speed::Reaction
    } else if queries::has_keyword(m, card, &Keyword::Action) {
        Speed::Action
    } else {
        Speed::Normal
    }
}

impl Match {
    /// Apply one intent atomically: either it fully succeeds or the match is
    /// left unchanged and the error is returned
    pub fn apply(&mut self, intent: Intent) -> Result<()> {
        if self.is_over() {
            self.logger
                .rejected(&format!("{} rejected: the game is over", intent.name()));
            return Err(DuelError::GameOver);
        }
        if self.decision.is_some() && !matches!(intent, Intent::AnswerDecision { .. } | Intent::Concede { .. }) {
            let err = DuelError::illegal("a decision is pending; answer it first");
            self.logger.rejected(&format!("{} rejected: {}", intent.name(), err));
            return Err(err);
        }

        let mut working = self.clone();
        let result = working.dispatch(&intent).and_then(|_| working.settle());
        match result {
            Ok(()) => {
                *self = working;
                Ok(())
            }
            Err(err) => {
                self.logger.rejected(&format!(
                    "{} from {} rejected: {}",
                    intent.name(),
                    self.player_name(intent.player()),
                    err
                ));
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, intent: &Intent) -> Result<()> {
        self.player(intent.player())?;
        match intent.clone() {
            Intent::AdvancePhase { player } => self.advance_phase(player),
            Intent::PassPriority { player } => self.pass_priority(player),
            Intent::Concede { player } => {
                self.logger
                    .minimal(LogCategory::Phase, &format!("{} concedes", self.player_name(player)));
                let winner = self.opponent(player);
                self.declare_winner(winner);
                Ok(())
            }
            Intent::ConfirmMulligan { player, recycle } => self.confirm_mulligan(player, recycle),
            Intent::SetChainTargets { player, item, targets } => self.set_chain_targets(player, item, targets),
            Intent::AnswerDecision {
                player,
                decision,
                answer,
            } => self.answer_decision(player, decision, answer),
            Intent::PlayCard {
                player,
                card,
                destination,
                targets,
                accelerate,
                auto_pay,
            } => self.play_card(player, card, destination, targets, accelerate, auto_pay),
            Intent::HideCard {
                player,
                card,
                battlefield,
            } => self.hide_card(player, card, battlefield),
            Intent::DeclareMove { player, from, to, units } => self.declare_move(player, from, to, units),
            Intent::ActivateAbility {
                player,
                source,
                targets,
                auto_pay,
            } => self.activate_ability(player, source, targets, auto_pay),
            Intent::EquipGear {
                player,
                gear,
                unit,
                auto_pay,
            } => self.equip_gear(player, gear, unit, auto_pay),
            Intent::AssignCombatDamage { player, assignment } => self.assign_combat_damage(player, assignment),
            Intent::AutoAssignCombatDamage { player } => self.auto_assign_combat_damage(player),
            Intent::ExhaustRune { player, rune } => {
                self.check_resource_timing(player)?;
                self.exhaust_rune(player, rune)
            }
            Intent::RecycleRune { player, rune } => {
                self.check_resource_timing(player)?;
                self.recycle_rune(player, rune)
            }
        }
    }

    /// Whether `player` may act at `speed` right now
    pub fn check_timing(&self, player: PlayerId, speed: Speed) -> Result<()> {
        if matches!(self.phase(), Phase::Mulligan | Phase::GameOver) {
            return Err(DuelError::illegal(format!("nothing can be played during {}", self.phase())));
        }
        if self.priority != player {
            return Err(DuelError::illegal(format!(
                "{} does not hold priority",
                self.player_name(player)
            )));
        }
        if self.combat.is_some() && self.window.is_none() {
            return Err(DuelError::illegal("combat damage is being assigned"));
        }
        if let Some(top) = self.chain.top() {
            if top.targets.is_none() {
                return Err(DuelError::illegal("the top chain item still needs targets"));
            }
            if speed < Speed::Reaction {
                return Err(DuelError::illegal("only Reaction speed can respond to the chain"));
            }
        } else if self.window.is_some() {
            if speed < Speed::Action {
                return Err(DuelError::illegal("only Action or Reaction speed fits a showdown"));
            }
        } else if player != self.active_player() || self.phase() != Phase::Action {
            return Err(DuelError::illegal("this can only be done in your own action phase"));
        }
        Ok(())
    }

    fn check_resource_timing(&self, player: PlayerId) -> Result<()> {
        if self.phase() == Phase::Mulligan {
            return Err(DuelError::illegal("runes cannot be used during the mulligan"));
        }
        if self.priority != player && self.active_player() != player {
            return Err(DuelError::illegal(format!(
                "{} cannot act right now",
                self.player_name(player)
            )));
        }
        Ok(())
    }

    /// Targets a card's text needs, as seen from `ctx`
    fn requirement_for(&self, text: &str, ctx: &TargetContext, name: &str) -> TargetRequirement {
        match targeting::infer(text, ctx) {
            Inferred::Known(req) => req,
            Inferred::Ambiguous(reason) => {
                self.logger
                    .unsupported(&format!("{}: cannot tell its targets ({})", name, reason));
                TargetRequirement::None
            }
        }
    }

    fn play_card(
        &mut self,
        player: PlayerId,
        card: CardId,
        destination: Option<Location>,
        targets: Vec<TargetRef>,
        accelerate: bool,
        auto_pay: bool,
    ) -> Result<()> {
        let (def, zone, hidden_on_turn) = {
            let c = self.card(card)?;
            if c.owner != player {
                return Err(DuelError::illegal(format!("{} is not yours", self.describe(card))));
            }
            (c.definition.clone(), c.zone, c.hidden_on_turn)
        };
        // The champion slot plays like the hand: full cost, normal timing
        let hidden_at = match zone {
            Zone::Hand | Zone::Champion => None,
            Zone::Facedown(bf) => Some(bf),
            other => {
                return Err(DuelError::illegal(format!(
                    "{} cannot be played from {:?}",
                    def.name, other
                )))
            }
        };
        if !matches!(def.card_type, CardType::Unit | CardType::Spell | CardType::Gear) {
            return Err(DuelError::illegal(format!("{} is not a playable card", def.name)));
        }
        if hidden_at.is_some() && hidden_on_turn == Some(self.turn_number()) {
            return Err(DuelError::illegal("a hidden card cannot be played the turn it was hidden"));
        }

        let speed = if hidden_at.is_some() {
            Speed::Reaction
        } else {
            card_speed(self, card)
        };
        self.check_timing(player, speed)?;

        let destination = match (def.card_type, hidden_at, destination) {
            (CardType::Unit, Some(bf), _) => Location::Battlefield(bf),
            (CardType::Unit, None, Some(Location::Battlefield(bf))) => {
                if !self.battlefield(bf)?.is_controlled_by(player) {
                    return Err(DuelError::illegal(format!(
                        "units can only be played to a battlefield you control ({} is not)",
                        bf
                    )));
                }
                Location::Battlefield(bf)
            }
            (_, _, Some(Location::Battlefield(_))) => {
                return Err(DuelError::illegal("only units are played to a battlefield"));
            }
            _ => Location::Base,
        };
        let origin = match destination {
            Location::Battlefield(bf) => Some(bf),
            Location::Base => hidden_at,
        };

        if accelerate && !(def.is_unit() && def.has_keyword(&Keyword::Accelerate)) {
            return Err(DuelError::illegal(format!("{} does not have Accelerate", def.name)));
        }

        let tctx = TargetContext {
            controller: player,
            origin,
            source: Some(card),
        };
        let (requirement, clauses) = if def.is_spell() {
            let req = self.requirement_for(&def.effect, &tctx, def.name.as_str());
            if !targeting::validate(&req, &targets, self, &tctx) {
                return Err(DuelError::illegal(format!(
                    "illegal targets for {}: needs {:?}",
                    def.name, req
                )));
            }
            (req, parse_effect(&def.effect))
        } else {
            if !targets.is_empty() {
                return Err(DuelError::illegal("only spells take targets when played"));
            }
            (TargetRequirement::None, Vec::new())
        };

        let matching = def.domain_set();
        let mut cost = if hidden_at.is_some() {
            CostSpec::free()
        } else {
            CostSpec::new(def.energy, def.power, matching)
        };
        if accelerate {
            cost.energy += 1;
            cost = cost.with_extra(1, PowerKind::Matching);
        }
        cost = cost.with_extra(targeting::deflect_tax(self, &targets, player), PowerKind::Any);
        self.pay_cost(player, &cost, matching, auto_pay)?;

        self.move_card(card, Zone::Chain)?;
        let progress = self.new_progress();
        let item = ChainItem {
            id: self.chain.next_id(),
            controller: player,
            kind: ChainItemKind::Play { card, destination },
            source: card,
            source_def: def.clone(),
            effect_text: def.effect.clone(),
            clauses,
            requirement,
            targets: Some(targets),
            target_stamps: Vec::new(),
            origin,
            boosted: accelerate,
            progress,
        };
        self.logger.normal(
            LogCategory::Event,
            &format!(
                "{} plays {}{}",
                self.player_name(player),
                def.name,
                match zone {
                    Zone::Facedown(_) => " from hiding",
                    Zone::Champion => " from the champion slot",
                    _ => "",
                }
            ),
        );
        self.push_item(item);
        Ok(())
    }

    fn hide_card(&mut self, player: PlayerId, card: CardId, battlefield: BattlefieldId) -> Result<()> {
        self.check_timing(player, Speed::Normal)?;
        {
            let c = self.card(card)?;
            if c.owner != player || c.zone != Zone::Hand {
                return Err(DuelError::illegal("only cards in your hand can be hidden"));
            }
            if !c.definition.has_keyword(&Keyword::Hidden) {
                return Err(DuelError::illegal(format!("{} does not have Hidden", c.name())));
            }
        }
        let bf = self.battlefield(battlefield)?;
        if !bf.is_controlled_by(player) {
            return Err(DuelError::illegal(format!("you must control {} to hide there", battlefield)));
        }
        if bf.facedown[player.index()].is_some() {
            return Err(DuelError::illegal(format!("you already have a card hidden at {}", battlefield)));
        }

        let cost = CostSpec::free().with_extra(1, PowerKind::Any);
        self.pay_cost(player, &cost, DomainSet::empty(), true)?;
        self.move_card(card, Zone::Facedown(battlefield))?;
        self.card_mut(card)?.hidden_on_turn = Some(self.turn_number());
        self.logger.normal(
            LogCategory::Event,
            &format!("{} hides a card at {}", self.player_name(player), battlefield),
        );
        Ok(())
    }

    fn declare_move(&mut self, player: PlayerId, from: Location, to: Location, units: Vec<CardId>) -> Result<()> {
        self.check_timing(player, Speed::Normal)?;
        if from == to {
            return Err(DuelError::illegal("a move needs different origin and destination"));
        }
        if units.is_empty() {
            return Err(DuelError::illegal("no units to move"));
        }
        let between_battlefields = matches!(
            (from, to),
            (Location::Battlefield(_), Location::Battlefield(_))
        );
        for (i, unit) in units.iter().enumerate() {
            if units[..i].contains(unit) {
                return Err(DuelError::illegal("a unit is listed twice"));
            }
            let c = self.card(*unit)?;
            let name = self.describe(*unit);
            if !c.is_unit() || c.controller != player {
                return Err(DuelError::illegal(format!("{} is not a unit you control", name)));
            }
            if c.zone != from.zone() {
                return Err(DuelError::illegal(format!("{} is not at the move's origin", name)));
            }
            if !c.ready || queries::is_stunned(self, *unit) {
                return Err(DuelError::illegal(format!("{} must be ready and not stunned", name)));
            }
            if between_battlefields && !queries::has_keyword(self, *unit, &Keyword::Ganking) {
                return Err(DuelError::illegal(format!(
                    "{} needs Ganking to move between battlefields",
                    name
                )));
            }
        }

        for unit in &units {
            self.relocate_unit(*unit, to.zone())?;
            self.card_mut(*unit)?.exhaust();
        }
        self.logger.normal(
            LogCategory::Event,
            &format!(
                "{} moves {} unit(s) to {}",
                self.player_name(player),
                units.len(),
                match to {
                    Location::Base => "base".to_string(),
                    Location::Battlefield(bf) => bf.to_string(),
                }
            ),
        );
        if let Location::Battlefield(bf) = to {
            self.note_arrival(bf, player)?;
        }
        Ok(())
    }

    fn activate_ability(
        &mut self,
        player: PlayerId,
        source: CardId,
        targets: Vec<TargetRef>,
        auto_pay: bool,
    ) -> Result<()> {
        let (def, zone, ready) = {
            let c = self.card(source)?;
            if c.controller != player {
                return Err(DuelError::illegal(format!("{} is not yours", self.describe(source))));
            }
            (c.definition.clone(), c.zone, c.ready)
        };
        if !(zone.is_in_play() || zone == Zone::Legend) {
            return Err(DuelError::illegal(format!("{} is not in play", def.name)));
        }
        let AbilityTiming::Activated { cost, speed } = ability_timing(&def) else {
            return Err(DuelError::illegal(format!("{} has no activated ability", def.name)));
        };
        if cost.exhaust && !ready {
            return Err(DuelError::illegal(format!("{} is exhausted", def.name)));
        }

        let clauses = parse_effect(&def.effect);
        let resource_only = !clauses.is_empty() && clauses.iter().all(|c| c.primitive.is_resource_only());
        self.check_timing(player, if resource_only { Speed::Reaction } else { speed })?;

        let origin = zone.battlefield();
        let tctx = TargetContext {
            controller: player,
            origin,
            source: Some(source),
        };
        let requirement = self.requirement_for(&def.effect, &tctx, def.name.as_str());
        if !targeting::validate(&requirement, &targets, self, &tctx) {
            return Err(DuelError::illegal(format!(
                "illegal targets for {}: needs {:?}",
                def.name, requirement
            )));
        }

        let matching = def.domain_set();
        let spec = CostSpec::new(cost.energy, cost.power, matching)
            .with_extra(targeting::deflect_tax(self, &targets, player), PowerKind::Any);
        self.pay_cost(player, &spec, matching, auto_pay)?;
        if cost.exhaust {
            self.card_mut(source)?.exhaust();
        }
        if cost.kill_self {
            self.kill_card(source)?;
        }
        self.logger.normal(
            LogCategory::Event,
            &format!("{} activates {}", self.player_name(player), def.name),
        );

        let progress = self.new_progress();
        if resource_only {
            return self.run_direct_effect(DirectEffect {
                controller: player,
                source: Some(source),
                clauses,
                targets,
                origin,
                progress,
            });
        }
        let item = ChainItem {
            id: self.chain.next_id(),
            controller: player,
            kind: ChainItemKind::Activated,
            source,
            source_def: def.clone(),
            effect_text: def.effect.clone(),
            clauses,
            requirement,
            targets: Some(targets),
            target_stamps: Vec::new(),
            origin,
            boosted: false,
            progress,
        };
        self.push_item(item);
        Ok(())
    }

    fn equip_gear(&mut self, player: PlayerId, gear: CardId, unit: CardId, auto_pay: bool) -> Result<()> {
        self.check_timing(player, Speed::Normal)?;
        let def = {
            let g = self.card(gear)?;
            if g.controller != player || !g.is_gear() || !g.is_in_play() {
                return Err(DuelError::illegal("only your gear in play can be equipped"));
            }
            g.definition.clone()
        };
        let Some(equip_cost) = def.keywords.iter().find_map(|k| match k {
            Keyword::Equip(n) => Some(*n),
            _ => None,
        }) else {
            return Err(DuelError::illegal(format!("{} has no Equip cost", def.name)));
        };
        {
            let u = self.card(unit)?;
            if u.controller != player || !u.is_unit() || !u.is_in_play() {
                return Err(DuelError::illegal("gear can only be equipped to your units in play"));
            }
        }
        let matching = def.domain_set();
        let cost = CostSpec::free().with_extra(equip_cost, PowerKind::Matching);
        self.pay_cost(player, &cost, matching, auto_pay)?;
        self.attach_gear(gear, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardDefinition, Domain};
    use crate::game::MatchConfig;

    fn setup() -> Match {
        let mut m = Match::new_two_player("Alice", "Bob", MatchConfig::default());
        m.turn.phase = Phase::Action;
        for p in m.player_ids() {
            m.player_mut(p).unwrap().mulligan_done = true;
        }
        m
    }

    fn in_hand(m: &mut Match, player: u32, def: CardDefinition) -> CardId {
        m.create_card(def.into_shared(), PlayerId::new(player), Zone::Hand).unwrap()
    }

    #[test]
    fn test_intent_json_shape() {
        let intent = Intent::PassPriority {
            player: PlayerId::new(1),
        };
        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("\"type\":\"PassPriority\""), "got {}", json);
        let back: Intent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn test_rejected_intent_leaves_state_untouched() {
        let mut m = setup();
        let card = in_hand(&mut m, 0, CardDefinition::new("u", "Brute", CardType::Unit).with_cost(3, 0));
        let before = serde_json::to_string(&crate::game::snapshot::capture(&m)).unwrap();

        let err = m
            .apply(Intent::PlayCard {
                player: PlayerId::new(0),
                card,
                destination: None,
                targets: vec![],
                accelerate: false,
                auto_pay: false,
            })
            .unwrap_err();

        assert!(err.is_rejection());
        let mut after = crate::game::snapshot::capture(&m);
        after.log.retain(|e| e.category != LogCategory::Rejected);
        assert_eq!(serde_json::to_string(&after).unwrap(), before);
        assert_eq!(m.logger.count(LogCategory::Rejected), 1);
    }

    #[test]
    fn test_unit_play_resolves_exhausted_at_base() {
        let mut m = setup();
        let p0 = PlayerId::new(0);
        let card = in_hand(&mut m, 0, CardDefinition::new("u", "Brute", CardType::Unit).with_cost(2, 0).with_might(3));
        m.player_mut(p0).unwrap().pool.add_energy(2);

        m.apply(Intent::PlayCard {
            player: p0,
            card,
            destination: None,
            targets: vec![],
            accelerate: false,
            auto_pay: false,
        })
        .unwrap();
        assert_eq!(m.chain.len(), 1);
        assert_eq!(m.player(p0).unwrap().pool.energy, 0);

        m.apply(Intent::PassPriority { player: p0 }).unwrap();
        m.apply(Intent::PassPriority { player: PlayerId::new(1) }).unwrap();

        let c = m.card(card).unwrap();
        assert_eq!(c.zone, Zone::Base);
        assert!(!c.ready, "units enter exhausted");
        assert!(m.chain.is_empty());
    }

    #[test]
    fn test_accelerate_enters_ready() {
        let mut m = setup();
        let p0 = PlayerId::new(0);
        let def = CardDefinition::new("u", "Runner", CardType::Unit)
            .with_cost(1, 0)
            .with_might(2)
            .with_domain(Domain::Fury)
            .with_keyword(Keyword::Accelerate);
        let card = in_hand(&mut m, 0, def);
        m.player_mut(p0).unwrap().pool.add_energy(2);
        m.player_mut(p0).unwrap().pool.add_power(Domain::Fury, 1);

        m.apply(Intent::PlayCard {
            player: p0,
            card,
            destination: None,
            targets: vec![],
            accelerate: true,
            auto_pay: false,
        })
        .unwrap();
        m.apply(Intent::PassPriority { player: p0 }).unwrap();
        m.apply(Intent::PassPriority { player: PlayerId::new(1) }).unwrap();
        assert!(m.card(card).unwrap().ready);
        assert!(m.player(p0).unwrap().pool.is_empty());
    }

    #[test]
    fn test_normal_speed_cannot_respond() {
        let mut m = setup();
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        let spell = in_hand(&mut m, 0, CardDefinition::new("s", "Study", CardType::Spell).with_ability("", "Draw 1."));
        let slow = in_hand(&mut m, 1, CardDefinition::new("s2", "Ponder", CardType::Spell).with_ability("", "Draw 1."));
        m.apply(Intent::PlayCard {
            player: p0,
            card: spell,
            destination: None,
            targets: vec![],
            accelerate: false,
            auto_pay: false,
        })
        .unwrap();
        m.apply(Intent::PassPriority { player: p0 }).unwrap();

        let err = m
            .apply(Intent::PlayCard {
                player: p1,
                card: slow,
                destination: None,
                targets: vec![],
                accelerate: false,
                auto_pay: false,
            })
            .unwrap_err();
        assert!(err.to_string().contains("Reaction"));
    }

    #[test]
    fn test_move_to_empty_battlefield_conquers() {
        let mut m = setup();
        let p0 = PlayerId::new(0);
        let bf = BattlefieldId::new(1);
        let def = CardDefinition::new("u", "Scout", CardType::Unit).with_might(1).into_shared();
        let unit = m.create_card(def, p0, Zone::Base).unwrap();

        m.apply(Intent::DeclareMove {
            player: p0,
            from: Location::Base,
            to: Location::Battlefield(bf),
            units: vec![unit],
        })
        .unwrap();
        assert!(m.window.is_some(), "showdown opens after the move");
        assert!(!m.card(unit).unwrap().ready);

        m.apply(Intent::PassPriority { player: p0 }).unwrap();
        m.apply(Intent::PassPriority { player: PlayerId::new(1) }).unwrap();
        assert_eq!(m.battlefield(bf).unwrap().controller, Some(p0));
        assert_eq!(m.player(p0).unwrap().score, 1);
    }

    #[test]
    fn test_move_requires_ganking_between_battlefields() {
        let mut m = setup();
        let p0 = PlayerId::new(0);
        let def = CardDefinition::new("u", "Scout", CardType::Unit).with_might(1).into_shared();
        let unit = m
            .create_card(def, p0, Zone::Battlefield(BattlefieldId::new(0)))
            .unwrap();
        m.battlefield_mut(BattlefieldId::new(0)).unwrap().controller = Some(p0);
        let err = m
            .apply(Intent::DeclareMove {
                player: p0,
                from: Location::Battlefield(BattlefieldId::new(0)),
                to: Location::Battlefield(BattlefieldId::new(1)),
                units: vec![unit],
            })
            .unwrap_err();
        assert!(err.to_string().contains("Ganking"));
    }

    #[test]
    fn test_decision_blocks_other_intents() {
        let mut m = setup();
        let p0 = PlayerId::new(0);
        let filler = CardDefinition::new("f", "Filler", CardType::Spell).into_shared();
        for _ in 0..3 {
            m.create_card(filler.clone(), p0, Zone::MainDeck).unwrap();
        }
        let spell = in_hand(
            &mut m,
            0,
            CardDefinition::new("s", "Insight", CardType::Spell).with_ability("", "Draw up to 2."),
        );
        m.apply(Intent::PlayCard {
            player: p0,
            card: spell,
            destination: None,
            targets: vec![],
            accelerate: false,
            auto_pay: false,
        })
        .unwrap();
        m.apply(Intent::PassPriority { player: p0 }).unwrap();
        m.apply(Intent::PassPriority { player: PlayerId::new(1) }).unwrap();
        let decision = m.decision.as_ref().expect("pending decision").id;

        assert!(m.apply(Intent::AdvancePhase { player: p0 }).is_err());
        m.apply(Intent::AnswerDecision {
            player: p0,
            decision,
            answer: DecisionAnswer::Number(2),
        })
        .unwrap();
        assert_eq!(m.player(p0).unwrap().hand_size(), 2);
        assert_eq!(m.card(spell).unwrap().zone, Zone::Discard);
    }

    #[test]
    fn test_concede_ends_game() {
        let mut m = setup();
        m.apply(Intent::Concede {
            player: PlayerId::new(1),
        })
        .unwrap();
        assert_eq!(m.winner, Some(PlayerId::new(0)));
        assert!(matches!(
            m.apply(Intent::AdvancePhase {
                player: PlayerId::new(0)
            }),
            Err(DuelError::GameOver)
        ));
    }
}
