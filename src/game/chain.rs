//! The chain, priority and showdown windows
//!
//! Announced spells, abilities and triggers stack up on the chain. Every
//! push hands priority to the item's controller; two consecutive passes
//! resolve the top item, or close the open showdown window when the chain is
//! empty. `settle` runs after every accepted intent and opens the next
//! showdown once nothing else is in flight.

use crate::core::{
    AbilityTiming, BattlefieldId, CardDefinition, CardId, ChainItemId, DecisionId, EffectClause, PlayerId,
    TargetRef, TriggerKind,
};
use crate::game::actions::Location;
use crate::game::combat::CombatState;
use crate::game::decision::{DecisionAnswer, DecisionRequest, DirectEffect, PendingDecision, ResolutionProgress, ResumeToken};
use crate::game::effect_parser::{ability_timing, parse_effect};
use crate::game::effects::{resolve_effect, Outcome, ResolveContext};
use crate::game::state::Match;
use crate::game::targeting::{self, Inferred, TargetContext, TargetRequirement};
use crate::game::LogCategory;
use crate::zones::Zone;
use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainItemKind {
    /// A card being played; units and gear land at `destination`
    Play { card: CardId, destination: Location },
    Triggered { trigger: TriggerKind },
    Activated,
}

/// One pending spell or ability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainItem {
    pub id: ChainItemId,
    pub controller: PlayerId,
    pub kind: ChainItemKind,
    pub source: CardId,
    pub source_def: Arc<CardDefinition>,
    pub effect_text: String,
    pub clauses: Vec<EffectClause>,
    pub requirement: TargetRequirement,
    /// `None` until the controller has chosen
    pub targets: Option<Vec<TargetRef>>,
    /// Generation of each card target when it was chosen
    #[serde(default)]
    pub target_stamps: Vec<(CardId, u32)>,
    pub origin: Option<BattlefieldId>,
    /// Played with Accelerate
    pub boosted: bool,
    pub progress: ResolutionProgress,
}

impl ChainItem {
    fn target_context(&self) -> TargetContext {
        TargetContext {
            controller: self.controller,
            origin: self.origin,
            source: Some(self.source),
        }
    }

    fn resolve_context(&self, auto_decide: bool) -> ResolveContext {
        ResolveContext {
            controller: self.controller,
            source: Some(self.source),
            source_def: Some(self.source_def.clone()),
            origin: self.origin,
            boosted: self.boosted,
            auto_decide,
        }
    }
}

/// Last in, first out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chain {
    pub items: Vec<ChainItem>,
    next_id: u32,
}

impl Chain {
    pub fn new() -> Self {
        Chain {
            items: Vec::new(),
            next_id: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn top(&self) -> Option<&ChainItem> {
        self.items.last()
    }

    pub fn next_id(&mut self) -> ChainItemId {
        let id = ChainItemId::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn push(&mut self, item: ChainItem) {
        self.items.push(item);
    }

    pub fn get(&self, id: ChainItemId) -> Result<&ChainItem> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| DuelError::invariant(format!("chain item {} not found", id)))
    }

    pub fn get_mut(&mut self, id: ChainItemId) -> Result<&mut ChainItem> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| DuelError::invariant(format!("chain item {} not found", id)))
    }

    /// Remove by id; triggers may sit above the item being resolved
    pub fn remove(&mut self, id: ChainItemId) -> Option<ChainItem> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(pos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    /// Both sides have units: closes into combat damage
    Combat,
    /// One side arrived alone: closes into a conquest
    Control,
}

/// An open showdown at a battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub battlefield: BattlefieldId,
    pub kind: WindowKind,
    /// Player who acts first in the window
    pub initiative: PlayerId,
}

impl Match {
    /// Put an item on the chain and hand priority to its controller
    pub(crate) fn push_item(&mut self, mut item: ChainItem) {
        if let Some(targets) = &item.targets {
            item.target_stamps = self.stamp_targets(targets);
        }
        self.logger.normal(
            LogCategory::Chain,
            &format!(
                "{} puts {} on the chain ({})",
                self.player_name(item.controller),
                item.source_def.name,
                item.id
            ),
        );
        self.priority = item.controller;
        self.consecutive_passes = 0;
        self.chain.push(item);
    }

    fn stamp_targets(&self, targets: &[TargetRef]) -> Vec<(CardId, u32)> {
        targets
            .iter()
            .filter_map(|t| t.card())
            .filter_map(|c| self.card(c).ok().map(|card| (c, card.generation)))
            .collect()
    }

    pub(crate) fn new_progress(&mut self) -> ResolutionProgress {
        ResolutionProgress::new(self.next_resolution_id())
    }

    pub(crate) fn pass_priority(&mut self, player: PlayerId) -> Result<()> {
        if self.priority != player {
            return Err(DuelError::illegal(format!(
                "{} does not hold priority",
                self.player_name(player)
            )));
        }
        if self.chain.is_empty() && self.window.is_none() {
            return Err(DuelError::illegal("nothing to pass on: the chain is empty and no showdown is open"));
        }
        if let Some(top) = self.chain.top() {
            if top.targets.is_none() {
                return Err(DuelError::illegal(format!(
                    "targets for {} ({}) must be chosen first",
                    top.source_def.name, top.id
                )));
            }
        }

        self.consecutive_passes += 1;
        self.logger
            .verbose(LogCategory::Chain, &format!("{} passes", self.player_name(player)));
        if self.consecutive_passes >= 2 {
            self.consecutive_passes = 0;
            match self.chain.top().map(|i| i.id) {
                Some(id) => self.resolve_chain_item(id),
                None => self.close_window(),
            }
        } else {
            let next = self.opponent(player);
            // Passing on an empty chain inside a showdown hands over initiative
            if self.chain.is_empty() {
                if let Some(window) = self.window.as_mut() {
                    window.initiative = next;
                }
            }
            self.priority = next;
            Ok(())
        }
    }

    /// Choose targets for an item announced without them
    pub(crate) fn set_chain_targets(
        &mut self,
        player: PlayerId,
        item_id: ChainItemId,
        targets: Vec<TargetRef>,
    ) -> Result<()> {
        let item = self.chain.get(item_id)?;
        if item.controller != player {
            return Err(DuelError::illegal("only the item's controller chooses its targets"));
        }
        if item.targets.is_some() {
            return Err(DuelError::illegal(format!("targets for {} are already chosen", item_id)));
        }
        if !targeting::validate(&item.requirement, &targets, self, &item.target_context()) {
            return Err(DuelError::illegal(format!(
                "illegal targets for {}: needs {:?}",
                item.source_def.name, item.requirement
            )));
        }
        let name = item.source_def.name.to_string();
        let stamps = self.stamp_targets(&targets);
        let stored = self.chain.get_mut(item_id)?;
        stored.targets = Some(targets);
        stored.target_stamps = stamps;
        self.logger.normal(
            LogCategory::Chain,
            &format!("{} chooses targets for {}", self.player_name(player), name),
        );
        Ok(())
    }

    /// Resolve (or resume) one chain item
    fn resolve_chain_item(&mut self, id: ChainItemId) -> Result<()> {
        let item = self.chain.get(id)?.clone();
        let ctx = item.resolve_context(self.config.auto_decisions);
        let mut progress = item.progress.clone();
        let mut targets = item.targets.clone().unwrap_or_default();

        if !progress.started {
            let fresh = targeting::drop_stale(&targets, &item.target_stamps, self);
            match targeting::retain_legal(&item.requirement, &fresh, self, &item.target_context()) {
                Some(kept) => {
                    if kept.len() < targets.len() {
                        self.logger.verbose(
                            LogCategory::Chain,
                            &format!("{}: {} target(s) no longer legal", item.source_def.name, targets.len() - kept.len()),
                        );
                    }
                    targets = kept;
                }
                None => {
                    self.logger
                        .fizzle(&format!("{} fizzles: its targets are gone", item.source_def.name));
                    return self.finish_item(id);
                }
            }
        }

        let outcome = if item.clauses.is_empty() {
            Outcome::Resolved
        } else {
            self.logger
                .normal(LogCategory::Chain, &format!("{} resolves", item.source_def.name));
            resolve_effect(self, &ctx, &item.clauses, &targets, &mut progress)?
        };

        if let Ok(stored) = self.chain.get_mut(id) {
            stored.progress = progress;
            stored.targets = Some(targets);
        }

        match outcome {
            Outcome::AwaitingDecision(request) => {
                self.suspend(request, ResumeToken::ResumeChainItem(id));
                Ok(())
            }
            Outcome::NoOp => {
                self.logger
                    .verbose(LogCategory::Chain, &format!("{} had no effect", item.source_def.name));
                self.finish_item(id)
            }
            Outcome::Resolved => self.finish_item(id),
        }
    }

    /// Remove a finished item and put its card where it belongs
    fn finish_item(&mut self, id: ChainItemId) -> Result<()> {
        let Some(item) = self.chain.remove(id) else {
            return Err(DuelError::invariant(format!("chain item {} vanished", id)));
        };

        if let ChainItemKind::Play { card, destination } = item.kind {
            let def = item.source_def.clone();
            if def.is_unit() || def.is_gear() {
                let zone = match destination {
                    Location::Battlefield(bf) if def.is_unit() && self.battlefield(bf)?.is_controlled_by(item.controller) => {
                        Zone::Battlefield(bf)
                    }
                    Location::Battlefield(bf) if def.is_unit() => {
                        self.logger.event(&format!(
                            "{} no longer controls {}; {} enters base instead",
                            self.player_name(item.controller),
                            bf,
                            def.name
                        ));
                        Zone::Base
                    }
                    _ => Zone::Base,
                };
                self.move_card(card, zone)?;
                if def.is_unit() && !item.boosted {
                    self.card_mut(card)?.exhaust();
                }
                self.logger
                    .event(&format!("{} enters {}", self.describe(card), zone_name(zone)));
                self.queue_triggers(card, TriggerKind::OnPlay, zone.battlefield())?;
            } else if self.card(card).is_ok_and(|c| c.zone == Zone::Chain) {
                self.move_card(card, Zone::Discard)?;
            }
        }

        self.after_resolution();
        Ok(())
    }

    fn after_resolution(&mut self) {
        self.consecutive_passes = 0;
        if let Some(top) = self.chain.top() {
            self.priority = top.controller;
        } else if let Some(window) = self.window {
            self.priority = window.initiative;
        } else {
            self.priority = self.active_player();
        }
    }

    /// Leave a decision for a player; resolution continues once answered
    pub(crate) fn suspend(&mut self, request: DecisionRequest, resume: ResumeToken) {
        let id = DecisionId::new(self.next_decision_id());
        self.logger.normal(
            LogCategory::Decision,
            &format!("{} must decide: {}", self.player_name(request.player), request.prompt),
        );
        self.decision = Some(PendingDecision::from_request(id, request, resume));
    }

    pub(crate) fn answer_decision(&mut self, player: PlayerId, id: DecisionId, answer: DecisionAnswer) -> Result<()> {
        let pending = self
            .decision
            .as_ref()
            .ok_or_else(|| DuelError::illegal("no decision is pending"))?;
        if pending.id != id {
            return Err(DuelError::illegal(format!("decision {} is not pending", id)));
        }
        if pending.player != player {
            return Err(DuelError::illegal("this decision belongs to the other player"));
        }
        if !pending.kind.accepts(&answer) {
            return Err(DuelError::illegal(format!("answer {} does not fit {:?}", answer, pending.kind)));
        }
        let Some(pending) = self.decision.take() else {
            return Err(DuelError::invariant("decision disappeared"));
        };
        self.logger.normal(
            LogCategory::Decision,
            &format!("{} answers {}", self.player_name(player), answer),
        );
        match pending.resume {
            ResumeToken::ResumeChainItem(item) => {
                self.chain.get_mut(item)?.progress.answers.insert(pending.key, answer);
                self.resolve_chain_item(item)
            }
            ResumeToken::ResumeDirectEffect(mut direct) => {
                direct.progress.answers.insert(pending.key, answer);
                self.run_direct_effect(*direct)
            }
        }
    }

    /// Resolve an ability immediately, outside the chain
    pub(crate) fn run_direct_effect(&mut self, mut direct: DirectEffect) -> Result<()> {
        let ctx = ResolveContext {
            controller: direct.controller,
            source: direct.source,
            source_def: direct.source.and_then(|c| self.card(c).ok().map(|card| card.definition.clone())),
            origin: direct.origin,
            boosted: false,
            auto_decide: self.config.auto_decisions,
        };
        let clauses = direct.clauses.clone();
        let targets = direct.targets.clone();
        match resolve_effect(self, &ctx, &clauses, &targets, &mut direct.progress)? {
            Outcome::AwaitingDecision(request) => {
                self.suspend(request, ResumeToken::ResumeDirectEffect(Box::new(direct)));
            }
            Outcome::Resolved | Outcome::NoOp => {}
        }
        Ok(())
    }

    /// Put a card's triggered ability on the chain if it has one for `kind`
    pub(crate) fn queue_triggers(&mut self, card: CardId, kind: TriggerKind, origin: Option<BattlefieldId>) -> Result<()> {
        let (def, controller) = {
            let c = self.card(card)?;
            (c.definition.clone(), c.controller)
        };
        if ability_timing(&def) != AbilityTiming::Triggered(kind) {
            return Ok(());
        }

        let tctx = TargetContext {
            controller,
            origin,
            source: Some(card),
        };
        let requirement = match targeting::infer(&def.effect, &tctx) {
            Inferred::Known(req) => req,
            Inferred::Ambiguous(reason) => {
                self.logger
                    .unsupported(&format!("{}: cannot tell its targets ({})", def.name, reason));
                TargetRequirement::None
            }
        };
        let targets = targeting::forced_targets(&requirement, self, &tctx);
        if targets.is_none() && targeting::is_unsatisfiable(&requirement, self, &tctx) {
            self.logger
                .fizzle(&format!("{}'s trigger has no legal targets", def.name));
            return Ok(());
        }

        let progress = self.new_progress();
        let item = ChainItem {
            id: self.chain.next_id(),
            controller,
            kind: ChainItemKind::Triggered { trigger: kind },
            source: card,
            source_def: def.clone(),
            effect_text: def.effect.clone(),
            clauses: parse_effect(&def.effect),
            requirement,
            targets,
            target_stamps: Vec::new(),
            origin,
            boosted: false,
            progress,
        };
        self.push_item(item);
        Ok(())
    }

    /// A player's units reached a battlefield: flag it for a showdown
    pub(crate) fn note_arrival(&mut self, battlefield: BattlefieldId, player: PlayerId) -> Result<()> {
        let opponent = self.opponent(player);
        let bf = self.battlefield_mut(battlefield)?;
        let contested = bf.controller != Some(player) || bf.has_units(opponent);
        if contested && bf.contested_by.is_none() {
            bf.contested_by = Some(player);
            if !self.pending_contests.contains(&battlefield) {
                self.pending_contests.push_back(battlefield);
            }
            self.logger.event(&format!(
                "{} contests {}",
                self.player_name(player),
                battlefield
            ));
        }
        Ok(())
    }

    /// Find battlefields whose occupation no longer matches their control
    fn queue_contests(&mut self) -> Result<()> {
        let [p0, p1] = self.player_ids();
        for id in BattlefieldId::all() {
            let bf = self.battlefield(id)?;
            let contester = match (bf.has_units(p0), bf.has_units(p1)) {
                (true, true) => Some(match bf.controller {
                    Some(owner) => self.opponent(owner),
                    None => self.active_player(),
                }),
                (true, false) if bf.controller != Some(p0) => Some(p0),
                (false, true) if bf.controller != Some(p1) => Some(p1),
                _ => None,
            };
            let Some(contester) = contester else { continue };
            if self.battlefield(id)?.contested_by.is_none() {
                self.battlefield_mut(id)?.contested_by = Some(contester);
            }
            if !self.pending_contests.contains(&id) {
                self.pending_contests.push_back(id);
            }
        }
        Ok(())
    }

    /// Post-intent housekeeping: state checks, then the next showdown once
    /// the chain, window and combat are all clear
    pub(crate) fn settle(&mut self) -> Result<()> {
        if self.decision.is_some() || self.is_over() {
            return Ok(());
        }
        self.state_based_check()?;
        if self.is_over() || !self.chain.is_empty() || self.window.is_some() || self.combat.is_some() {
            return Ok(());
        }
        self.queue_contests()?;
        while let Some(bf) = self.pending_contests.pop_front() {
            if self.open_showdown(bf)? {
                break;
            }
        }
        Ok(())
    }

    /// Open the showdown at a contested battlefield. Returns false when the
    /// contest evaporated (nobody left to contest it).
    fn open_showdown(&mut self, battlefield: BattlefieldId) -> Result<bool> {
        let Some(contester) = self.battlefield(battlefield)?.contested_by else {
            return Ok(false);
        };
        let defender = self.opponent(contester);
        let (attacking, defending) = {
            let bf = self.battlefield(battlefield)?;
            (bf.has_units(contester), bf.has_units(defender))
        };
        if !attacking {
            self.battlefield_mut(battlefield)?.contested_by = None;
            return Ok(false);
        }

        self.priority = contester;
        self.consecutive_passes = 0;
        if defending {
            self.combat = Some(CombatState::new(battlefield, contester, defender));
            self.window = Some(Window {
                battlefield,
                kind: WindowKind::Combat,
                initiative: contester,
            });
            self.logger.normal(
                LogCategory::Combat,
                &format!(
                    "showdown at {}: {} attacks, {} defends",
                    battlefield,
                    self.player_name(contester),
                    self.player_name(defender)
                ),
            );
            let attackers = self.battlefield(battlefield)?.units_of(contester).to_vec();
            let defenders = self.battlefield(battlefield)?.units_of(defender).to_vec();
            for unit in attackers {
                self.queue_triggers(unit, TriggerKind::OnAttack, Some(battlefield))?;
            }
            for unit in defenders {
                self.queue_triggers(unit, TriggerKind::OnDefend, Some(battlefield))?;
            }
        } else {
            self.window = Some(Window {
                battlefield,
                kind: WindowKind::Control,
                initiative: contester,
            });
            self.logger.normal(
                LogCategory::Chain,
                &format!("showdown at {}: {} moves in unopposed", battlefield, self.player_name(contester)),
            );
        }
        Ok(true)
    }

    /// Both players passed on an empty chain inside a showdown
    fn close_window(&mut self) -> Result<()> {
        let Some(window) = self.window.take() else {
            return Err(DuelError::invariant("no showdown window to close"));
        };
        let bf = window.battlefield;
        let contester = self.battlefield(bf)?.contested_by.unwrap_or(window.initiative);
        let defender = self.opponent(contester);
        let (attacking, defending) = {
            let b = self.battlefield(bf)?;
            (b.has_units(contester), b.has_units(defender))
        };
        self.priority = self.active_player();

        match (window.kind, attacking, defending) {
            (WindowKind::Combat, _, _) | (WindowKind::Control, true, true) => {
                if self.combat.is_none() {
                    self.combat = Some(CombatState::new(bf, contester, defender));
                }
                self.begin_combat_damage()
            }
            (WindowKind::Control, true, false) => {
                self.conquer(bf, contester)?;
                self.battlefield_mut(bf)?.contested_by = None;
                Ok(())
            }
            (WindowKind::Control, _, _) => {
                self.battlefield_mut(bf)?.contested_by = None;
                Ok(())
            }
        }
    }
}

fn zone_name(zone: Zone) -> String {
    match zone {
        Zone::Battlefield(bf) => bf.to_string(),
        Zone::Base => "base".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}
