//! Turn progression and phase-entry effects

use crate::core::{CardId, PlayerId, TriggerKind};
use crate::game::state::Match;
use crate::game::{queries, LogCategory, Phase};
use crate::zones::Zone;
use crate::{DuelError, Result};

impl Match {
    /// Step the active player to the next phase
    pub(crate) fn advance_phase(&mut self, player: PlayerId) -> Result<()> {
        if player != self.active_player() {
            return Err(DuelError::illegal("only the active player advances the turn"));
        }
        if !self.chain.is_empty() {
            return Err(DuelError::illegal("the chain must be empty to advance"));
        }
        if self.window.is_some() || self.combat.is_some() || !self.pending_contests.is_empty() {
            return Err(DuelError::illegal("a showdown is still in progress"));
        }
        if self.decision.is_some() {
            return Err(DuelError::illegal("a decision is pending"));
        }
        if self.phase() == Phase::Mulligan && !self.players.iter().all(|p| p.mulligan_done) {
            return Err(DuelError::illegal("both players must confirm their mulligan first"));
        }

        let next_player = self.opponent(self.active_player());
        let entered = self.turn.advance(next_player);
        self.logger.normal(
            LogCategory::Phase,
            &format!(
                "turn {} ({}): {}",
                self.turn_number(),
                self.player_name(self.active_player()),
                entered
            ),
        );
        self.priority = self.active_player();
        self.consecutive_passes = 0;
        self.enter_phase(entered)
    }

    fn enter_phase(&mut self, phase: Phase) -> Result<()> {
        let active = self.active_player();
        match phase {
            Phase::Ready => self.ready_phase(active),
            Phase::Scoring => self.scoring_phase(active),
            Phase::Channel => {
                let player = self.player(active)?;
                let mut count = self.config.runes_per_channel;
                if active != self.turn.starting_player && player.channels_taken == 0 {
                    count += self.config.second_player_bonus_runes;
                }
                self.channel_runes(active, count, false)?;
                self.player_mut(active)?.channels_taken += 1;
                Ok(())
            }
            Phase::Draw => {
                self.draw_cards(active, self.config.draws_per_turn)?;
                Ok(())
            }
            Phase::End => self.end_phase(),
            Phase::Action | Phase::Mulligan | Phase::GameOver => Ok(()),
        }
    }

    fn ready_phase(&mut self, active: PlayerId) -> Result<()> {
        let turn = self.turn_number();
        let mine: Vec<CardId> = self
            .cards
            .ids_sorted()
            .into_iter()
            .filter(|id| {
                self.card(*id)
                    .is_ok_and(|c| c.controller == active && (c.is_in_play() || c.zone == Zone::Legend))
            })
            .collect();
        for id in &mine {
            let card = self.card_mut(*id)?;
            card.ready_up();
            if card.stunned_until.is_some_and(|until| until <= turn) {
                card.stunned_until = None;
            }
        }
        self.logger.verbose(
            LogCategory::Phase,
            &format!("{} readies {} card(s)", self.player_name(active), mine.len()),
        );

        for unit in self.temporary_units(active) {
            self.logger
                .event(&format!("{} is temporary and expires", self.describe(unit)));
            self.kill_card(unit)?;
        }

        for id in mine {
            if self.card(id).is_ok_and(|c| c.is_in_play() || c.zone == Zone::Legend) {
                let origin = self.card(id)?.zone.battlefield();
                self.queue_triggers(id, TriggerKind::StartOfTurn, origin)?;
            }
        }
        Ok(())
    }

    fn scoring_phase(&mut self, active: PlayerId) -> Result<()> {
        for bf in queries::controlled_battlefields(self, active) {
            self.award_points(active, 1, &format!("holds {}", bf))?;
            if self.is_over() {
                return Ok(());
            }
            for unit in queries::units_at(self, bf, active) {
                self.queue_triggers(unit, TriggerKind::OnHold, Some(bf))?;
            }
        }
        Ok(())
    }

    fn end_phase(&mut self) -> Result<()> {
        for id in self.cards.ids_sorted() {
            let card = self.card_mut(id)?;
            card.expire_turn_effects();
            card.damage = 0;
        }
        for player in self.players.iter_mut() {
            player.pool.clear();
            player.conquered_this_turn.clear();
        }
        self.logger
            .verbose(LogCategory::Phase, "end of turn: damage healed, pools emptied");
        Ok(())
    }

    /// Set aside up to `max_mulligan` hand cards, draw replacements and put
    /// the set-aside cards on the bottom of the deck
    pub(crate) fn confirm_mulligan(&mut self, player: PlayerId, recycle: Vec<CardId>) -> Result<()> {
        if self.phase() != Phase::Mulligan {
            return Err(DuelError::illegal("mulligans happen before the first turn"));
        }
        if self.player(player)?.mulligan_done {
            return Err(DuelError::illegal(format!(
                "{} already confirmed a mulligan",
                self.player_name(player)
            )));
        }
        if recycle.len() > self.config.max_mulligan {
            return Err(DuelError::illegal(format!(
                "at most {} card(s) may be set aside",
                self.config.max_mulligan
            )));
        }
        for (i, card) in recycle.iter().enumerate() {
            if recycle[..i].contains(card) {
                return Err(DuelError::illegal("a card is listed twice"));
            }
            if !self.player(player)?.zones.hand.contains(*card) {
                return Err(DuelError::illegal(format!("{} is not in hand", card)));
            }
        }

        self.draw_cards(player, recycle.len() as u32)?;
        for card in &recycle {
            self.move_card_to_bottom(*card, Zone::MainDeck)?;
        }
        self.player_mut(player)?.mulligan_done = true;
        self.logger.normal(
            LogCategory::Phase,
            &format!(
                "{} keeps their hand, recycling {} card(s)",
                self.player_name(player),
                recycle.len()
            ),
        );
        Ok(())
    }
}
