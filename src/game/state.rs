//! The match aggregate and its zone bookkeeping

use crate::core::{
    Battlefield, BattlefieldId, Card, CardDefinition, CardId, EntityStore, Keyword, Player, PlayerId, PlayerName,
    TriggerKind,
};
use crate::game::chain::{Chain, Window};
use crate::game::combat::CombatState;
use crate::game::decision::PendingDecision;
use crate::game::{queries, GameLogger, LogCategory, MatchConfig, Phase, TurnStructure};
use crate::zones::Zone;
use crate::{DuelError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::collections::VecDeque;
use std::sync::Arc;

/// Complete match state
///
/// The single writer of a duel. All mutation from outside the crate goes
/// through `Match::apply`; everything else here is the bookkeeping the rules
/// modules build on. Cheap enough to clone that intents are applied to a
/// working copy and committed only on success.
#[derive(Debug, Clone)]
pub struct Match {
    /// All cards of the match, referenced everywhere else by id
    pub cards: EntityStore<Card>,

    /// Seat 0 and seat 1
    pub players: [Player; 2],

    pub battlefields: [Battlefield; 2],

    pub turn: TurnStructure,

    pub chain: Chain,

    /// Player currently holding priority
    pub priority: PlayerId,

    /// Consecutive passes since the last announcement or resolution
    pub consecutive_passes: u8,

    /// Open showdown window, if any
    pub window: Option<Window>,

    pub combat: Option<CombatState>,

    /// Contested battlefields waiting for their showdown
    pub pending_contests: VecDeque<BattlefieldId>,

    /// At most one outstanding decision per match
    pub decision: Option<PendingDecision>,

    pub winner: Option<PlayerId>,

    pub config: MatchConfig,

    /// Seeded RNG for shuffles (deterministic replay)
    pub rng: ChaCha12Rng,

    pub logger: GameLogger,

    next_resolution_id: u64,
    next_decision_id: u32,
}

impl Match {
    /// Create an empty two-player match; seat 0 takes the first turn
    pub fn new_two_player(
        player0_name: impl Into<PlayerName>,
        player1_name: impl Into<PlayerName>,
        config: MatchConfig,
    ) -> Self {
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        let rng = ChaCha12Rng::seed_from_u64(config.seed);
        let [bf0, bf1] = BattlefieldId::all();

        Match {
            cards: EntityStore::new(),
            players: [Player::new(p0, player0_name), Player::new(p1, player1_name)],
            battlefields: [Battlefield::new(bf0), Battlefield::new(bf1)],
            turn: TurnStructure::new(p0),
            chain: Chain::new(),
            priority: p0,
            consecutive_passes: 0,
            window: None,
            combat: None,
            pending_contests: VecDeque::new(),
            decision: None,
            winner: None,
            config,
            rng,
            logger: GameLogger::new(),
            next_resolution_id: 1,
            next_decision_id: 1,
        }
    }

    pub fn player_ids(&self) -> [PlayerId; 2] {
        [PlayerId::new(0), PlayerId::new(1)]
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .get(id.index())
            .ok_or(DuelError::EntityNotFound(id.as_u32()))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(id.index())
            .ok_or(DuelError::EntityNotFound(id.as_u32()))
    }

    pub fn opponent(&self, id: PlayerId) -> PlayerId {
        PlayerId::new(1 - (id.as_u32() & 1))
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Result<&mut Card> {
        self.cards.get_mut(id)
    }

    pub fn battlefield(&self, id: BattlefieldId) -> Result<&Battlefield> {
        self.battlefields
            .get(id.index())
            .ok_or_else(|| DuelError::illegal(format!("no such battlefield: {}", id.index())))
    }

    pub fn battlefield_mut(&mut self, id: BattlefieldId) -> Result<&mut Battlefield> {
        self.battlefields
            .get_mut(id.index())
            .ok_or_else(|| DuelError::illegal(format!("no such battlefield: {}", id.index())))
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    pub fn turn_number(&self) -> u32 {
        self.turn.turn_number
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some() || self.turn.phase.is_terminal()
    }

    /// "Name#id" for log lines
    pub fn describe(&self, id: CardId) -> String {
        match self.cards.get(id) {
            Ok(card) => format!("{}#{}", card.name(), id),
            Err(_) => format!("card#{}", id),
        }
    }

    pub fn player_name(&self, id: PlayerId) -> String {
        self.player(id)
            .map(|p| p.name.to_string())
            .unwrap_or_else(|_| format!("player{}", id))
    }

    pub(crate) fn next_resolution_id(&mut self) -> u64 {
        let id = self.next_resolution_id;
        self.next_resolution_id += 1;
        id
    }

    pub(crate) fn next_decision_id(&mut self) -> u32 {
        let id = self.next_decision_id;
        self.next_decision_id += 1;
        id
    }

    /// Create a card owned by `owner` directly in `zone`
    pub fn create_card(&mut self, definition: Arc<CardDefinition>, owner: PlayerId, zone: Zone) -> Result<CardId> {
        self.player(owner)?;
        let id = self.cards.next_id();
        self.cards.insert(id, Card::new(id, definition, owner, zone));
        self.insert_into_zone(id, zone, false)?;
        Ok(id)
    }

    /// Create a token; tokens cease to exist when they leave play
    pub fn create_token(&mut self, definition: Arc<CardDefinition>, owner: PlayerId, zone: Zone) -> Result<CardId> {
        let id = self.create_card(definition, owner, zone)?;
        self.card_mut(id)?.is_token = true;
        Ok(id)
    }

    /// Move a card to another zone; it arrives as a fresh object
    /// (controller, damage, buffs, stun and grants reset)
    pub fn move_card(&mut self, id: CardId, to: Zone) -> Result<()> {
        self.transfer(id, to, false)
    }

    pub fn move_card_to_bottom(&mut self, id: CardId, to: Zone) -> Result<()> {
        self.transfer(id, to, true)
    }

    fn transfer(&mut self, id: CardId, to: Zone, bottom: bool) -> Result<()> {
        let (from, attachments, is_token) = {
            let card = self.card(id)?;
            (card.zone, card.attachments.clone(), card.is_token)
        };
        self.detach_from_zone(id)?;

        // Gear on a unit leaving play returns unattached to its owner's base
        if from.is_in_play() && !to.is_in_play() {
            for gear in attachments {
                let owner = {
                    let g = self.card_mut(gear)?;
                    g.attached_to = None;
                    g.reset_for_zone_change();
                    g.zone = Zone::Base;
                    g.owner
                };
                self.player_mut(owner)?.zones.base.add(gear);
                self.logger
                    .verbose(LogCategory::Event, &format!("{} returns to base", self.describe(gear)));
            }
        }

        if is_token && !to.is_in_play() {
            self.logger
                .verbose(LogCategory::Event, &format!("token {} ceases to exist", self.describe(id)));
            self.cards.remove(id);
            return Ok(());
        }

        {
            let card = self.card_mut(id)?;
            card.reset_for_zone_change();
            card.zone = to;
        }
        self.insert_into_zone(id, to, bottom)
    }

    /// Move a unit between base and battlefields without resetting it
    pub fn relocate_unit(&mut self, id: CardId, to: Zone) -> Result<()> {
        if !to.is_in_play() || to == Zone::Runes {
            return Err(DuelError::invariant(format!("cannot relocate a unit to {:?}", to)));
        }
        self.detach_from_zone(id)?;
        let (controller, attachments) = {
            let card = self.card_mut(id)?;
            card.zone = to;
            (card.controller, card.attachments.clone())
        };
        for gear in attachments {
            self.card_mut(gear)?.zone = to;
        }
        match to {
            Zone::Base => self.player_mut(controller)?.zones.base.add(id),
            Zone::Battlefield(bf) => self.battlefield_mut(bf)?.add_unit(controller, id),
            _ => {}
        }
        Ok(())
    }

    fn detach_from_zone(&mut self, id: CardId) -> Result<()> {
        let (zone, owner, host) = {
            let card = self.card(id)?;
            (card.zone, card.owner, card.attached_to)
        };

        if let Some(host) = host {
            if let Ok(host_card) = self.card_mut(host) {
                host_card.attachments.retain(|g| *g != id);
            }
            self.card_mut(id)?.attached_to = None;
            return Ok(());
        }

        match zone {
            Zone::Base => {
                for player in self.players.iter_mut() {
                    player.zones.base.remove(id);
                }
            }
            Zone::Battlefield(bf) => {
                self.battlefield_mut(bf)?.remove_unit(id);
            }
            Zone::Facedown(bf) => {
                for slot in self.battlefield_mut(bf)?.facedown.iter_mut() {
                    if *slot == Some(id) {
                        *slot = None;
                    }
                }
            }
            Zone::Location(bf) => {
                let battlefield = self.battlefield_mut(bf)?;
                if battlefield.card == Some(id) {
                    battlefield.card = None;
                }
            }
            Zone::Legend => {
                let player = self.player_mut(owner)?;
                if player.legend == Some(id) {
                    player.legend = None;
                }
            }
            Zone::Champion => {
                let player = self.player_mut(owner)?;
                if player.champion == Some(id) {
                    player.champion = None;
                }
            }
            Zone::Chain => {}
            list_zone => {
                if let Some(zone) = self.player_mut(owner)?.zones.get_zone_mut(list_zone) {
                    zone.remove(id);
                }
            }
        }
        Ok(())
    }

    fn insert_into_zone(&mut self, id: CardId, zone: Zone, bottom: bool) -> Result<()> {
        let (owner, controller) = {
            let card = self.card(id)?;
            (card.owner, card.controller)
        };
        match zone {
            Zone::Battlefield(bf) => self.battlefield_mut(bf)?.add_unit(controller, id),
            Zone::Facedown(bf) => {
                let slot = &mut self.battlefield_mut(bf)?.facedown[owner.index()];
                if slot.is_some() {
                    return Err(DuelError::illegal(format!("facedown slot at {} is occupied", bf)));
                }
                *slot = Some(id);
            }
            Zone::Location(bf) => self.battlefield_mut(bf)?.card = Some(id),
            Zone::Legend => self.player_mut(owner)?.legend = Some(id),
            Zone::Champion => {
                let player = self.player_mut(owner)?;
                if player.champion.is_some() {
                    return Err(DuelError::illegal("champion slot is occupied"));
                }
                player.champion = Some(id);
            }
            Zone::Chain => {}
            list_zone => {
                let target = if list_zone == Zone::Base { controller } else { owner };
                let zones = &mut self.player_mut(target)?.zones;
                if let Some(list) = zones.get_zone_mut(list_zone) {
                    if bottom {
                        list.add_to_bottom(id);
                    } else {
                        list.add(id);
                    }
                }
            }
        }
        Ok(())
    }

    /// Attach gear to a unit controlled by the same player
    pub fn attach_gear(&mut self, gear: CardId, unit: CardId) -> Result<()> {
        let unit_zone = {
            let g = self.card(gear)?;
            let u = self.card(unit)?;
            if !g.is_gear() || !u.is_unit() {
                return Err(DuelError::illegal("attach needs a gear and a unit"));
            }
            if !g.is_in_play() || !u.is_in_play() {
                return Err(DuelError::illegal("attach needs both cards in play"));
            }
            if g.controller != u.controller {
                return Err(DuelError::illegal("gear and unit must share a controller"));
            }
            u.zone
        };
        self.detach_from_zone(gear)?;
        {
            let g = self.card_mut(gear)?;
            g.attached_to = Some(unit);
            g.zone = unit_zone;
        }
        self.card_mut(unit)?.attachments.push(gear);
        self.logger.event(&format!(
            "{} is attached to {}",
            self.describe(gear),
            self.describe(unit)
        ));
        Ok(())
    }

    /// Draw `count` cards. Drawing from an empty deck burns out: the discard
    /// pile is shuffled back in and the opponent scores a point.
    ///
    /// Burnout is counted per card: each of the `count` draws that finds the
    /// deck empty awards the opponent 1 point, including when the discard was
    /// empty too and nothing is drawn.
    pub fn draw_cards(&mut self, player: PlayerId, count: u32) -> Result<Vec<CardId>> {
        let mut drawn = Vec::new();
        for _ in 0..count {
            if self.player(player)?.zones.main_deck.is_empty() {
                self.burnout(player)?;
                if self.is_over() {
                    break;
                }
            }
            let top = self.player_mut(player)?.zones.main_deck.draw_top();
            if let Some(card) = top {
                self.card_mut(card)?.zone = Zone::Hand;
                self.player_mut(player)?.zones.hand.add(card);
                drawn.push(card);
            }
        }
        if !drawn.is_empty() {
            self.logger.normal(
                LogCategory::Event,
                &format!("{} draws {} card(s)", self.player_name(player), drawn.len()),
            );
        }
        Ok(drawn)
    }

    fn burnout(&mut self, player: PlayerId) -> Result<()> {
        let recycled: Vec<CardId> = std::mem::take(&mut self.player_mut(player)?.zones.discard.cards);
        for card in &recycled {
            self.card_mut(*card)?.zone = Zone::MainDeck;
        }
        {
            let rng = &mut self.rng;
            let deck = &mut self.players[player.index()].zones.main_deck;
            deck.cards.extend(recycled.iter().copied());
            deck.shuffle(rng);
        }
        self.logger.normal(
            LogCategory::Event,
            &format!(
                "{} burns out: {} card(s) shuffled back into the deck",
                self.player_name(player),
                recycled.len()
            ),
        );
        let opponent = self.opponent(player);
        self.award_points(opponent, 1, "burnout")
    }

    /// Put runes from the top of the rune deck into play
    pub fn channel_runes(&mut self, player: PlayerId, count: u32, exhausted: bool) -> Result<Vec<CardId>> {
        let mut channeled = Vec::new();
        for _ in 0..count {
            let Some(rune) = self.player_mut(player)?.zones.rune_deck.draw_top() else {
                break;
            };
            {
                let card = self.card_mut(rune)?;
                card.reset_for_zone_change();
                card.zone = Zone::Runes;
                card.ready = !exhausted;
            }
            self.player_mut(player)?.zones.runes.add(rune);
            channeled.push(rune);
        }
        self.logger.normal(
            LogCategory::Event,
            &format!("{} channels {} rune(s)", self.player_name(player), channeled.len()),
        );
        Ok(channeled)
    }

    /// Kill a unit or gear: it goes to its owner's discard pile
    pub fn kill_card(&mut self, id: CardId) -> Result<()> {
        let origin = self.card(id)?.zone.battlefield();
        let name = self.describe(id);
        self.queue_triggers(id, TriggerKind::Deathknell, origin)?;
        self.move_card(id, Zone::Discard)?;
        self.logger.event(&format!("{} dies", name));
        Ok(())
    }

    pub fn award_points(&mut self, player: PlayerId, points: u32, reason: &str) -> Result<()> {
        if points == 0 || self.is_over() {
            return Ok(());
        }
        let score = {
            let p = self.player_mut(player)?;
            p.add_points(points);
            p.score
        };
        self.logger.normal(
            LogCategory::Event,
            &format!(
                "{} scores {} ({}), now at {}",
                self.player_name(player),
                points,
                reason,
                score
            ),
        );
        if score >= self.config.victory_score {
            self.declare_winner(player);
        }
        Ok(())
    }

    pub fn declare_winner(&mut self, player: PlayerId) {
        if self.winner.is_some() {
            return;
        }
        self.winner = Some(player);
        self.turn.phase = Phase::GameOver;
        self.logger
            .minimal(LogCategory::Phase, &format!("{} wins the game", self.player_name(player)));
    }

    /// Deterministic re-evaluation of derived facts: lethal damage and
    /// hidden cards at battlefields their owner no longer controls.
    /// Returns true if anything changed.
    pub fn state_based_check(&mut self) -> Result<bool> {
        let mut changed = false;

        let mut lethal = Vec::new();
        for id in self.cards.ids_sorted() {
            let card = self.card(id)?;
            if card.is_unit() && card.is_in_play() && card.damage > 0 {
                let might = queries::effective_might(self, id);
                if card.damage >= might {
                    lethal.push(id);
                }
            }
        }
        for id in lethal {
            self.kill_card(id)?;
            changed = true;
        }

        for bf in BattlefieldId::all() {
            for seat in self.player_ids() {
                let slot = self.battlefield(bf)?.facedown[seat.index()];
                if let Some(hidden) = slot {
                    if !self.battlefield(bf)?.is_controlled_by(seat) {
                        self.logger.event(&format!(
                            "{} loses {} and its hidden card is discarded",
                            self.player_name(seat),
                            bf
                        ));
                        self.move_card(hidden, Zone::Discard)?;
                        changed = true;
                    }
                }
            }
        }
        Ok(changed)
    }

    /// Units controlled by `player` with the given keyword, at start of turn
    pub(crate) fn temporary_units(&self, player: PlayerId) -> Vec<CardId> {
        queries::units_in_play(self, player)
            .into_iter()
            .filter(|id| queries::has_keyword(self, *id, &Keyword::Temporary))
            .collect()
    }
}
