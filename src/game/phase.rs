//! Turn phases

use crate::core::PlayerId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Pre-game hand selection (once per match)
    Mulligan,
    /// Ready the active player's permanents, expire stuns
    Ready,
    /// Score held battlefields
    Scoring,
    /// Channel runes from the rune deck
    Channel,
    Draw,
    /// Main phase: plays, moves, abilities
    Action,
    /// Cleanup
    End,
    /// Terminal
    GameOver,
}

impl Phase {
    /// Next phase in turn order; End wraps to the next turn's Ready
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Mulligan => Some(Phase::Ready),
            Phase::Ready => Some(Phase::Scoring),
            Phase::Scoring => Some(Phase::Channel),
            Phase::Channel => Some(Phase::Draw),
            Phase::Draw => Some(Phase::Action),
            Phase::Action => Some(Phase::End),
            Phase::End => Some(Phase::Ready),
            Phase::GameOver => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Phase::GameOver
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Mulligan => "Mulligan",
            Phase::Ready => "Ready",
            Phase::Scoring => "Scoring",
            Phase::Channel => "Channel",
            Phase::Draw => "Draw",
            Phase::Action => "Action",
            Phase::End => "End",
            Phase::GameOver => "Game Over",
        };
        write!(f, "{}", name)
    }
}

/// Tracks the current turn, phase and active player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    pub turn_number: u32,
    pub phase: Phase,
    pub active_player: PlayerId,
    /// Player who took the first turn of the match
    pub starting_player: PlayerId,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            phase: Phase::Mulligan,
            active_player: starting_player,
            starting_player,
        }
    }

    /// Step to the next phase. Leaving End starts a new turn for `next_player`.
    /// Returns the phase entered.
    pub fn advance(&mut self, next_player: PlayerId) -> Phase {
        match self.phase {
            Phase::End => {
                self.turn_number += 1;
                self.active_player = next_player;
                self.phase = Phase::Ready;
            }
            Phase::GameOver => {}
            other => {
                if let Some(next) = other.next() {
                    self.phase = next;
                }
            }
        }
        self.phase
    }

    pub fn is_first_turn_of(&self, player: PlayerId) -> bool {
        if player == self.starting_player {
            self.turn_number == 1
        } else {
            self.turn_number == 2
        }
    }
}
