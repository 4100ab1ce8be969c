//! Player representation

use crate::core::{BattlefieldId, CardId, PlayerId, PlayerName, ResourcePool};
use crate::zones::PlayerZones;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    pub name: PlayerName,

    pub score: u32,

    /// Current resource pool (energy + per-domain power)
    pub pool: ResourcePool,

    pub zones: PlayerZones,

    pub legend: Option<CardId>,

    /// Champion slot (at most one card)
    pub champion: Option<CardId>,

    pub mulligan_done: bool,

    /// Number of channel phases this player has had
    pub channels_taken: u32,

    /// Battlefields already scored by conquest this turn
    pub conquered_this_turn: SmallVec<[BattlefieldId; 2]>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        Player {
            id,
            name: name.into(),
            score: 0,
            pool: ResourcePool::new(),
            zones: PlayerZones::new(id),
            legend: None,
            champion: None,
            mulligan_done: false,
            channels_taken: 0,
            conquered_this_turn: SmallVec::new(),
        }
    }

    pub fn hand_size(&self) -> usize {
        self.zones.hand.len()
    }

    pub fn add_points(&mut self, points: u32) {
        self.score += points;
    }

    /// Record a conquest; returns false if this battlefield already scored
    /// by conquest this turn
    pub fn note_conquest(&mut self, battlefield: BattlefieldId) -> bool {
        if self.conquered_this_turn.contains(&battlefield) {
            return false;
        }
        self.conquered_this_turn.push(battlefield);
        true
    }
}
