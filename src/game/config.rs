//! Match configuration

use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens when both sides still have units after combat damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TiePolicy {
    /// Defender keeps control; attacking units return to base exhausted
    #[default]
    RecallAttacker,
    /// Both sides return to base exhausted; control is unchanged
    RecallBoth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Points needed to win
    pub victory_score: u32,

    pub starting_hand: usize,

    /// Cards a player may set aside during the mulligan
    pub max_mulligan: usize,

    pub runes_per_channel: u32,

    /// Extra runes on the non-starting player's first channel phase
    pub second_player_bonus_runes: u32,

    pub draws_per_turn: u32,

    pub tie_policy: TiePolicy,

    /// Seed for deck shuffles and burnout reshuffles
    pub seed: u64,

    pub shuffle_decks: bool,

    /// Upper bound on producers the auto-pay planner enumerates
    pub planner_candidate_cap: usize,

    /// Answer player decisions with deterministic defaults instead of
    /// suspending (for unattended simulations)
    pub auto_decisions: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            victory_score: 8,
            starting_hand: 4,
            max_mulligan: 2,
            runes_per_channel: 2,
            second_player_bonus_runes: 1,
            draws_per_turn: 1,
            tie_policy: TiePolicy::default(),
            seed: 0,
            shuffle_decks: true,
            planner_candidate_cap: 12,
            auto_decisions: false,
        }
    }
}

impl MatchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.victory_score == 0 {
            return Err(DuelError::SerializationError(
                "victory_score must be positive".to_string(),
            ));
        }
        if self.max_mulligan > self.starting_hand {
            return Err(DuelError::SerializationError(format!(
                "max_mulligan {} exceeds starting_hand {}",
                self.max_mulligan, self.starting_hand
            )));
        }
        Ok(())
    }
}
