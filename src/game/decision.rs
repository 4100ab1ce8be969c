//! Suspended effect resolution
//!
//! An effect that needs a player's choice stops and leaves a
//! `PendingDecision` behind. The decision carries a `ResumeToken` telling the
//! engine where to continue once it is answered; everything needed to resume
//! is plain serializable data.

use crate::core::{BattlefieldId, CardId, ChainItemId, DecisionId, EffectClause, PlayerId, TargetRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shape of the answer a decision expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    YesNo,
    Number { min: u32, max: u32 },
    /// Pick one card from the listed hand cards
    HandCard { options: Vec<CardId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionAnswer {
    YesNo(bool),
    Number(u32),
    Card(CardId),
}

impl DecisionKind {
    pub fn accepts(&self, answer: &DecisionAnswer) -> bool {
        match (self, answer) {
            (DecisionKind::YesNo, DecisionAnswer::YesNo(_)) => true,
            (DecisionKind::Number { min, max }, DecisionAnswer::Number(n)) => n >= min && n <= max,
            (DecisionKind::HandCard { options }, DecisionAnswer::Card(c)) => options.contains(c),
            _ => false,
        }
    }

    /// Deterministic answer used when decisions are automated
    pub fn default_answer(&self) -> DecisionAnswer {
        match self {
            DecisionKind::YesNo => DecisionAnswer::YesNo(true),
            DecisionKind::Number { max, .. } => DecisionAnswer::Number(*max),
            DecisionKind::HandCard { options } => match options.first() {
                Some(card) => DecisionAnswer::Card(*card),
                None => DecisionAnswer::Number(0),
            },
        }
    }
}

impl fmt::Display for DecisionAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionAnswer::YesNo(true) => write!(f, "yes"),
            DecisionAnswer::YesNo(false) => write!(f, "no"),
            DecisionAnswer::Number(n) => write!(f, "{}", n),
            DecisionAnswer::Card(c) => write!(f, "card {}", c),
        }
    }
}

/// A choice an effect handler could not make on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub player: PlayerId,
    pub prompt: String,
    pub kind: DecisionKind,
    /// "{resolution id}:{clause}:{suffix}"
    pub key: String,
}

/// Where effect resolution stands for one ability
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolutionProgress {
    pub resolution_id: u64,
    /// First clause not yet completed
    pub next_clause: usize,
    pub answers: BTreeMap<String, DecisionAnswer>,
    /// Resolution has begun (targets already re-checked)
    pub started: bool,
    /// At least one clause changed the match
    pub any_effect: bool,
}

impl ResolutionProgress {
    pub fn new(resolution_id: u64) -> Self {
        ResolutionProgress {
            resolution_id,
            ..Default::default()
        }
    }

    pub fn key(&self, clause: usize, suffix: &str) -> String {
        format!("{}:{}:{}", self.resolution_id, clause, suffix)
    }
}

/// An ability resolved without the chain (resource abilities)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectEffect {
    pub controller: PlayerId,
    pub source: Option<CardId>,
    pub clauses: Vec<EffectClause>,
    pub targets: Vec<TargetRef>,
    pub origin: Option<BattlefieldId>,
    pub progress: ResolutionProgress,
}

/// Continuation stored with a pending decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumeToken {
    ResumeChainItem(ChainItemId),
    ResumeDirectEffect(Box<DirectEffect>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecision {
    pub id: DecisionId,
    pub player: PlayerId,
    pub prompt: String,
    pub kind: DecisionKind,
    pub key: String,
    pub resume: ResumeToken,
}

impl PendingDecision {
    pub fn from_request(id: DecisionId, request: DecisionRequest, resume: ResumeToken) -> Self {
        PendingDecision {
            id,
            player: request.player,
            prompt: request.prompt,
            kind: request.kind,
            key: request.key,
            resume,
        }
    }
}
