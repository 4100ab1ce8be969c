//! Strongly-typed wrappers for game concepts
//!
//! Newtypes keep card names, player names and the small fixed-range indices
//! (battlefields, chain items, decisions) from being mixed up with each other.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card name (e.g., "Jinx, Rebel")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardName(String);

impl CardName {
    pub fn new(s: impl Into<String>) -> Self {
        CardName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key: ASCII-folded, lowercase, single-spaced
    pub fn lookup_key(&self) -> String {
        normalize_name(&self.0)
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardName {
    fn from(s: &str) -> Self {
        CardName(s.to_string())
    }
}

impl From<String> for CardName {
    fn from(s: String) -> Self {
        CardName(s)
    }
}

/// Normalize a card name for case- and accent-insensitive lookup
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(name)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Player name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: impl Into<String>) -> Self {
        PlayerName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(s: &str) -> Self {
        PlayerName(s.to_string())
    }
}

/// One of the two battlefields of a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattlefieldId(u8);

impl BattlefieldId {
    pub const COUNT: usize = 2;

    pub fn new(idx: u8) -> Self {
        BattlefieldId(idx)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn all() -> [BattlefieldId; 2] {
        [BattlefieldId(0), BattlefieldId(1)]
    }
}

impl fmt::Display for BattlefieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "battlefield {}", self.0)
    }
}

/// Identifier of an item on the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainItemId(u32);

impl ChainItemId {
    pub fn new(id: u32) -> Self {
        ChainItemId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChainItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// Identifier of a pending decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(u32);

impl DecisionId {
    pub fn new(id: u32) -> Self {
        DecisionId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decision#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_name_lookup_key_folds_accents_and_case() {
        let name = CardName::new("  Kai'Sa,   Évolutionnaire ");
        assert_eq!(name.lookup_key(), "kai'sa, evolutionnaire");
    }

    #[test]
    fn test_battlefield_ids() {
        let [a, b] = BattlefieldId::all();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(format!("{}", b), "battlefield 1");
    }
}
