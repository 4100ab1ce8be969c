//! Keywords: short tags on a card that modify a generic rule

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    /// May pay 1 energy + 1 matching power to enter play ready
    Accelerate,
    /// Playable while a showdown window is open
    Action,
    /// Playable at any time the player has priority, even onto a closed chain
    Reaction,
    /// May be hidden facedown at a controlled battlefield
    Hidden,
    Legion,
    /// +N might while attacking
    Assault(u32),
    /// +N might while defending
    Shield(u32),
    /// Must receive lethal combat damage before other units
    Tank,
    /// Opponents pay N extra power to target this
    Deflect(u32),
    /// May move from battlefield to battlefield
    Ganking,
    /// Killed at the start of its controller's turn
    Temporary,
    Deathknell,
    Vision,
    /// Attach cost for gear
    Equip(u32),
    Other(String),
}

impl Keyword {
    /// Parse keyword text such as "Assault 2", "[Tank]" or "Shield"
    pub fn parse(text: &str) -> Keyword {
        let cleaned = text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim()
            .to_lowercase();
        let mut parts = cleaned.split_whitespace();
        let head = parts.next().unwrap_or("");
        let amount = parts.next().and_then(|n| n.trim_start_matches('+').parse::<u32>().ok());

        match head {
            "accelerate" => Keyword::Accelerate,
            "action" => Keyword::Action,
            "reaction" => Keyword::Reaction,
            "hidden" => Keyword::Hidden,
            "legion" => Keyword::Legion,
            "assault" => Keyword::Assault(amount.unwrap_or(1)),
            "shield" => Keyword::Shield(amount.unwrap_or(1)),
            "tank" => Keyword::Tank,
            "deflect" => Keyword::Deflect(amount.unwrap_or(1)),
            "ganking" => Keyword::Ganking,
            "temporary" => Keyword::Temporary,
            "deathknell" => Keyword::Deathknell,
            "vision" => Keyword::Vision,
            "equip" => Keyword::Equip(amount.unwrap_or(1)),
            _ => Keyword::Other(cleaned),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Keyword::Accelerate => "Accelerate",
            Keyword::Action => "Action",
            Keyword::Reaction => "Reaction",
            Keyword::Hidden => "Hidden",
            Keyword::Legion => "Legion",
            Keyword::Assault(_) => "Assault",
            Keyword::Shield(_) => "Shield",
            Keyword::Tank => "Tank",
            Keyword::Deflect(_) => "Deflect",
            Keyword::Ganking => "Ganking",
            Keyword::Temporary => "Temporary",
            Keyword::Deathknell => "Deathknell",
            Keyword::Vision => "Vision",
            Keyword::Equip(_) => "Equip",
            Keyword::Other(s) => s,
        }
    }

    /// Same keyword regardless of its numeric parameter
    pub fn same_kind(&self, other: &Keyword) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
            && match (self, other) {
                (Keyword::Other(a), Keyword::Other(b)) => a == b,
                _ => true,
            }
    }

    pub fn amount(&self) -> u32 {
        match self {
            Keyword::Assault(n) | Keyword::Shield(n) | Keyword::Deflect(n) | Keyword::Equip(n) => *n,
            _ => 0,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Assault(n) | Keyword::Shield(n) | Keyword::Deflect(n) | Keyword::Equip(n) => {
                write!(f, "{} {}", self.name(), n)
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// How long a granted or removed keyword lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    ThisTurn,
    Permanent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameterized_keywords() {
        assert_eq!(Keyword::parse("Assault 2"), Keyword::Assault(2));
        assert_eq!(Keyword::parse("[Shield]"), Keyword::Shield(1));
        assert_eq!(Keyword::parse("deflect"), Keyword::Deflect(1));
        assert_eq!(Keyword::parse("Equip 3"), Keyword::Equip(3));
        assert_eq!(Keyword::parse("TANK"), Keyword::Tank);
    }

    #[test]
    fn test_unknown_keyword_is_preserved() {
        assert_eq!(Keyword::parse("Mighty"), Keyword::Other("mighty".to_string()));
    }

    #[test]
    fn test_same_kind_ignores_amount() {
        assert!(Keyword::Assault(1).same_kind(&Keyword::Assault(3)));
        assert!(!Keyword::Assault(1).same_kind(&Keyword::Shield(1)));
        assert!(!Keyword::Other("a".into()).same_kind(&Keyword::Other("b".into())));
    }

    #[test]
    fn test_display() {
        assert_eq!(Keyword::Assault(2).to_string(), "Assault 2");
        assert_eq!(Keyword::Ganking.to_string(), "Ganking");
    }
}
