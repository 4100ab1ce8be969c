//! Card database built from normalized JSON card records

use crate::core::card::CardRecord;
use crate::core::types::normalize_name;
use crate::core::CardDefinition;
use crate::{DuelError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Card database, keyed by normalized card name
///
/// Names are folded with `normalize_name`, so "Jinx, Rebel", "jinx,  rebel"
/// and accented variants all find the same definition.
pub struct CardDatabase {
    cards: HashMap<String, Arc<CardDefinition>>,
}

impl CardDatabase {
    pub fn new() -> Self {
        CardDatabase { cards: HashMap::new() }
    }

    /// Load a JSON array of card records from disk
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a JSON array of card records
    ///
    /// Any record that cannot be converted fails the whole load; a database
    /// with silently missing cards would only fail later, at deck building.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<CardRecord> = serde_json::from_str(json)?;
        let mut db = CardDatabase::new();
        for record in &records {
            db.add_card(CardDefinition::from_record(record)?);
        }
        Ok(db)
    }

    /// Add a card to the database. A later card with the same name replaces
    /// the earlier one.
    pub fn add_card(&mut self, card: CardDefinition) {
        let key = card.name.lookup_key();
        self.cards.insert(key, card.into_shared());
    }

    pub fn get_card(&self, name: &str) -> Option<Arc<CardDefinition>> {
        self.cards.get(&normalize_name(name)).cloned()
    }

    /// Look a card up, failing with a deck-format error naming the card
    pub fn require(&self, name: &str) -> Result<Arc<CardDefinition>> {
        self.get_card(name)
            .ok_or_else(|| DuelError::InvalidDeckFormat(format!("Card not found in database: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card names in sorted order (for listings)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cards.values().map(|c| c.name.to_string()).collect();
        names.sort();
        names
    }
}

impl Default for CardDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardType, Domain, Keyword};

    const RECORDS: &str = r#"[
        {
            "id": "OGN-001",
            "name": "Jinx, Rebel",
            "type": "Champion Unit",
            "domains": ["Fury", "Chaos"],
            "cost": {"energy": 4, "power": "CC"},
            "might": 4,
            "ability": {"trigger": "When you play me", "effect": "Deal 2 to all enemy units here.", "keywords": ["Assault 2"]},
            "tags": ["Champion"]
        },
        {
            "id": "OGN-002",
            "name": "Fury Rune",
            "type": "Rune",
            "domain": "Fury"
        }
    ]"#;

    #[test]
    fn test_empty_database() {
        let db = CardDatabase::new();
        assert_eq!(db.len(), 0);
        assert!(db.is_empty());
    }

    #[test]
    fn test_manual_add() {
        let mut db = CardDatabase::new();
        db.add_card(CardDefinition::new("t-1", "Test Soldier", CardType::Unit).with_might(2));

        assert_eq!(db.len(), 1);
        assert!(db.contains("Test Soldier"));
        assert!(db.contains("test soldier"));
        assert!(db.get_card("Test Soldier").is_some());
    }

    #[test]
    fn test_from_json_records() {
        let db = CardDatabase::from_json(RECORDS).unwrap();
        assert_eq!(db.len(), 2);

        let jinx = db.get_card("jinx,   REBEL").unwrap();
        assert_eq!(jinx.card_type, CardType::Unit);
        assert_eq!(jinx.energy, 4);
        assert_eq!(jinx.power, 2);
        assert_eq!(jinx.might, 4);
        assert!(jinx.domains.contains(&Domain::Fury));
        assert!(jinx.has_keyword(&Keyword::Assault(2)));
        assert!(jinx.is_champion());

        let rune = db.get_card("Fury Rune").unwrap();
        assert!(rune.is_rune());
        assert_eq!(db.names(), vec!["Fury Rune".to_string(), "Jinx, Rebel".to_string()]);
    }

    #[test]
    fn test_bad_record_fails_load() {
        let json = r#"[{"id": "X", "name": "Mystery", "type": "Artifact"}]"#;
        assert!(matches!(
            CardDatabase::from_json(json),
            Err(DuelError::InvalidCardRecord(_))
        ));
    }

    #[test]
    fn test_require_names_missing_card() {
        let db = CardDatabase::new();
        let err = db.require("Nonexistent Card").unwrap_err();
        assert!(err.to_string().contains("Nonexistent Card"));
    }
}
