//! Deck file loader
//!
//! A deck file is sectioned text:
//!
//! ```text
//! # comment
//! [Legend]
//! 1 Jinx, Loose Cannon
//! [Champion]
//! 1 Jinx, Rebel
//! [Battlefield]
//! 1 The Grand Plaza
//! [Main]
//! 3 Get Excited!
//! [Runes]
//! 6 Fury Rune
//! ```

use crate::{DuelError, Result};
use std::fs;
use std::path::Path;

/// Deck loader for sectioned deck files
pub struct DeckLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Legend,
    Champion,
    Battlefield,
    Main,
    Runes,
}

impl Section {
    fn from_header(header: &str) -> Option<Section> {
        match header.trim().to_lowercase().as_str() {
            "legend" => Some(Section::Legend),
            "champion" => Some(Section::Champion),
            "battlefield" | "battlefields" => Some(Section::Battlefield),
            "main" | "main deck" | "deck" => Some(Section::Main),
            "runes" | "rune deck" => Some(Section::Runes),
            _ => None,
        }
    }
}

impl DeckLoader {
    /// Load a deck from a file
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a deck from its text content
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut deck = DeckList::default();
        let mut section = Section::Main;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Section::from_header(header).ok_or_else(|| {
                    DuelError::InvalidDeckFormat(format!("line {}: unknown section [{}]", number + 1, header))
                })?;
                continue;
            }

            // Format: "3 Card Name"; a bare name counts once
            let entry = match line.split_once(' ') {
                Some((count_str, rest)) if count_str.chars().all(|c| c.is_ascii_digit()) => {
                    let count = count_str.parse::<u8>().map_err(|_| {
                        DuelError::InvalidDeckFormat(format!("line {}: bad count '{}'", number + 1, count_str))
                    })?;
                    DeckEntry {
                        card_name: rest.trim().to_string(),
                        count,
                    }
                }
                _ => DeckEntry {
                    card_name: line.to_string(),
                    count: 1,
                },
            };
            if entry.count == 0 || entry.card_name.is_empty() {
                return Err(DuelError::InvalidDeckFormat(format!("line {}: empty entry", number + 1)));
            }

            match section {
                Section::Legend => deck.legend.push(entry),
                Section::Champion => deck.champion.push(entry),
                Section::Battlefield => deck.battlefields.push(entry),
                Section::Main => deck.main_deck.push(entry),
                Section::Runes => deck.runes.push(entry),
            }
        }

        deck.validate()?;
        Ok(deck)
    }
}

/// Represents a deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// Represents a complete deck list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckList {
    pub legend: Vec<DeckEntry>,
    pub champion: Vec<DeckEntry>,
    pub battlefields: Vec<DeckEntry>,
    pub main_deck: Vec<DeckEntry>,
    pub runes: Vec<DeckEntry>,
}

fn total(entries: &[DeckEntry]) -> usize {
    entries.iter().map(|e| e.count as usize).sum()
}

impl DeckList {
    /// Total cards in the main deck
    pub fn total_cards(&self) -> usize {
        total(&self.main_deck)
    }

    pub fn rune_count(&self) -> usize {
        total(&self.runes)
    }

    /// Structural checks; card names are checked against the database later
    pub fn validate(&self) -> Result<()> {
        if self.main_deck.is_empty() {
            return Err(DuelError::InvalidDeckFormat("Empty deck".to_string()));
        }
        if total(&self.legend) > 1 {
            return Err(DuelError::InvalidDeckFormat("at most one legend".to_string()));
        }
        if total(&self.champion) > 1 {
            return Err(DuelError::InvalidDeckFormat("at most one champion".to_string()));
        }
        if total(&self.battlefields) > 1 {
            return Err(DuelError::InvalidDeckFormat(
                "a duel uses one battlefield per player".to_string(),
            ));
        }
        Ok(())
    }
}
