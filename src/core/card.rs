//! Card records, definitions and in-match card instances

use crate::core::{CardId, CardName, Domain, DomainSet, Duration, Keyword, PlayerId};
use crate::zones::Zone;
use crate::{DuelError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Unit,
    Spell,
    Gear,
    Rune,
    Battlefield,
    Legend,
}

impl CardType {
    pub fn parse(text: &str) -> Option<CardType> {
        let lowered = text.trim().to_lowercase();
        // Type lines may carry supertypes ("Champion Unit", "Signature Spell")
        let last = lowered.split_whitespace().last().unwrap_or("");
        match last {
            "unit" => Some(CardType::Unit),
            "spell" => Some(CardType::Spell),
            "gear" => Some(CardType::Gear),
            "rune" => Some(CardType::Rune),
            "battlefield" => Some(CardType::Battlefield),
            "legend" => Some(CardType::Legend),
            _ => None,
        }
    }
}

/// Normalized card record, as produced by the external card-data pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", alias = "type_line")]
    pub card_type: String,
    #[serde(default, alias = "domain")]
    pub domains: OneOrMany,
    #[serde(default)]
    pub cost: RecordCost,
    #[serde(default)]
    pub might: Option<u32>,
    #[serde(default)]
    pub ability: RecordAbility,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordCost {
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub power: PowerValue,
}

/// Power cost: either a number or a run of `C` symbols ("CC" = 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PowerValue {
    Count(u32),
    Symbols(String),
}

impl Default for PowerValue {
    fn default() -> Self {
        PowerValue::Count(0)
    }
}

impl PowerValue {
    pub fn amount(&self) -> Option<u32> {
        match self {
            PowerValue::Count(n) => Some(*n),
            PowerValue::Symbols(s) => {
                let s = s.trim();
                if s.is_empty() || s == "-" {
                    Some(0)
                } else if s.chars().all(|c| c.eq_ignore_ascii_case(&'c')) {
                    Some(s.len() as u32)
                } else {
                    s.parse().ok()
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordAbility {
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A field that is either a single string or a list of strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn items(&self) -> Vec<&str> {
        match self {
            OneOrMany::One(s) => s.split(['/', ',']).map(str::trim).collect(),
            OneOrMany::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Immutable per-card data shared by every copy of a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: String,
    pub name: CardName,
    pub card_type: CardType,
    pub domains: SmallVec<[Domain; 2]>,
    pub energy: u32,
    pub power: u32,
    pub might: u32,
    pub keywords: SmallVec<[Keyword; 4]>,
    /// Ability trigger text ("When you play me", "Exhaust", ...)
    pub trigger: String,
    /// Ability effect text
    pub effect: String,
    pub raw_text: String,
    pub tags: SmallVec<[String; 2]>,
}

impl CardDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<CardName>, card_type: CardType) -> Self {
        CardDefinition {
            id: id.into(),
            name: name.into(),
            card_type,
            domains: SmallVec::new(),
            energy: 0,
            power: 0,
            might: 0,
            keywords: SmallVec::new(),
            trigger: String::new(),
            effect: String::new(),
            raw_text: String::new(),
            tags: SmallVec::new(),
        }
    }

    /// Convert a normalized record, rejecting records the engine cannot use
    pub fn from_record(record: &CardRecord) -> Result<Self> {
        if record.name.trim().is_empty() {
            return Err(DuelError::InvalidCardRecord(format!(
                "record '{}' has no name",
                record.id
            )));
        }
        let card_type = CardType::parse(&record.card_type).ok_or_else(|| {
            DuelError::InvalidCardRecord(format!(
                "unknown card type '{}' for {}",
                record.card_type, record.name
            ))
        })?;

        let mut domains = SmallVec::new();
        for item in record.domains.items() {
            if item.is_empty() || item.eq_ignore_ascii_case("colorless") {
                continue;
            }
            let domain = Domain::from_name(item).ok_or_else(|| {
                DuelError::InvalidCardRecord(format!("unknown domain '{}' for {}", item, record.name))
            })?;
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }

        let power = record.cost.power.amount().ok_or_else(|| {
            DuelError::InvalidCardRecord(format!("bad power cost {:?} for {}", record.cost.power, record.name))
        })?;

        if card_type == CardType::Unit && record.might.is_none() {
            return Err(DuelError::InvalidCardRecord(format!(
                "unit {} has no might",
                record.name
            )));
        }

        Ok(CardDefinition {
            id: record.id.clone(),
            name: CardName::new(record.name.trim()),
            card_type,
            domains,
            energy: record.cost.energy,
            power,
            might: record.might.unwrap_or(0),
            keywords: record.ability.keywords.iter().map(|k| Keyword::parse(k)).collect(),
            trigger: record.ability.trigger.clone(),
            effect: record.ability.effect.clone(),
            raw_text: record.ability.raw.clone(),
            tags: record.tags.iter().map(|t| t.to_lowercase()).collect(),
        })
    }

    pub fn with_cost(mut self, energy: u32, power: u32) -> Self {
        self.energy = energy;
        self.power = power;
        self
    }

    pub fn with_might(mut self, might: u32) -> Self {
        self.might = might;
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domains.push(domain);
        self
    }

    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.push(keyword);
        self
    }

    pub fn with_ability(mut self, trigger: impl Into<String>, effect: impl Into<String>) -> Self {
        self.trigger = trigger.into();
        self.effect = effect.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into().to_lowercase());
        self
    }

    pub fn into_shared(self) -> Arc<CardDefinition> {
        Arc::new(self)
    }

    pub fn domain_set(&self) -> DomainSet {
        self.domains.iter().copied().collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_champion(&self) -> bool {
        self.has_tag("champion")
    }

    pub fn has_keyword(&self, keyword: &Keyword) -> bool {
        self.keywords.iter().any(|k| k.same_kind(keyword))
    }

    pub fn is_unit(&self) -> bool {
        self.card_type == CardType::Unit
    }

    pub fn is_gear(&self) -> bool {
        self.card_type == CardType::Gear
    }

    pub fn is_spell(&self) -> bool {
        self.card_type == CardType::Spell
    }

    pub fn is_rune(&self) -> bool {
        self.card_type == CardType::Rune
    }
}

/// A physical copy of a card during a match
///
/// Everything below `zone` is in-play state and is reset whenever the card
/// changes zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,

    pub definition: Arc<CardDefinition>,

    pub owner: PlayerId,

    /// Current controller (can differ from owner)
    pub controller: PlayerId,

    pub zone: Zone,

    pub ready: bool,

    /// Permanent buff counter (a unit holds at most one)
    pub buff: u8,

    /// Might bonus (or penalty) until end of turn
    pub temp_might: i32,

    /// Might modifier that lasts while the card stays in play
    pub might_bonus: i32,

    pub damage: u32,

    /// Turn number at which the stun wears off
    pub stunned_until: Option<u32>,

    /// Gear attached to this unit
    pub attachments: SmallVec<[CardId; 2]>,

    /// Unit this gear is attached to
    pub attached_to: Option<CardId>,

    pub granted: SmallVec<[(Keyword, Duration); 2]>,

    pub removed: SmallVec<[(Keyword, Duration); 1]>,

    /// Turn the card was hidden facedown (cannot be revealed the same turn)
    pub hidden_on_turn: Option<u32>,

    pub is_token: bool,

    /// Bumped on every zone change; a card that left and came back is a new
    /// object to anything that remembered the old value
    #[serde(default)]
    pub generation: u32,
}

impl Card {
    pub fn new(id: CardId, definition: Arc<CardDefinition>, owner: PlayerId, zone: Zone) -> Self {
        Card {
            id,
            definition,
            owner,
            controller: owner,
            zone,
            ready: true,
            buff: 0,
            temp_might: 0,
            might_bonus: 0,
            damage: 0,
            stunned_until: None,
            attachments: SmallVec::new(),
            attached_to: None,
            granted: SmallVec::new(),
            removed: SmallVec::new(),
            hidden_on_turn: None,
            is_token: false,
            generation: 0,
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name.as_str()
    }

    pub fn card_type(&self) -> CardType {
        self.definition.card_type
    }

    pub fn is_unit(&self) -> bool {
        self.definition.is_unit()
    }

    pub fn is_gear(&self) -> bool {
        self.definition.is_gear()
    }

    pub fn is_in_play(&self) -> bool {
        self.zone.is_in_play()
    }

    pub fn is_stunned(&self, turn: u32) -> bool {
        self.stunned_until.is_some_and(|until| turn < until)
    }

    pub fn exhaust(&mut self) {
        self.ready = false;
    }

    pub fn ready_up(&mut self) {
        self.ready = true;
    }

    /// Add a buff; returns false when the unit is already buffed
    pub fn add_buff(&mut self) -> bool {
        if self.buff >= 1 {
            return false;
        }
        self.buff = 1;
        true
    }

    /// Keywords printed on the card plus grants, minus removals
    /// (attachments are folded in by the query layer)
    pub fn own_keywords(&self) -> SmallVec<[Keyword; 4]> {
        let mut keywords: SmallVec<[Keyword; 4]> = self
            .definition
            .keywords
            .iter()
            .chain(self.granted.iter().map(|(k, _)| k))
            .cloned()
            .collect();
        keywords.retain(|k| !self.removed.iter().any(|(r, _)| r.same_kind(k)));
        keywords
    }

    /// Drop this-turn grants and bonuses (end of turn cleanup)
    pub fn expire_turn_effects(&mut self) {
        self.temp_might = 0;
        self.granted.retain(|(_, d)| *d == Duration::Permanent);
        self.removed.retain(|(_, d)| *d == Duration::Permanent);
    }

    /// Reset all in-play attributes (the card changed zone)
    pub fn reset_for_zone_change(&mut self) {
        self.controller = self.owner;
        self.ready = true;
        self.buff = 0;
        self.temp_might = 0;
        self.might_bonus = 0;
        self.damage = 0;
        self.stunned_until = None;
        self.attachments.clear();
        self.attached_to = None;
        self.granted.clear();
        self.removed.clear();
        self.hidden_on_turn = None;
        self.generation = self.generation.wrapping_add(1);
    }
}
