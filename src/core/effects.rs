//! Effect primitives produced by the ability-text classifier
//!
//! Ability text is classified once into these tagged variants; execution is a
//! match over the variant and never looks at the text again.

use crate::core::{BattlefieldId, CardId, Domain, Duration, Keyword};
use serde::{Deserialize, Serialize};

/// A chosen target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetRef {
    Card(CardId),
    Battlefield(BattlefieldId),
}

impl TargetRef {
    pub fn card(&self) -> Option<CardId> {
        match self {
            TargetRef::Card(id) => Some(*id),
            TargetRef::Battlefield(_) => None,
        }
    }

    pub fn battlefield(&self) -> Option<BattlefieldId> {
        match self {
            TargetRef::Battlefield(bf) => Some(*bf),
            TargetRef::Card(_) => None,
        }
    }
}

/// Friend/foe filter relative to the acting player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Friendly,
    Enemy,
    Any,
}

/// Which cards an effect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// Every chosen card target
    Targets,
    FirstTarget,
    SecondTarget,
    /// The source card itself ("me", "this")
    This,
    /// Units at the battlefield the ability originated from
    AllHere(Side),
    /// Units at the chosen battlefield target
    AllAtTargetBattlefield(Side),
    /// Units anywhere in play
    AllUnits(Side),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    Fixed(u32),
    /// Equal to the source card's might
    SourceMight,
    /// Equal to the first target's might
    FirstTargetMight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Base,
    /// The battlefield the ability originated from
    Here,
}

/// Domain of added power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSource {
    Domain(Domain),
    /// First domain of the source card
    SourceDomain,
    /// Chosen by the controller when resolving
    AnyDomain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPrimitive {
    Draw { count: u32 },
    /// Draw a chosen number of cards between 0 and `max`
    DrawUpTo { max: u32 },
    /// The controller discards `count` cards of their choice
    Discard { count: u32 },
    AddEnergy { amount: u32 },
    AddPower { source: PowerSource, amount: u32 },
    ChannelRunes { count: u32, exhausted: bool },
    CreateUnitToken { count: u32, might: u32, name: String, at: Destination },
    CreateGearToken { count: u32, name: String },
    GrantKeyword { selector: Selector, keyword: Keyword, duration: Duration },
    RemoveKeyword { selector: Selector, keyword: Keyword, duration: Duration },
    Stun { selector: Selector },
    Ready { selector: Selector },
    Exhaust { selector: Selector },
    Buff { selector: Selector },
    Might { selector: Selector, delta: i32, duration: Duration },
    Move { selector: Selector, to: Destination },
    ReturnToHand { selector: Selector },
    Kill { selector: Selector, max_might: Option<u32> },
    Banish { selector: Selector },
    Damage { selector: Selector, amount: Amount },
    Heal { selector: Selector },
    /// First target and second target deal damage equal to their might to each other
    Fight,
    /// Attach the gear target to the unit target
    Attach,
    Score { points: u32 },
    /// Put cards on the bottom of their owner's main deck
    RecycleToDeck { selector: Selector },
    /// "You may ..." wrapper; asks the controller first
    Optional(Box<EffectPrimitive>),
    Unsupported(String),
}

impl EffectPrimitive {
    pub fn is_supported(&self) -> bool {
        match self {
            EffectPrimitive::Unsupported(_) => false,
            EffectPrimitive::Optional(inner) => inner.is_supported(),
            _ => true,
        }
    }

    /// Only produces resources; such abilities resolve without the chain
    pub fn is_resource_only(&self) -> bool {
        match self {
            EffectPrimitive::AddEnergy { .. } | EffectPrimitive::AddPower { .. } => true,
            EffectPrimitive::Optional(inner) => inner.is_resource_only(),
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            EffectPrimitive::Draw { .. } => "draw",
            EffectPrimitive::DrawUpTo { .. } => "draw_up_to",
            EffectPrimitive::Discard { .. } => "discard",
            EffectPrimitive::AddEnergy { .. } => "add_energy",
            EffectPrimitive::AddPower { .. } => "add_power",
            EffectPrimitive::ChannelRunes { .. } => "channel",
            EffectPrimitive::CreateUnitToken { .. } => "unit_token",
            EffectPrimitive::CreateGearToken { .. } => "gear_token",
            EffectPrimitive::GrantKeyword { .. } => "grant",
            EffectPrimitive::RemoveKeyword { .. } => "remove_keyword",
            EffectPrimitive::Stun { .. } => "stun",
            EffectPrimitive::Ready { .. } => "ready",
            EffectPrimitive::Exhaust { .. } => "exhaust",
            EffectPrimitive::Buff { .. } => "buff",
            EffectPrimitive::Might { .. } => "might",
            EffectPrimitive::Move { .. } => "move",
            EffectPrimitive::ReturnToHand { .. } => "return",
            EffectPrimitive::Kill { .. } => "kill",
            EffectPrimitive::Banish { .. } => "banish",
            EffectPrimitive::Damage { .. } => "damage",
            EffectPrimitive::Heal { .. } => "heal",
            EffectPrimitive::Fight => "fight",
            EffectPrimitive::Attach => "attach",
            EffectPrimitive::Score { .. } => "score",
            EffectPrimitive::RecycleToDeck { .. } => "recycle",
            EffectPrimitive::Optional(_) => "optional",
            EffectPrimitive::Unsupported(_) => "unsupported",
        }
    }
}

/// One classified sentence of ability text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectClause {
    pub text: String,
    pub primitive: EffectPrimitive,
}

/// Events that fire triggered abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    OnPlay,
    OnConquer,
    OnHold,
    OnAttack,
    OnDefend,
    Deathknell,
    StartOfTurn,
}

/// Cost paid to activate an ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivationCost {
    pub exhaust: bool,
    pub energy: u32,
    pub power: u32,
    pub kill_self: bool,
}

/// Speed at which something may be played or activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Speed {
    /// Own turn, action phase, nothing open
    Normal,
    /// Also inside an open showdown window
    Action,
    /// Also onto a closed chain
    Reaction,
}

/// How an ability's text is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTiming {
    /// No ability text
    None,
    /// Spell effect, resolved when the spell resolves
    Spell,
    Triggered(TriggerKind),
    Activated { cost: ActivationCost, speed: Speed },
    /// Continuous text the engine does not automate
    Static,
}
