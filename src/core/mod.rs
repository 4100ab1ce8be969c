//! Core data model: cards, players, battlefields, resources

pub mod battlefield;
pub mod card;
pub mod effects;
pub mod entity;
pub mod keywords;
pub mod player;
pub mod resources;
pub mod types;

pub use battlefield::Battlefield;
pub use card::{Card, CardDefinition, CardRecord, CardType};
pub use effects::{
    AbilityTiming, ActivationCost, Amount, Destination, EffectClause, EffectPrimitive, PowerSource, Selector,
    Side, Speed, TargetRef, TriggerKind,
};
pub use entity::{EntityId, EntityStore};
pub use keywords::{Duration, Keyword};
pub use player::Player;
pub use resources::{CostSpec, Domain, DomainSet, PowerKind, PowerRequirement, ResourcePool};
pub use types::{BattlefieldId, CardName, ChainItemId, DecisionId, PlayerName};

/// Type-safe ID aliases
pub type CardId = EntityId<Card>;
pub type PlayerId = EntityId<Player>;
