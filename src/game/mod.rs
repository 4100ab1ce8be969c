//! Rules engine: match state, chain, combat, turns and the action API

pub mod actions;
pub mod chain;
pub mod combat;
pub mod config;
pub mod decision;
pub mod effect_parser;
pub mod effects;
pub mod logger;
pub mod payment;
pub mod phase;
pub mod queries;
pub mod snapshot;
pub mod state;
pub mod targeting;
pub mod turn;

pub use actions::{Intent, Location};
pub use chain::{Chain, ChainItem, ChainItemKind, Window, WindowKind};
pub use combat::{CombatState, CombatStep};
pub use config::{MatchConfig, TiePolicy};
pub use decision::{
    DecisionAnswer, DecisionKind, DecisionRequest, DirectEffect, PendingDecision, ResolutionProgress, ResumeToken,
};
pub use effects::{Outcome, ResolveContext};
pub use logger::{GameLogger, LogCategory, LogEntry, OutputMode, VerbosityLevel};
pub use payment::{PaymentPlan, PaymentStep, Producer};
pub use phase::{Phase, TurnStructure};
pub use snapshot::{MatchSnapshot, SNAPSHOT_VERSION};
pub use state::Match;
pub use targeting::{Inferred, TargetContext, TargetCount, TargetRequirement, UnitZone};
