//! Error types for the duel engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DuelError {
    /// A rejected intent: wrong player, wrong phase, unpayable cost, bad targets.
    /// The match is left untouched.
    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("The game is over")]
    GameOver,

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    /// Internal invariant violation (programmer error, never a game outcome)
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Invalid card record: {0}")]
    InvalidCardRecord(String),

    #[error("Invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DuelError {
    pub fn illegal(reason: impl Into<String>) -> Self {
        DuelError::IllegalAction(reason.into())
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        DuelError::Invariant(reason.into())
    }

    /// True for errors caused by the caller's request rather than engine bugs
    pub fn is_rejection(&self) -> bool {
        matches!(self, DuelError::IllegalAction(_) | DuelError::GameOver)
    }
}

impl From<serde_json::Error> for DuelError {
    fn from(err: serde_json::Error) -> Self {
        DuelError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DuelError>;
