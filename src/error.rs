use thiserror::Error;

use crate::game::{GamePhase, SessionToken};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Image provider failed, was unreachable, or returned bytes that are not an image.
    #[error("Image generation failed: {0}")]
    Generation(String),

    /// Detection failed, returned unparseable data, or found no cats.
    #[error("Cat detection failed: {0}")]
    Detection(String),

    #[error("Request rejected: {0}")]
    InputRejected(#[from] RejectReason),

    /// A provider result arrived for a session that has since been abandoned or replaced.
    #[error("Session {0} was superseded before its result arrived")]
    Superseded(SessionToken),
}

/// Requests the state machine declines without changing state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("free games used up ({played}/{quota})")]
    QuotaExhausted { played: u32, quota: u32 },

    #[error("no hints left")]
    NoHintsLeft,

    #[error("every cat is already found")]
    NothingToHint,

    #[error("cannot {action} while {phase:?}")]
    InvalidPhase {
        phase: GamePhase,
        action: &'static str,
    },

    #[error("player name is empty")]
    EmptyPlayerName,

    #[error("score already submitted")]
    AlreadySubmitted,
}

pub type GameResult<T> = Result<T, GameError>;
