use thiserror::Error;

use crate::model::common::Phase;

/// Why an election operation was rejected.
///
/// A rejected operation never changes any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElectionError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not in correct election phase: expected {}, currently {current}", display_phases(.expected))]
    WrongPhase {
        expected: Vec<Phase>,
        current: Phase,
    },
    #[error("Voter already registered: {0}")]
    AlreadyRegistered(String),
    #[error("National ID already used: {0}")]
    DuplicateNationalId(String),
    #[error("Already voted: {0}")]
    AlreadyVoted(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("Not available: {0}")]
    NotAvailable(String),
}

impl ElectionError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "InvalidParameter",
            Self::Unauthorized(_) => "Unauthorized",
            Self::WrongPhase { .. } => "WrongPhase",
            Self::AlreadyRegistered(_) => "AlreadyRegistered",
            Self::DuplicateNationalId(_) => "DuplicateNationalId",
            Self::AlreadyVoted(_) => "AlreadyVoted",
            Self::NotFound(_) => "NotFound",
            Self::InvalidCandidate(_) => "InvalidCandidate",
            Self::PreconditionFailed(_) => "PreconditionFailed",
            Self::NotAvailable(_) => "NotAvailable",
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter(reason.into())
    }

    pub(crate) fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub(crate) fn wrong_phase(expected: &[Phase], current: Phase) -> Self {
        Self::WrongPhase {
            expected: expected.to_vec(),
            current,
        }
    }
}

fn display_phases(phases: &[Phase]) -> String {
    phases
        .iter()
        .map(Phase::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}
