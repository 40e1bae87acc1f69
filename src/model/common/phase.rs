use std::fmt::{Display, Formatter};

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Stages of the election lifecycle, in the only order they may occur.
///
/// Serialized as its ordinal (0-4), which is what clients display and compare against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Phase {
    /// Initial phase: the commissioner registers voters.
    Registration = 0,
    /// The commissioner nominates (and possibly deactivates) candidates.
    Nomination = 1,
    /// Registered voters cast their single vote.
    Voting = 2,
    /// Voting is closed; results are not yet declared.
    Ended = 3,
    /// Terminal: the winner has been computed and results are public.
    ResultsDeclared = 4,
}

impl Phase {
    /// The phase that follows this one, or `None` if this is the terminal phase.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Registration => Some(Phase::Nomination),
            Phase::Nomination => Some(Phase::Voting),
            Phase::Voting => Some(Phase::Ended),
            Phase::Ended => Some(Phase::ResultsDeclared),
            Phase::ResultsDeclared => None,
        }
    }

    /// Can an emergency stop jump from this phase straight to `Ended`?
    pub fn can_emergency_stop(self) -> bool {
        self < Phase::Ended
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Registration => "Registration",
            Phase::Nomination => "Nomination",
            Phase::Voting => "Voting",
            Phase::Ended => "Ended",
            Phase::ResultsDeclared => "Results Declared",
        };
        f.write_str(label)
    }
}
