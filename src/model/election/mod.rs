//! The election state machine, independent of any storage or transport.

pub use candidate::Candidate;
pub use context::CallContext;
pub use election_core::{Checkpoint, Election, ElectionHeader, SnapshotError};
pub use error::ElectionError;
pub use event::{ElectionEvent, EventRecord};
pub use replay::{ElectionDump, VerificationError};
pub use results::{find_winner, ElectionResults, ElectionStatus, Winner};
pub use voter::{Voter, VoterRecord};

#[cfg(test)]
pub(crate) use election_core::examples;

mod candidate;
mod context;
mod election_core;
mod error;
mod event;
mod replay;
mod results;
mod voter;
