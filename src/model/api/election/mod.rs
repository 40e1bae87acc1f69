mod desc;
mod request;

pub use desc::ElectionDescription;
pub use request::{
    BatchVoterRegistration, CandidateNomination, CandidateRef,
    CommissionerTransfer, ElectionSpec, Flag, PhaseChange, VoteCount, VoterRegistration,
};
