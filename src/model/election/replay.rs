use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    CallContext, Candidate, Election, ElectionError, ElectionEvent, ElectionResults,
    ElectionStatus, EventRecord,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// There were no events at all.
    #[error("the event log is empty")]
    EmptyLog,
    /// The log does not open with the creation of the election.
    #[error("event 0 does not create the election")]
    NotCreation,
    /// A sequence number is missing or out of place.
    #[error("expected event {expected}, found event {found}")]
    Sequence { expected: u64, found: u64 },
    /// Replaying an event's operation was rejected by the election rules.
    #[error("event {sequence} is not a legal operation: {error}")]
    Rejected { sequence: u64, error: ElectionError },
    /// An event that is only ever emitted as a consequence of another one
    /// appeared on its own.
    #[error("event {sequence} was not caused by any operation")]
    Unexpected { sequence: u64 },
    /// The recorded event differs from the one the operation actually emits.
    #[error("event {sequence} does not match the replayed election")]
    Mismatch { sequence: u64 },
    /// The log stops partway through the events of a single operation.
    #[error("the event log is truncated after event {sequence}")]
    Truncated { sequence: u64 },
    /// The replayed state disagrees with a claim made by the dump.
    #[error("the claimed {0} do not match the event log")]
    Claim(&'static str),
}

impl Election {
    /// Rebuild an election by re-running every operation recorded in `events`, checking
    /// that each was legal and that it emitted exactly the recorded events.
    pub fn replay(events: &[EventRecord]) -> Result<Self, VerificationError> {
        let first = events.first().ok_or(VerificationError::EmptyLog)?;
        check_sequence(first, 0)?;
        let mut election = match &first.event {
            ElectionEvent::ElectionCreated {
                name,
                commissioner,
                start_time,
                end_time,
            } => {
                let ctx = CallContext::at(*commissioner, *start_time);
                let days = (*end_time - *start_time).num_days();
                Election::create(&ctx, name.clone(), days)
                    .map_err(|error| VerificationError::Rejected { sequence: 0, error })?
            }
            _ => return Err(VerificationError::NotCreation),
        };
        compare(&election, events, 0)?;

        let mut next = election.events().len();
        while let Some(record) = events.get(next) {
            check_sequence(record, next as u64)?;
            let sequence = record.sequence;
            let now = record_time(record).ok_or(VerificationError::Unexpected { sequence })?;
            let commissioner = CallContext::at(election.commissioner(), now);
            let result = match &record.event {
                ElectionEvent::VoterRegistered {
                    voter, national_id, ..
                } => election.register_voter(&commissioner, *voter, national_id.clone()),
                ElectionEvent::CandidateNominated {
                    name,
                    party,
                    manifesto,
                    ..
                } => election
                    .nominate_candidate(&commissioner, name.clone(), party.clone(), manifesto.clone())
                    .map(|_| ()),
                ElectionEvent::CandidateDeactivated { candidate_id, .. } => {
                    election.deactivate_candidate(&commissioner, *candidate_id)
                }
                ElectionEvent::PhaseChanged { .. } => {
                    election.move_to_next_phase(&commissioner).map(|_| ())
                }
                ElectionEvent::VoteCast {
                    voter,
                    candidate_id,
                    timestamp,
                } => election.cast_vote(&CallContext::at(*voter, *timestamp), *candidate_id),
                ElectionEvent::EmergencyStop { .. } => election.emergency_stop(&commissioner),
                ElectionEvent::CommissionerTransferred { new, .. } => {
                    election.transfer_commissioner(&commissioner, *new)
                }
                ElectionEvent::ElectionCreated { .. }
                | ElectionEvent::VoterStatusUpdated { .. }
                | ElectionEvent::ResultsDeclared { .. } => {
                    return Err(VerificationError::Unexpected { sequence })
                }
            };
            result.map_err(|error| VerificationError::Rejected { sequence, error })?;
            compare(&election, events, next)?;
            next = election.events().len();
        }
        Ok(election)
    }
}

fn check_sequence(record: &EventRecord, expected: u64) -> Result<(), VerificationError> {
    if record.sequence != expected {
        return Err(VerificationError::Sequence {
            expected,
            found: record.sequence,
        });
    }
    Ok(())
}

/// When the operation behind a driving event was invoked.
fn record_time(record: &EventRecord) -> Option<DateTime<Utc>> {
    match &record.event {
        ElectionEvent::ElectionCreated { start_time, .. } => Some(*start_time),
        ElectionEvent::VoterRegistered { timestamp, .. }
        | ElectionEvent::CandidateNominated { timestamp, .. }
        | ElectionEvent::CandidateDeactivated { timestamp, .. }
        | ElectionEvent::PhaseChanged { timestamp, .. }
        | ElectionEvent::VoteCast { timestamp, .. }
        | ElectionEvent::ResultsDeclared { timestamp, .. }
        | ElectionEvent::EmergencyStop { timestamp }
        | ElectionEvent::CommissionerTransferred { timestamp, .. } => Some(*timestamp),
        ElectionEvent::VoterStatusUpdated { .. } => None,
    }
}

/// Check the events produced from `from` onwards against the recorded ones.
fn compare(
    election: &Election,
    recorded: &[EventRecord],
    from: usize,
) -> Result<(), VerificationError> {
    for produced in &election.events()[from..] {
        let sequence = produced.sequence;
        let index = sequence as usize;
        match recorded.get(index) {
            None => {
                return Err(VerificationError::Truncated {
                    sequence: recorded.len().saturating_sub(1) as u64,
                })
            }
            Some(record) if record != produced => {
                return Err(VerificationError::Mismatch { sequence })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Everything needed to independently check an election: its full event log,
/// plus the state the server claims that log produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDump {
    pub status: ElectionStatus,
    pub candidates: Vec<Candidate>,
    /// Only present once results have been declared.
    pub results: Option<ElectionResults>,
    pub events: Vec<EventRecord>,
}

impl From<&Election> for ElectionDump {
    fn from(election: &Election) -> Self {
        Self {
            status: election.status(),
            candidates: election.candidates().to_vec(),
            results: election.results().ok(),
            events: election.events().to_vec(),
        }
    }
}

impl ElectionDump {
    /// Replay the event log and check the claimed state against the outcome.
    pub fn verify(&self) -> Result<Election, VerificationError> {
        let election = Election::replay(&self.events)?;
        if election.status() != self.status {
            return Err(VerificationError::Claim("status"));
        }
        if election.candidates() != self.candidates.as_slice() {
            return Err(VerificationError::Claim("candidates"));
        }
        if election.results().ok() != self.results {
            return Err(VerificationError::Claim("results"));
        }
        Ok(election)
    }
}
