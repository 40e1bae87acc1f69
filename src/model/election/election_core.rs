use std::collections::{HashMap, HashSet};

use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::{Address, CandidateId, Phase};

use super::{
    candidate::Candidate,
    context::CallContext,
    error::ElectionError,
    event::{ElectionEvent, EventRecord},
    results::{find_winner, ElectionResults, ElectionStatus, Winner},
    voter::{Voter, VoterRecord},
};

type Result<T> = std::result::Result<T, ElectionError>;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Top-level election record: identity, lifecycle position and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionHeader {
    pub name: String,
    pub commissioner: Address,
    pub phase: Phase,
    #[serde(with = "ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub end_time: DateTime<Utc>,
    pub total_votes_cast: u64,
    pub results_published: bool,
    pub winning_candidate_id: Option<CandidateId>,
}

/// The election state machine: the header plus the voter and candidate registries
/// and the log of every event emitted so far.
///
/// Every mutating operation validates completely before touching any state, so a
/// returned error always means nothing changed.
#[derive(Debug, Clone)]
pub struct Election {
    header: ElectionHeader,
    voters: HashMap<Address, Voter>,
    /// Secondary index: national ID to the voter that registered it.
    national_ids: HashMap<String, Address>,
    /// Candidate `n` lives at index `n - 1`.
    candidates: Vec<Candidate>,
    events: Vec<EventRecord>,
}

/// The parts of an election an operation may overwrite, captured so that the
/// operation can be undone after the fact.
///
/// Voter records are not captured. They are only ever added or marked as voted,
/// and both are undone from the events emitted since the checkpoint.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    header: ElectionHeader,
    /// `(vote_count, is_active)` per existing candidate.
    candidates: Vec<(u64, bool)>,
    events: usize,
}

/// A persisted election snapshot that does not hang together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("national ID {national_id} is registered to both {first} and {second}")]
    DuplicateNationalId {
        national_id: String,
        first: Address,
        second: Address,
    },
    #[error("voter {0} appears more than once")]
    DuplicateVoter(Address),
    #[error("expected candidate {expected}, found candidate {found}")]
    CandidateOutOfOrder {
        expected: CandidateId,
        found: CandidateId,
    },
    #[error("expected event {expected}, found event {found}")]
    EventOutOfOrder { expected: u64, found: u64 },
}

impl Election {
    /// Create a new election, with the caller as commissioner.
    pub fn create(ctx: &CallContext, name: String, duration_days: i64) -> Result<Self> {
        if duration_days <= 0 {
            return Err(ElectionError::invalid("Duration must be positive"));
        }
        if ctx.caller.is_zero() {
            return Err(ElectionError::invalid("Invalid commissioner address"));
        }
        let end_time = duration_days
            .checked_mul(SECONDS_PER_DAY)
            .filter(|seconds| *seconds <= i64::MAX / 1000)
            .and_then(|seconds| ctx.now.checked_add_signed(Duration::seconds(seconds)))
            .ok_or_else(|| ElectionError::invalid("Duration is too long"))?;

        let mut election = Self {
            header: ElectionHeader {
                name,
                commissioner: ctx.caller,
                phase: Phase::Registration,
                start_time: ctx.now,
                end_time,
                total_votes_cast: 0,
                results_published: false,
                winning_candidate_id: None,
            },
            voters: HashMap::new(),
            national_ids: HashMap::new(),
            candidates: Vec::new(),
            events: Vec::new(),
        };
        election.emit(ElectionEvent::ElectionCreated {
            name: election.header.name.clone(),
            commissioner: ctx.caller,
            start_time: ctx.now,
            end_time,
        });
        Ok(election)
    }

    /// Reassemble an election from its persisted parts, rebuilding the national ID index.
    pub fn from_parts(
        header: ElectionHeader,
        voters: Vec<VoterRecord>,
        mut candidates: Vec<Candidate>,
        mut events: Vec<EventRecord>,
    ) -> std::result::Result<Self, SnapshotError> {
        let mut voter_map = HashMap::with_capacity(voters.len());
        let mut national_ids = HashMap::with_capacity(voters.len());
        for record in voters {
            if let Some(first) = national_ids.insert(record.voter.national_id.clone(), record.address) {
                return Err(SnapshotError::DuplicateNationalId {
                    national_id: record.voter.national_id,
                    first,
                    second: record.address,
                });
            }
            if voter_map.insert(record.address, record.voter).is_some() {
                return Err(SnapshotError::DuplicateVoter(record.address));
            }
        }

        candidates.sort_by_key(|candidate| candidate.id);
        for (index, candidate) in candidates.iter().enumerate() {
            let expected = index as CandidateId + 1;
            if candidate.id != expected {
                return Err(SnapshotError::CandidateOutOfOrder {
                    expected,
                    found: candidate.id,
                });
            }
        }

        events.sort_by_key(|record| record.sequence);
        for (index, record) in events.iter().enumerate() {
            if record.sequence != index as u64 {
                return Err(SnapshotError::EventOutOfOrder {
                    expected: index as u64,
                    found: record.sequence,
                });
            }
        }

        Ok(Self {
            header,
            voters: voter_map,
            national_ids,
            candidates,
            events,
        })
    }

    // ----- Voter registration -----

    /// Register a single voter.
    pub fn register_voter(
        &mut self,
        ctx: &CallContext,
        voter: Address,
        national_id: String,
    ) -> Result<()> {
        self.require_commissioner(ctx)?;
        self.require_phase(&[Phase::Registration])?;
        self.validate_registration(&voter, &national_id)?;
        self.insert_voter(ctx, voter, national_id);
        Ok(())
    }

    /// Register many voters at once. Either every entry is registered, or none are.
    pub fn batch_register_voters(
        &mut self,
        ctx: &CallContext,
        voters: Vec<Address>,
        national_ids: Vec<String>,
    ) -> Result<()> {
        self.require_commissioner(ctx)?;
        self.require_phase(&[Phase::Registration])?;
        if voters.len() != national_ids.len() {
            return Err(ElectionError::invalid(format!(
                "Arrays length mismatch: {} addresses, {} national IDs",
                voters.len(),
                national_ids.len()
            )));
        }

        // Entries must be valid against the registry and against earlier entries.
        let mut batch_voters = HashSet::with_capacity(voters.len());
        let mut batch_ids = HashSet::with_capacity(voters.len());
        for (voter, national_id) in voters.iter().zip(&national_ids) {
            self.validate_registration(voter, national_id)?;
            if !batch_voters.insert(*voter) {
                return Err(ElectionError::AlreadyRegistered(voter.to_string()));
            }
            if !batch_ids.insert(national_id.as_str()) {
                return Err(ElectionError::DuplicateNationalId(national_id.clone()));
            }
        }

        for (voter, national_id) in voters.into_iter().zip(national_ids) {
            self.insert_voter(ctx, voter, national_id);
        }
        Ok(())
    }

    fn validate_registration(&self, voter: &Address, national_id: &str) -> Result<()> {
        if voter.is_zero() {
            return Err(ElectionError::invalid("Invalid voter address"));
        }
        if national_id.is_empty() {
            return Err(ElectionError::invalid("National ID cannot be empty"));
        }
        if self.voters.contains_key(voter) {
            return Err(ElectionError::AlreadyRegistered(voter.to_string()));
        }
        if self.national_ids.contains_key(national_id) {
            return Err(ElectionError::DuplicateNationalId(national_id.to_string()));
        }
        Ok(())
    }

    fn insert_voter(&mut self, ctx: &CallContext, voter: Address, national_id: String) {
        self.national_ids.insert(national_id.clone(), voter);
        self.voters
            .insert(voter, Voter::new(national_id.clone(), ctx.now));
        self.emit(ElectionEvent::VoterRegistered {
            voter,
            national_id,
            timestamp: ctx.now,
        });
    }

    // ----- Candidates -----

    /// Nominate a new candidate, returning its id.
    pub fn nominate_candidate(
        &mut self,
        ctx: &CallContext,
        name: String,
        party: String,
        manifesto: String,
    ) -> Result<CandidateId> {
        self.require_commissioner(ctx)?;
        self.require_phase(&[Phase::Nomination])?;
        if name.is_empty() {
            return Err(ElectionError::invalid("Name cannot be empty"));
        }
        if party.is_empty() {
            return Err(ElectionError::invalid("Party cannot be empty"));
        }

        let id = self.candidates.len() as CandidateId + 1;
        self.candidates.push(Candidate {
            id,
            name: name.clone(),
            party: party.clone(),
            manifesto: manifesto.clone(),
            vote_count: 0,
            is_active: true,
            nomination_time: ctx.now,
        });
        self.emit(ElectionEvent::CandidateNominated {
            candidate_id: id,
            name,
            party,
            manifesto,
            timestamp: ctx.now,
        });
        Ok(id)
    }

    /// Permanently deactivate a candidate.
    pub fn deactivate_candidate(&mut self, ctx: &CallContext, id: CandidateId) -> Result<()> {
        self.require_commissioner(ctx)?;
        self.require_phase(&[Phase::Nomination])?;
        let index = self.candidate_index(id)?;
        self.candidates[index].is_active = false;
        self.emit(ElectionEvent::CandidateDeactivated {
            candidate_id: id,
            timestamp: ctx.now,
        });
        Ok(())
    }

    // ----- Voting -----

    /// Cast the caller's one and only vote.
    pub fn cast_vote(&mut self, ctx: &CallContext, candidate_id: CandidateId) -> Result<()> {
        self.require_phase(&[Phase::Voting])?;
        let voter = self
            .voters
            .get(&ctx.caller)
            .ok_or_else(|| ElectionError::unauthorized("Not a registered voter"))?;
        if voter.has_voted {
            return Err(ElectionError::AlreadyVoted(ctx.caller.to_string()));
        }
        let index = self.candidate_index(candidate_id)?;
        if !self.candidates[index].is_active {
            return Err(ElectionError::InvalidCandidate(format!(
                "Candidate {candidate_id} is not active"
            )));
        }

        if let Some(voter) = self.voters.get_mut(&ctx.caller) {
            voter.has_voted = true;
            voter.voted_candidate_id = Some(candidate_id);
        }
        self.candidates[index].vote_count += 1;
        self.header.total_votes_cast += 1;
        self.emit(ElectionEvent::VoteCast {
            voter: ctx.caller,
            candidate_id,
            timestamp: ctx.now,
        });
        self.emit(ElectionEvent::VoterStatusUpdated {
            voter: ctx.caller,
            has_voted: true,
        });
        Ok(())
    }

    // ----- Lifecycle -----

    /// Advance exactly one phase. Entering `ResultsDeclared` computes the winner.
    pub fn move_to_next_phase(&mut self, ctx: &CallContext) -> Result<Phase> {
        self.require_commissioner(ctx)?;
        let current = self.header.phase;
        let next = current.next().ok_or_else(|| {
            ElectionError::wrong_phase(
                &[
                    Phase::Registration,
                    Phase::Nomination,
                    Phase::Voting,
                    Phase::Ended,
                ],
                current,
            )
        })?;
        match current {
            Phase::Registration if self.voters.is_empty() => {
                return Err(ElectionError::PreconditionFailed(
                    "No voters registered".to_string(),
                ))
            }
            Phase::Nomination if self.candidates.is_empty() => {
                return Err(ElectionError::PreconditionFailed(
                    "No candidates nominated".to_string(),
                ))
            }
            _ => {}
        }

        self.header.phase = next;
        self.emit(ElectionEvent::PhaseChanged {
            new_phase: next,
            timestamp: ctx.now,
        });
        if next == Phase::ResultsDeclared {
            self.declare_results(ctx);
        }
        Ok(next)
    }

    fn declare_results(&mut self, ctx: &CallContext) {
        let winner = find_winner(&self.candidates).map(|candidate| candidate.id);
        self.header.winning_candidate_id = winner;
        self.header.results_published = true;
        self.emit(ElectionEvent::ResultsDeclared {
            winning_candidate_id: winner,
            total_votes: self.header.total_votes_cast,
            timestamp: ctx.now,
        });
    }

    /// Jump straight to `Ended` from any earlier phase, ignoring the usual preconditions.
    pub fn emergency_stop(&mut self, ctx: &CallContext) -> Result<()> {
        self.require_commissioner(ctx)?;
        if !self.header.phase.can_emergency_stop() {
            return Err(ElectionError::wrong_phase(
                &[Phase::Registration, Phase::Nomination, Phase::Voting],
                self.header.phase,
            ));
        }
        self.header.phase = Phase::Ended;
        self.emit(ElectionEvent::EmergencyStop { timestamp: ctx.now });
        Ok(())
    }

    /// Hand the commissioner role to someone else, effective immediately.
    pub fn transfer_commissioner(&mut self, ctx: &CallContext, new: Address) -> Result<()> {
        self.require_commissioner(ctx)?;
        if new.is_zero() {
            return Err(ElectionError::invalid("Invalid address"));
        }
        let previous = self.header.commissioner;
        self.header.commissioner = new;
        self.emit(ElectionEvent::CommissionerTransferred {
            previous,
            new,
            timestamp: ctx.now,
        });
        Ok(())
    }

    // ----- Reads -----

    pub fn header(&self) -> &ElectionHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn commissioner(&self) -> Address {
        self.header.commissioner
    }

    pub fn phase(&self) -> Phase {
        self.header.phase
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.header.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.header.end_time
    }

    pub fn total_voters(&self) -> u64 {
        self.voters.len() as u64
    }

    pub fn total_candidates(&self) -> u64 {
        self.candidates.len() as u64
    }

    pub fn total_votes_cast(&self) -> u64 {
        self.header.total_votes_cast
    }

    pub fn results_published(&self) -> bool {
        self.header.results_published
    }

    pub fn winning_candidate_id(&self) -> Option<CandidateId> {
        self.header.winning_candidate_id
    }

    pub fn is_registered_voter(&self, address: &Address) -> bool {
        self.voters.contains_key(address)
    }

    pub fn has_voter_voted(&self, address: &Address) -> bool {
        self.voters
            .get(address)
            .map(|voter| voter.has_voted)
            .unwrap_or(false)
    }

    /// Look up a voter. Only the commissioner and the voter themselves may do this.
    pub fn voter(&self, ctx: &CallContext, address: &Address) -> Result<&Voter> {
        if ctx.caller != self.header.commissioner && ctx.caller != *address {
            return Err(ElectionError::unauthorized(
                "Not authorized to view voter details",
            ));
        }
        self.voters
            .get(address)
            .ok_or_else(|| ElectionError::NotFound(format!("Voter {address} is not registered")))
    }

    /// A voter's full persisted record, regardless of caller.
    pub fn voter_record(&self, address: &Address) -> Option<VoterRecord> {
        self.voters.get(address).map(|voter| VoterRecord {
            address: *address,
            voter: voter.clone(),
        })
    }

    pub fn candidate(&self, id: CandidateId) -> Result<&Candidate> {
        self.candidate_index(id).map(|index| &self.candidates[index])
    }

    /// All candidates, in id order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// A candidate's running tally. Visible to the commissioner at any time,
    /// and to everyone else once results are published.
    pub fn candidate_vote_count(&self, ctx: &CallContext, id: CandidateId) -> Result<u64> {
        if ctx.caller != self.header.commissioner && !self.header.results_published {
            return Err(ElectionError::unauthorized(
                "Vote counts are only available to the commissioner until results are published",
            ));
        }
        self.candidate(id).map(|candidate| candidate.vote_count)
    }

    pub fn status(&self) -> ElectionStatus {
        ElectionStatus {
            name: self.header.name.clone(),
            phase: self.header.phase,
            start_time: self.header.start_time,
            end_time: self.header.end_time,
            total_voters: self.total_voters(),
            total_candidates: self.total_candidates(),
            votes_cast: self.header.total_votes_cast,
            results_available: self.header.results_published,
        }
    }

    pub fn results(&self) -> Result<ElectionResults> {
        if !self.header.results_published {
            return Err(ElectionError::NotAvailable(
                "Results not yet published".to_string(),
            ));
        }
        let winner = self
            .header
            .winning_candidate_id
            .and_then(|id| self.candidate(id).ok())
            .map(|candidate| Winner {
                id: candidate.id,
                name: candidate.name.clone(),
                party: candidate.party.clone(),
                votes: candidate.vote_count,
            });
        Ok(ElectionResults {
            winner,
            total_votes: self.header.total_votes_cast,
        })
    }

    /// The full event log.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Up to `limit` events starting at sequence number `since`.
    pub fn events_since(&self, since: u64, limit: usize) -> &[EventRecord] {
        let start = usize::try_from(since)
            .unwrap_or(usize::MAX)
            .min(self.events.len());
        let end = start.saturating_add(limit).min(self.events.len());
        &self.events[start..end]
    }

    // ----- Undo -----

    /// Capture what is needed to undo the operations that follow.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            header: self.header.clone(),
            candidates: self
                .candidates
                .iter()
                .map(|candidate| (candidate.vote_count, candidate.is_active))
                .collect(),
            events: self.events.len(),
        }
    }

    /// Return to the state at `checkpoint`, dropping every event emitted since.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let Checkpoint {
            header,
            candidates,
            events,
        } = checkpoint;
        let since = events.min(self.events.len());
        for record in self.events.drain(since..).rev() {
            match record.event {
                ElectionEvent::VoterRegistered {
                    voter, national_id, ..
                } => {
                    self.voters.remove(&voter);
                    self.national_ids.remove(&national_id);
                }
                ElectionEvent::VoterStatusUpdated { voter, .. } => {
                    if let Some(voter) = self.voters.get_mut(&voter) {
                        voter.has_voted = false;
                        voter.voted_candidate_id = None;
                    }
                }
                _ => {}
            }
        }
        self.candidates.truncate(candidates.len());
        for (candidate, (vote_count, is_active)) in self.candidates.iter_mut().zip(candidates) {
            candidate.vote_count = vote_count;
            candidate.is_active = is_active;
        }
        self.header = header;
    }

    // ----- Internals -----

    fn require_commissioner(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller != self.header.commissioner {
            return Err(ElectionError::unauthorized(
                "Only commissioner can call this",
            ));
        }
        Ok(())
    }

    fn require_phase(&self, legal: &[Phase]) -> Result<()> {
        if !legal.contains(&self.header.phase) {
            return Err(ElectionError::wrong_phase(legal, self.header.phase));
        }
        Ok(())
    }

    fn candidate_index(&self, id: CandidateId) -> Result<usize> {
        id.checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .filter(|index| *index < self.candidates.len())
            .ok_or_else(|| ElectionError::NotFound(format!("Invalid candidate ID {id}")))
    }

    fn emit(&mut self, event: ElectionEvent) {
        let sequence = self.events.len() as u64;
        trace!("Event {sequence}: {event:?}");
        self.events.push(EventRecord { sequence, event });
    }
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use chrono::TimeZone;

    use super::*;

    pub const EXAMPLE_NAME: &str = "Test Election 2024";
    pub const EXAMPLE_DURATION_DAYS: i64 = 7;

    pub fn time(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    pub fn commissioner() -> Address {
        Address::from_bytes([0xc0; 20])
    }

    pub fn voter(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    pub fn as_commissioner() -> CallContext {
        CallContext::at(commissioner(), time(10))
    }

    pub fn as_voter(n: u8) -> CallContext {
        CallContext::at(voter(n), time(20))
    }

    impl Election {
        /// A freshly created election in the Registration phase.
        pub fn example() -> Self {
            let ctx = CallContext::at(commissioner(), time(0));
            Election::create(&ctx, EXAMPLE_NAME.to_string(), EXAMPLE_DURATION_DAYS).unwrap()
        }

        /// An election in the Voting phase with `voters` registered voters (1..=voters)
        /// and one candidate per party name.
        pub fn voting_example(voters: u8, parties: &[&str]) -> Self {
            let mut election = Self::example();
            let ctx = as_commissioner();
            for n in 1..=voters {
                election
                    .register_voter(&ctx, voter(n), format!("ID{n:03}"))
                    .unwrap();
            }
            election.move_to_next_phase(&ctx).unwrap();
            for party in parties {
                election
                    .nominate_candidate(
                        &ctx,
                        format!("Leader of {party}"),
                        party.to_string(),
                        format!("Manifesto of {party}"),
                    )
                    .unwrap();
            }
            election.move_to_next_phase(&ctx).unwrap();
            election
        }

        /// Register `voters` voters, cast votes as voters 1.. in order for the given
        /// candidate ids, then declare results.
        pub fn declared_example(voters: u8, votes: &[CandidateId], parties: &[&str]) -> Self {
            assert!(votes.len() <= voters as usize);
            let mut election = Self::voting_example(voters, parties);
            for (i, candidate) in votes.iter().enumerate() {
                election.cast_vote(&as_voter(i as u8 + 1), *candidate).unwrap();
            }
            let ctx = as_commissioner();
            election.move_to_next_phase(&ctx).unwrap();
            election.move_to_next_phase(&ctx).unwrap();
            election
        }
    }
}
