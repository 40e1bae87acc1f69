//! Durable storage for the election and for login accounts.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::model::{
    account::Account,
    common::{Address, CandidateId},
    election::{Candidate, Election, ElectionHeader, EventRecord, VoterRecord},
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

mod memory;
mod mongo;

/// Everything that changed as the result of one successful operation.
///
/// A commit must be persisted atomically: either all of it lands, or none of it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit<'a> {
    pub header: &'a ElectionHeader,
    pub voters: Vec<VoterRecord>,
    pub candidates: Vec<Candidate>,
    pub events: &'a [EventRecord],
}

impl<'a> Commit<'a> {
    /// Collect the changes made to `election` since its event log had `since` entries.
    pub fn since(election: &'a Election, since: usize) -> Self {
        let events = &election.events()[since.min(election.events().len())..];
        let voters = events
            .iter()
            .filter_map(|record| record.event.touched_voter())
            .collect::<BTreeSet<Address>>()
            .iter()
            .filter_map(|address| election.voter_record(address))
            .collect();
        let candidates = events
            .iter()
            .filter_map(|record| record.event.touched_candidate())
            .collect::<BTreeSet<CandidateId>>()
            .into_iter()
            .filter_map(|id| election.candidate(id).ok().cloned())
            .collect();
        Self {
            header: election.header(),
            voters,
            candidates,
            events,
        }
    }
}

/// A backing store for the single election.
#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    /// Load the election, if one has been deployed.
    async fn load_election(&self) -> Result<Option<Election>>;

    /// Atomically persist the changes from one operation.
    async fn commit(&self, commit: Commit<'_>) -> Result<()>;

    async fn find_account(&self, address: &Address) -> Result<Option<Account>>;

    /// Store a new account. Fails if the address is taken.
    async fn insert_account(&self, account: &Account) -> Result<()>;
}
