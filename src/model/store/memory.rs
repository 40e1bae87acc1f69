use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rocket::{http::Status, tokio::sync::Mutex};

use crate::error::{Error, Result};
use crate::model::{
    account::Account,
    common::{Address, CandidateId},
    election::{Candidate, Election, ElectionHeader, EventRecord, VoterRecord},
};

use super::{Commit, ElectionStore};

#[derive(Debug, Default)]
struct Tables {
    header: Option<ElectionHeader>,
    voters: HashMap<Address, VoterRecord>,
    candidates: BTreeMap<CandidateId, Candidate>,
    events: Vec<EventRecord>,
    accounts: HashMap<Address, Account>,
}

/// A volatile store that keeps everything in process memory.
///
/// Cloning gives another handle on the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn load_election(&self) -> Result<Option<Election>> {
        let tables = self.tables.lock().await;
        let Some(header) = tables.header.clone() else {
            return Ok(None);
        };
        let election = Election::from_parts(
            header,
            tables.voters.values().cloned().collect(),
            tables.candidates.values().cloned().collect(),
            tables.events.clone(),
        )?;
        Ok(Some(election))
    }

    async fn commit(&self, commit: Commit<'_>) -> Result<()> {
        let mut tables = self.tables.lock().await;

        // Same guarantee as the unique index on event sequence numbers.
        if let Some(first) = commit.events.first() {
            if first.sequence != tables.events.len() as u64 {
                return Err(Error::Status(
                    Status::Conflict,
                    format!(
                        "Event {} has already been stored",
                        first.sequence.min(tables.events.len() as u64)
                    ),
                ));
            }
        }

        tables.header = Some(commit.header.clone());
        for record in commit.voters {
            tables.voters.insert(record.address, record);
        }
        for candidate in commit.candidates {
            tables.candidates.insert(candidate.id, candidate);
        }
        tables.events.extend_from_slice(commit.events);
        Ok(())
    }

    async fn find_account(&self, address: &Address) -> Result<Option<Account>> {
        Ok(self.tables.lock().await.accounts.get(address).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.accounts.contains_key(&account.address) {
            return Err(Error::Status(
                Status::Conflict,
                format!("Account {} already exists", account.address),
            ));
        }
        tables.accounts.insert(account.address, account.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::election::examples::*;

    #[rocket::async_test]
    async fn commit_and_reload() {
        let store = MemoryStore::new();
        assert!(store.load_election().await.unwrap().is_none());

        let mut election = Election::voting_example(2, &["Party A", "Party B"]);
        store.commit(Commit::since(&election, 0)).await.unwrap();

        let before = election.events().len();
        election.cast_vote(&as_voter(1), 2).unwrap();
        store.commit(Commit::since(&election, before)).await.unwrap();

        let loaded = store.load_election().await.unwrap().unwrap();
        assert_eq!(loaded.status(), election.status());
        assert_eq!(loaded.candidates(), election.candidates());
        assert_eq!(loaded.events(), election.events());
        assert!(loaded.has_voter_voted(&voter(1)));
        assert!(!loaded.has_voter_voted(&voter(2)));

        // Replaying an old commit is refused.
        let result = store.commit(Commit::since(&election, before)).await;
        assert!(matches!(result, Err(Error::Status(status, _)) if status == Status::Conflict));
    }

    #[rocket::async_test]
    async fn accounts() {
        let store = MemoryStore::new();
        let account = Account {
            address: voter(1),
            password_hash: "hash".to_string(),
        };
        assert_eq!(store.find_account(&voter(1)).await.unwrap(), None);
        store.insert_account(&account).await.unwrap();
        assert_eq!(store.find_account(&voter(1)).await.unwrap(), Some(account.clone()));
        assert!(matches!(
            store.insert_account(&account).await,
            Err(Error::Status(status, _)) if status == Status::Conflict
        ));
    }
}
