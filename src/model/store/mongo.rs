use mongodb::{
    bson::doc,
    options::{FindOptions, ReplaceOptions},
    Client, Database,
};
use rocket::{futures::TryStreamExt, http::Status};

use crate::error::{Error, Result};
use crate::model::{
    account::Account,
    common::Address,
    election::{Candidate, Election, ElectionHeader, EventRecord, VoterRecord},
    mongodb::{ensure_indexes_exist, is_duplicate_key_error, Coll},
};

use super::{Commit, ElectionStore};

/// A store backed by MongoDB. Commits use multi-document transactions, so the
/// server must be a replica set.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connect to the given database and make sure it is set up.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let db = client.database(db_name);
        ensure_indexes_exist(&db).await?;
        Ok(Self { client, db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[rocket::async_trait]
impl ElectionStore for MongoStore {
    async fn load_election(&self) -> Result<Option<Election>> {
        let Some(header) = Coll::<ElectionHeader>::from_db(&self.db)
            .find_one(None, None)
            .await?
        else {
            return Ok(None);
        };

        let voters = Coll::<VoterRecord>::from_db(&self.db)
            .find(None, None)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let by_id = FindOptions::builder().sort(doc! { "id": 1 }).build();
        let candidates = Coll::<Candidate>::from_db(&self.db)
            .find(None, by_id)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        let by_sequence = FindOptions::builder().sort(doc! { "sequence": 1 }).build();
        let events = Coll::<EventRecord>::from_db(&self.db)
            .find(None, by_sequence)
            .await?
            .try_collect::<Vec<_>>()
            .await?;
        debug!(
            "Loaded election with {} voters, {} candidates and {} events",
            voters.len(),
            candidates.len(),
            events.len()
        );

        Ok(Some(Election::from_parts(header, voters, candidates, events)?))
    }

    async fn commit(&self, commit: Commit<'_>) -> Result<()> {
        let upsert = ReplaceOptions::builder().upsert(true).build();

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        Coll::<ElectionHeader>::from_db(&self.db)
            .replace_one_with_session(doc! {}, commit.header, upsert.clone(), &mut session)
            .await?;

        let voters = Coll::<VoterRecord>::from_db(&self.db);
        for record in &commit.voters {
            voters
                .replace_one_with_session(
                    doc! { "address": record.address },
                    record,
                    upsert.clone(),
                    &mut session,
                )
                .await?;
        }

        let candidates = Coll::<Candidate>::from_db(&self.db);
        for candidate in &commit.candidates {
            candidates
                .replace_one_with_session(
                    doc! { "id": candidate.id as i64 },
                    candidate,
                    upsert.clone(),
                    &mut session,
                )
                .await?;
        }

        if !commit.events.is_empty() {
            let inserted = Coll::<EventRecord>::from_db(&self.db)
                .insert_many_with_session(commit.events, None, &mut session)
                .await;
            if let Err(err) = inserted {
                // Dropping the session aborts the transaction.
                return Err(if is_duplicate_key_error(&err) {
                    Error::Status(
                        Status::Conflict,
                        "Election was modified concurrently".to_string(),
                    )
                } else {
                    err.into()
                });
            }
        }

        session.commit_transaction().await?;
        Ok(())
    }

    async fn find_account(&self, address: &Address) -> Result<Option<Account>> {
        let account = Coll::<Account>::from_db(&self.db)
            .find_one(doc! { "address": *address }, None)
            .await?;
        Ok(account)
    }

    async fn insert_account(&self, account: &Account) -> Result<()> {
        match Coll::<Account>::from_db(&self.db)
            .insert_one(account, None)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key_error(&err) => Err(Error::Status(
                Status::Conflict,
                format!("Account {} already exists", account.address),
            )),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::election::examples::*;

    const DB_URI_VAR: &str = "ELECTION_TEST_DB_URI";

    async fn store() -> MongoStore {
        let uri = std::env::var(DB_URI_VAR).unwrap();
        let random: u32 = rand::random();
        MongoStore::connect(&uri, &format!("test{random}"))
            .await
            .unwrap()
    }

    #[rocket::async_test]
    #[ignore = "requires a MongoDB replica set at $ELECTION_TEST_DB_URI"]
    async fn commit_and_reload() {
        let store = store().await;
        assert!(store.load_election().await.unwrap().is_none());

        let mut election = Election::voting_example(2, &["Party A", "Party B"]);
        store.commit(Commit::since(&election, 0)).await.unwrap();
        let before = election.events().len();
        election.cast_vote(&as_voter(2), 1).unwrap();
        store.commit(Commit::since(&election, before)).await.unwrap();

        let loaded = store.load_election().await.unwrap().unwrap();
        assert_eq!(loaded.status(), election.status());
        assert_eq!(loaded.candidates(), election.candidates());
        assert_eq!(loaded.events(), election.events());
        assert!(loaded.has_voter_voted(&voter(2)));

        // The same events cannot be stored twice, and nothing else changes.
        let result = store.commit(Commit::since(&election, before)).await;
        assert!(matches!(result, Err(Error::Status(status, _)) if status == Status::Conflict));
        let reloaded = store.load_election().await.unwrap().unwrap();
        assert_eq!(reloaded.events().len(), election.events().len());

        store.database().drop(None).await.unwrap();
    }

    #[rocket::async_test]
    #[ignore = "requires a MongoDB replica set at $ELECTION_TEST_DB_URI"]
    async fn accounts() {
        let store = store().await;
        let account = Account {
            address: voter(1),
            password_hash: "hash".to_string(),
        };
        store.insert_account(&account).await.unwrap();
        assert_eq!(store.find_account(&voter(1)).await.unwrap(), Some(account.clone()));
        assert_eq!(store.find_account(&voter(2)).await.unwrap(), None);
        assert!(matches!(
            store.insert_account(&account).await,
            Err(Error::Status(status, _)) if status == Status::Conflict
        ));

        store.database().drop(None).await.unwrap();
    }
}
