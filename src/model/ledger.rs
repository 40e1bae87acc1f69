use rocket::{http::Status, tokio::sync::Mutex};

use crate::error::{Error, Result};
use crate::model::{
    election::{CallContext, Election, ElectionError},
    store::{Commit, ElectionStore},
};

/// Serialises every operation on the single election and makes each one durable.
///
/// Operations run against the live state. If the operation is rejected or its
/// changes cannot be committed to the store, the state is rolled back to a
/// checkpoint taken just before it ran, so it leaves no trace.
pub struct ElectionLedger {
    store: Box<dyn ElectionStore>,
    election: Mutex<Option<Election>>,
}

impl ElectionLedger {
    /// Open the ledger, picking up any election already in the store.
    pub async fn open<S>(store: S) -> Result<Self>
    where
        S: ElectionStore + 'static,
    {
        let election = store.load_election().await?;
        match &election {
            Some(election) => info!(
                "Resumed election \"{}\" in phase {} with {} events",
                election.name(),
                election.phase(),
                election.events().len()
            ),
            None => info!("No election deployed yet"),
        }
        Ok(Self {
            store: Box::new(store),
            election: Mutex::new(election),
        })
    }

    pub fn store(&self) -> &dyn ElectionStore {
        self.store.as_ref()
    }

    /// Create the election. This can only ever happen once.
    pub async fn deploy(&self, ctx: &CallContext, name: String, duration_days: i64) -> Result<()> {
        let mut current = self.election.lock().await;
        if current.is_some() {
            return Err(Error::Status(
                Status::Conflict,
                "An election has already been deployed".to_string(),
            ));
        }
        let election = Election::create(ctx, name, duration_days)?;
        self.store.commit(Commit::since(&election, 0)).await?;
        info!(
            "Deployed election \"{}\" with commissioner {}",
            election.name(),
            election.commissioner()
        );
        *current = Some(election);
        Ok(())
    }

    /// Run a mutating operation and persist its effects.
    pub async fn execute<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Election) -> std::result::Result<T, ElectionError> + Send,
        T: Send,
    {
        let mut current = self.election.lock().await;
        let election = current.as_mut().ok_or_else(not_deployed)?;
        let checkpoint = election.checkpoint();
        let since = election.events().len();
        let value = match operation(election) {
            Ok(value) => value,
            Err(e) => {
                election.rollback(checkpoint);
                return Err(e.into());
            }
        };
        let committed = self.store.commit(Commit::since(election, since)).await;
        if let Err(e) = committed {
            error!("Failed to commit election changes, rolling back: {e}");
            election.rollback(checkpoint);
            return Err(e);
        }
        info!(
            "Committed events {since}..{} of the election",
            election.events().len()
        );
        Ok(value)
    }

    /// Run a read-only query against the current state.
    pub async fn read<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&Election) -> T + Send,
    {
        let current = self.election.lock().await;
        Ok(query(current.as_ref().ok_or_else(not_deployed)?))
    }
}

fn not_deployed() -> Error {
    Error::not_found("no election has been deployed".to_string())
}
