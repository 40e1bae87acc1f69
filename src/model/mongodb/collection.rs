use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};

use crate::model::{
    account::Account,
    election::{Candidate, ElectionHeader, EventRecord, VoterRecord},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Holds a single document.
impl MongoCollection for ElectionHeader {
    const NAME: &'static str = "election";
}

impl MongoCollection for VoterRecord {
    const NAME: &'static str = "voters";
}

impl MongoCollection for Candidate {
    const NAME: &'static str = "candidates";
}

impl MongoCollection for EventRecord {
    const NAME: &'static str = "events";
}

impl MongoCollection for Account {
    const NAME: &'static str = "accounts";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();
    let unique_index = |field: &str| {
        IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(unique.clone())
            .build()
    };

    // Voter collection: one record per address, and per national ID.
    let voters = Coll::<VoterRecord>::from_db(db);
    voters.create_index(unique_index("address"), None).await?;
    voters.create_index(unique_index("nationalId"), None).await?;

    // Candidate collection.
    Coll::<Candidate>::from_db(db)
        .create_index(unique_index("id"), None)
        .await?;

    // Event collection: the log has no gaps and no duplicates.
    Coll::<EventRecord>::from_db(db)
        .create_index(unique_index("sequence"), None)
        .await?;

    // Account collection.
    Coll::<Account>::from_db(db)
        .create_index(unique_index("address"), None)
        .await?;

    Ok(())
}
