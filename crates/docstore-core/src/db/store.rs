// Store capability traits — the seam between handles and a backend.
//
// Each backend (MongoDB, memory) implements `Database` and `Collection`.
// Every method maps to one backend call; nothing here retries or caches.
//
// Filters are plain records: top-level equality plus the comparison
// operators `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte` and `$in`.
// `changes` records are applied as field-level sets.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson};

use crate::db::{ChangeInfo, FindQuery, Record};
use crate::error::{StoreError, StoreResult};

fn id_filter(id: &ObjectId) -> Record {
    doc! { "_id": *id }
}

/// Operations on one named collection.
#[async_trait]
pub trait Collection: Send + Sync + fmt::Debug {
    /// The collection name.
    fn name(&self) -> &str;

    /// Count records matching `filter`. An empty filter counts everything.
    async fn count(&self, filter: &Record) -> StoreResult<u64>;

    /// The first record matching `filter`, if any. Which record is first
    /// when several match is up to the store.
    async fn find_one(&self, filter: &Record) -> StoreResult<Option<Record>>;

    /// Shorthand for `find_one({"_id": id})`.
    async fn find_id(&self, id: &ObjectId) -> StoreResult<Option<Record>> {
        self.find_one(&id_filter(id)).await
    }

    /// Every record matching the query.
    async fn find_all(&self, query: &FindQuery) -> StoreResult<Vec<Record>>;

    /// Insert a new record, returning its `_id`. A record without `_id`
    /// gets one assigned by the store.
    async fn insert(&self, record: Record) -> StoreResult<Bson>;

    /// Remove the first record matching `filter`.
    async fn remove(&self, filter: &Record) -> StoreResult<ChangeInfo>;

    /// Shorthand for `remove({"_id": id})`.
    async fn remove_id(&self, id: &ObjectId) -> StoreResult<ChangeInfo> {
        self.remove(&id_filter(id)).await
    }

    /// Remove every record matching `filter`.
    async fn remove_all(&self, filter: &Record) -> StoreResult<ChangeInfo>;

    /// Apply `changes` to the first record matching `filter`. Matching
    /// nothing is not an error; check `ChangeInfo::matched_count`.
    async fn update(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo>;

    /// Shorthand for `update({"_id": id}, changes)`.
    async fn update_id(&self, id: &ObjectId, changes: &Record) -> StoreResult<ChangeInfo> {
        self.update(&id_filter(id), changes).await
    }

    /// Apply `changes` to every record matching `filter`.
    async fn update_all(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo>;

    /// Apply `changes` to the first record matching `filter`, or insert the
    /// filter's equality fields merged with `changes` if nothing matches.
    async fn upsert(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo>;

    /// Shorthand for `upsert({"_id": id}, changes)`.
    async fn upsert_id(&self, id: &ObjectId, changes: &Record) -> StoreResult<ChangeInfo> {
        self.upsert(&id_filter(id), changes).await
    }
}

/// A connected database: a source of named collections.
#[async_trait]
pub trait Database: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// A handle to the named collection. Cheap; no round trip.
    fn collection(&self, name: &str) -> StoreResult<Arc<dyn Collection>>;

    async fn collection_names(&self) -> StoreResult<Vec<String>>;

    async fn drop_database(&self) -> StoreResult<()>;
}

/// Check a collection name against the rules every backend enforces.
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    if name.is_empty()
        || name.contains('$')
        || name.contains('\0')
        || name.starts_with("system.")
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
