// MongoDB backend — `Database` and `Collection` over the official driver.
//
// Every capability call maps to exactly one driver call. Filters and changes
// records pass through untouched; changes are wrapped in `$set`.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::error::{ErrorKind, WriteFailure};

use docstore_core::db::{validate_collection_name, ChangeInfo, Collection, Database, FindQuery};
use docstore_core::error::{StoreError, StoreResult};
use docstore_core::{Bson, Record};

use crate::query;

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Translate a driver error. Duplicate key violations become
/// [`StoreError::DuplicateKey`]; everything else is passed through as is.
pub fn map_error(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write)) = err.kind.as_ref() {
        if write.code == DUPLICATE_KEY_CODE {
            return StoreError::DuplicateKey(write.message.clone());
        }
    }
    StoreError::driver(err)
}

/// MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    db: mongodb::Database,
}

impl MongoDatabase {
    pub fn new(db: mongodb::Database) -> Self {
        Self { db }
    }

    /// Get a reference to the underlying driver database.
    pub fn inner(&self) -> &mongodb::Database {
        &self.db
    }
}

#[async_trait]
impl Database for MongoDatabase {
    fn name(&self) -> &str {
        self.db.name()
    }

    fn collection(&self, name: &str) -> StoreResult<Arc<dyn Collection>> {
        validate_collection_name(name)?;
        Ok(Arc::new(MongoCollection::new(self.db.collection::<Record>(name))))
    }

    async fn collection_names(&self) -> StoreResult<Vec<String>> {
        tracing::debug!("[MongoDB] LIST_COLLECTIONS on '{}'", self.db.name());
        let mut names = self.db.list_collection_names().await.map_err(map_error)?;
        names.sort();
        Ok(names)
    }

    async fn drop_database(&self) -> StoreResult<()> {
        tracing::debug!("[MongoDB] DROP_DATABASE '{}'", self.db.name());
        self.db.drop().await.map_err(map_error)
    }
}

/// MongoDB collection of raw records.
#[derive(Debug, Clone)]
pub struct MongoCollection {
    coll: mongodb::Collection<Record>,
}

impl MongoCollection {
    pub fn new(coll: mongodb::Collection<Record>) -> Self {
        Self { coll }
    }

    pub fn inner(&self) -> &mongodb::Collection<Record> {
        &self.coll
    }
}

#[async_trait]
impl Collection for MongoCollection {
    fn name(&self) -> &str {
        self.coll.name()
    }

    async fn count(&self, filter: &Record) -> StoreResult<u64> {
        tracing::debug!("[MongoDB] COUNT on '{}'", self.name());
        self.coll
            .count_documents(filter.clone())
            .await
            .map_err(map_error)
    }

    async fn find_one(&self, filter: &Record) -> StoreResult<Option<Record>> {
        tracing::debug!("[MongoDB] FIND_ONE on '{}'", self.name());
        self.coll.find_one(filter.clone()).await.map_err(map_error)
    }

    async fn find_all(&self, query: &FindQuery) -> StoreResult<Vec<Record>> {
        tracing::debug!("[MongoDB] FIND_ALL on '{}'", self.name());
        let mut cursor = self
            .coll
            .find(query.filter.clone())
            .with_options(query::build_find_options(query))
            .await
            .map_err(map_error)?;

        let mut results = Vec::new();
        while let Some(record) = cursor.next().await {
            results.push(record.map_err(map_error)?);
        }
        Ok(results)
    }

    async fn insert(&self, record: Record) -> StoreResult<Bson> {
        tracing::debug!("[MongoDB] INSERT on '{}'", self.name());
        let result = self.coll.insert_one(record).await.map_err(map_error)?;
        Ok(result.inserted_id)
    }

    async fn remove(&self, filter: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[MongoDB] REMOVE on '{}'", self.name());
        let result = self
            .coll
            .delete_one(filter.clone())
            .await
            .map_err(map_error)?;
        Ok(ChangeInfo::removed(result.deleted_count))
    }

    async fn remove_all(&self, filter: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[MongoDB] REMOVE_ALL on '{}'", self.name());
        let result = self
            .coll
            .delete_many(filter.clone())
            .await
            .map_err(map_error)?;
        Ok(ChangeInfo::removed(result.deleted_count))
    }

    async fn update(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[MongoDB] UPDATE on '{}'", self.name());
        let result = self
            .coll
            .update_one(filter.clone(), query::build_update_doc(changes))
            .await
            .map_err(map_error)?;
        Ok(ChangeInfo::updated(result.modified_count, result.matched_count))
    }

    async fn update_all(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[MongoDB] UPDATE_ALL on '{}'", self.name());
        let result = self
            .coll
            .update_many(filter.clone(), query::build_update_doc(changes))
            .await
            .map_err(map_error)?;
        Ok(ChangeInfo::updated(result.modified_count, result.matched_count))
    }

    async fn upsert(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[MongoDB] UPSERT on '{}'", self.name());
        let result = self
            .coll
            .update_one(filter.clone(), query::build_update_doc(changes))
            .upsert(true)
            .await
            .map_err(map_error)?;
        Ok(ChangeInfo::upserted(
            result.modified_count,
            result.matched_count,
            result.upserted_id,
        ))
    }
}
