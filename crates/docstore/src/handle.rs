// Handle — typed CRUD over one collection.
//
// A handle owns a working document of type `D` and an optional search
// record. Each operation builds a record from them, issues one call on the
// linked collection, and decodes any result back into fresh `D` values.

use std::fmt;
use std::sync::Arc;

use docstore_core::codec;
use docstore_core::db::{ChangeInfo, Collection, Database, Document, FindQuery, Record};
use docstore_core::error::{DecodeError, HandleError, HandleResult};
use docstore_core::{now_in_milli, Bson, ObjectId};

/// CRUD adapter binding document type `D` to one collection.
///
/// A handle starts unlinked; every operation fails with
/// [`HandleError::NotLinked`] until [`Handle::link`] succeeds. Linking is
/// permanent, though linking again re-targets the handle.
///
/// Operations filter on the *current filter*: the search record when one is
/// set, otherwise the non-zero fields of the working document.
pub struct Handle<D: Document> {
    collection: Option<Arc<dyn Collection>>,
    document: D,
    search: Option<Record>,
}

impl<D: Document> Default for Handle<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> fmt::Debug for Handle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("collection", &self.name())
            .field("search", &self.search)
            .finish()
    }
}

impl<D: Document> Handle<D> {
    /// Create an unlinked handle with an empty document.
    pub fn new() -> Self {
        Self {
            collection: None,
            document: D::default(),
            search: None,
        }
    }

    /// Link to the named collection of `db`.
    pub fn link(&mut self, db: &dyn Database, name: &str) -> HandleResult<&mut Self> {
        let collection = db.collection(name)?;
        tracing::debug!("[Handle] linked to '{}.{}'", db.name(), name);
        self.collection = Some(collection);
        Ok(self)
    }

    /// Link directly to a collection capability.
    pub fn with_collection(mut self, collection: Arc<dyn Collection>) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn is_linked(&self) -> bool {
        self.collection.is_some()
    }

    /// Name of the linked collection.
    pub fn name(&self) -> Option<&str> {
        self.collection.as_deref().map(|c| c.name())
    }

    /// Reset the working document and search record. The link is kept.
    pub fn clean(&mut self) -> &mut Self {
        self.document = D::default();
        self.search = None;
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Replace the working document.
    pub fn set_document(&mut self, document: D) -> &mut Self {
        self.document = document;
        self
    }

    pub fn search(&self) -> Option<&Record> {
        self.search.as_ref()
    }

    /// Filter on `search` instead of the working document.
    pub fn set_search(&mut self, search: Record) -> &mut Self {
        self.search = Some(search);
        self
    }

    /// The record operations currently filter on.
    pub fn filter(&self) -> Record {
        match &self.search {
            Some(search) => search.clone(),
            None => codec::filter(&self.document),
        }
    }

    fn linked(&self) -> HandleResult<&dyn Collection> {
        self.collection.as_deref().ok_or(HandleError::NotLinked)
    }

    /// Number of stored documents matching the current filter.
    pub async fn count(&self) -> HandleResult<u64> {
        let collection = self.linked()?;
        Ok(collection.count(&self.filter()).await?)
    }

    /// One document matching the current filter.
    ///
    /// When several match, which one is returned is up to the store.
    pub async fn find(&self) -> HandleResult<D> {
        let collection = self.linked()?;
        let record = collection
            .find_one(&self.filter())
            .await?
            .ok_or(HandleError::NotFound)?;
        Ok(codec::decode(&record)?)
    }

    /// Every document matching the current filter, in store order.
    pub async fn find_all(&self) -> HandleResult<Vec<D>> {
        self.find_all_with(FindQuery::default()).await
    }

    /// As [`Handle::find_all`], with sort/skip/limit from `query`. The
    /// query's own filter is replaced by the current filter.
    pub async fn find_all_with(&self, query: FindQuery) -> HandleResult<Vec<D>> {
        let collection = self.linked()?;
        let query = query.with_filter(self.filter());
        let records = collection.find_all(&query).await?;
        records
            .iter()
            .map(|record| codec::decode(record).map_err(HandleError::from))
            .collect()
    }

    /// Store the working document as a new record.
    ///
    /// Sets `created_on` first if it is zero. When the document has no id
    /// the store assigns one; it is returned but not written back into the
    /// working document.
    pub async fn insert(&mut self) -> HandleResult<ObjectId> {
        let collection = self.collection.as_deref().ok_or(HandleError::NotLinked)?;
        if self.document.created_on() == 0 {
            self.document.calculate_created_on();
        }
        let id = collection.insert(codec::encode(&self.document)).await?;
        match id {
            Bson::ObjectId(id) => Ok(id),
            other => Err(DecodeError::wrong_type("_id", "objectId", codec::kind(&other)).into()),
        }
    }

    /// Apply the working document's fields to the stored document `id`.
    ///
    /// Stamps `updated_on` with the current time, or one past the working
    /// document's own `updated_on` when the clock has not moved beyond it.
    /// Only that value is consulted: a fresh working document updated twice
    /// within one millisecond writes the same stamp both times. `_id` and
    /// `created_on` are never written.
    pub async fn update(&mut self, id: &ObjectId) -> HandleResult<()> {
        let collection = self.collection.as_deref().ok_or(HandleError::NotLinked)?;
        let stamp = now_in_milli().max(self.document.updated_on().saturating_add(1));
        self.document.set_updated_on(stamp);
        let info = collection
            .update_id(id, &codec::changes(&self.document))
            .await?;
        if info.matched_count() == 0 {
            return Err(HandleError::NotFound);
        }
        Ok(())
    }

    /// Delete the stored document `id`.
    pub async fn remove(&self, id: &ObjectId) -> HandleResult<()> {
        let collection = self.linked()?;
        let info = collection.remove_id(id).await?;
        if info.removed_count() == 0 {
            return Err(HandleError::NotFound);
        }
        Ok(())
    }

    /// Delete every document matching the current filter.
    pub async fn remove_all(&self) -> HandleResult<ChangeInfo> {
        let collection = self.linked()?;
        Ok(collection.remove_all(&self.filter()).await?)
    }
}
