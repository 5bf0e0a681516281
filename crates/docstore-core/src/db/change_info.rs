// ChangeInfo — summary of what a mutation did on the store.

use bson::Bson;
use serde::Serialize;

/// Counts of documents updated, removed and matched by one mutation, plus
/// the identifier of an upserted document if one was inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeInfo {
    updated: u64,
    removed: u64,
    matched: u64,
    upserted_id: Option<Bson>,
}

impl ChangeInfo {
    pub fn new(updated: u64, removed: u64, matched: u64, upserted_id: Option<Bson>) -> Self {
        Self {
            updated,
            removed,
            matched,
            upserted_id,
        }
    }

    /// Outcome of a removal.
    pub fn removed(removed: u64) -> Self {
        Self::new(0, removed, 0, None)
    }

    /// Outcome of an update.
    pub fn updated(updated: u64, matched: u64) -> Self {
        Self::new(updated, 0, matched, None)
    }

    /// Outcome of an upsert. `id` is set only when a new document was inserted.
    pub fn upserted(updated: u64, matched: u64, id: Option<Bson>) -> Self {
        Self::new(updated, 0, matched, id)
    }

    pub fn updated_count(&self) -> u64 {
        self.updated
    }

    pub fn removed_count(&self) -> u64 {
        self.removed
    }

    pub fn matched_count(&self) -> u64 {
        self.matched
    }

    pub fn upserted_id(&self) -> Option<&Bson> {
        self.upserted_id.as_ref()
    }
}
