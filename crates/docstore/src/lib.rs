// docstore — typed document handles over a store backend.
//
// A `Handle<D>` binds a `Document` type to one collection of any backend
// implementing `docstore_core::Database` (MongoDB, memory) and exposes
// count/find/find-all/insert/update/remove/remove-all on it.

pub mod handle;

pub use handle::Handle;

pub use docstore_core::{
    codec, doc, Bson, ChangeInfo, Collection, Database, DecodeError, Document, FindQuery,
    HandleError, HandleResult, ObjectId, Record, SortDirection, StoreError,
};
