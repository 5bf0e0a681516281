// docstore-core — shared contracts for docstore.
//
// Defines the `Document` capability, the record codec, the `Collection` and
// `Database` store traits every backend implements, the error taxonomy, and
// environment/logging setup.

pub mod db;
pub mod env;
pub mod error;
pub mod utils;

// Re-exports for convenience
pub use bson;
pub use bson::oid::ObjectId;
pub use bson::{doc, Bson};
pub use db::codec;
pub use db::{
    ChangeInfo, Collection, Database, Document, FindQuery, Record, SortBy, SortDirection,
};
pub use env::{init_logger, ConnectionConfig};
pub use error::{ConfigError, DecodeError, HandleError, HandleResult, StoreError, StoreResult};
pub use utils::{new_id, now_in_milli, object_id_hex};
