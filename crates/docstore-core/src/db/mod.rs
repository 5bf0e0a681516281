pub mod change_info;
pub mod codec;
pub mod document;
pub mod query;
pub mod store;

/// Generic key-value form of a stored document.
pub type Record = bson::Document;

pub use change_info::ChangeInfo;
pub use document::Document;
pub use query::{FindQuery, SortBy, SortDirection};
pub use store::{validate_collection_name, Collection, Database};
