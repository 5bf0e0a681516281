// docstore-mongodb — MongoDB backend for docstore.
//
// `MongoConnection` owns the client; `MongoDatabase` and `MongoCollection`
// implement the store traits from `docstore-core` over the `mongodb` driver.

pub mod adapter;
pub mod connection;
pub mod query;

pub use adapter::{map_error, MongoCollection, MongoDatabase};
pub use connection::MongoConnection;
