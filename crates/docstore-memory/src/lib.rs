// docstore-memory — in-memory backend for docstore.
//
// Implements the core `Database` and `Collection` traits over a HashMap, so
// handles can be exercised without a running server.

pub mod adapter;

pub use adapter::{MemoryCollection, MemoryDatabase, Store};
