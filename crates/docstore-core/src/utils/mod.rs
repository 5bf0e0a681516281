// Utility functions — identifier generation and wall-clock timestamps.

pub mod id;
pub mod time;

pub use id::{new_id, object_id_hex};
pub use time::now_in_milli;
