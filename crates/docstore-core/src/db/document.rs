// Document capability — the lifecycle contract every stored type fulfils.

use bson::oid::ObjectId;

use crate::db::Record;
use crate::error::DecodeError;
use crate::utils::{new_id, now_in_milli};

/// A record type that can be stored through a `Handle`.
///
/// Implementors expose the three lifecycle fields (`_id`, `created_on`,
/// `updated_on`) through the accessors below, and map their own fields to
/// and from a [`Record`] in `encode_fields`/`decode_fields`. Those two hooks
/// must not touch the lifecycle keys; `codec::encode` and `codec::decode`
/// handle them.
///
/// `Default` must produce the empty document: no id and zero timestamps.
pub trait Document: Default + Clone + Send + Sync + 'static {
    /// The identifier, or `None` when unset.
    fn id(&self) -> Option<ObjectId>;

    fn set_id(&mut self, id: ObjectId);

    /// Creation time in milliseconds since the Unix epoch, `0` when unset.
    fn created_on(&self) -> i64;

    fn set_created_on(&mut self, t: i64);

    /// Last update time in milliseconds since the Unix epoch, `0` when unset.
    fn updated_on(&self) -> i64;

    fn set_updated_on(&mut self, t: i64);

    /// Assign a freshly generated identifier.
    fn generate_id(&mut self) {
        self.set_id(new_id());
    }

    /// Set `created_on` to the current time.
    fn calculate_created_on(&mut self) {
        self.set_created_on(now_in_milli());
    }

    /// Set `updated_on` to the current time.
    fn calculate_updated_on(&mut self) {
        self.set_updated_on(now_in_milli());
    }

    /// Write the type's own fields into `record`.
    fn encode_fields(&self, record: &mut Record);

    /// Read the type's own fields from `record`.
    fn decode_fields(&mut self, record: &Record) -> Result<(), DecodeError>;
}
