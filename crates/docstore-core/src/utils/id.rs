// Identifier generation.
//
// Identifiers are 12-byte ObjectIds: a 4-byte timestamp, a 5-byte
// process-unique value and a 3-byte counter, displayed as 24 hex characters.

use bson::oid::ObjectId;

use crate::error::DecodeError;

/// Generate a fresh identifier.
pub fn new_id() -> ObjectId {
    ObjectId::new()
}

/// Parse a 24-character hexadecimal identifier.
pub fn object_id_hex(hex: &str) -> Result<ObjectId, DecodeError> {
    ObjectId::parse_str(hex).map_err(|_| DecodeError::InvalidId(hex.to_string()))
}
