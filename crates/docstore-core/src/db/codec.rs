// Record codec — typed documents to and from generic BSON records.
//
// Lifecycle fields are handled here; each document type maps its own fields
// through `Document::encode_fields`/`decode_fields` using the typed getters
// below. Getters never coerce: an Int32 where an Int64 is expected is a
// `DecodeError::WrongType`.

use bson::oid::ObjectId;
use bson::Bson;

use crate::db::{Document, Record};
use crate::error::DecodeError;

pub const ID_FIELD: &str = "_id";
pub const CREATED_ON_FIELD: &str = "created_on";
pub const UPDATED_ON_FIELD: &str = "updated_on";

/// Encode a document into a record.
///
/// `_id` is omitted when unset so the store can assign one. Both timestamps
/// are always present.
pub fn encode<D: Document>(document: &D) -> Record {
    let mut record = Record::new();
    if let Some(id) = document.id() {
        record.insert(ID_FIELD, id);
    }
    record.insert(CREATED_ON_FIELD, document.created_on());
    record.insert(UPDATED_ON_FIELD, document.updated_on());
    document.encode_fields(&mut record);
    record
}

/// Decode a record into a new document of type `D`.
pub fn decode<D: Document>(record: &Record) -> Result<D, DecodeError> {
    let mut document = D::default();
    decode_into(record, &mut document)?;
    Ok(document)
}

/// Populate an existing document from a record.
pub fn decode_into<D: Document>(record: &Record, document: &mut D) -> Result<(), DecodeError> {
    document.set_id(get_object_id(record, ID_FIELD)?);
    document.set_created_on(get_i64(record, CREATED_ON_FIELD)?);
    document.set_updated_on(get_i64(record, UPDATED_ON_FIELD)?);
    document.decode_fields(record)
}

/// The filter matching `document`: its encoding minus zero-valued fields.
///
/// An empty document yields an empty filter, which matches everything.
pub fn filter<D: Document>(document: &D) -> Record {
    encode(document)
        .into_iter()
        .filter(|(_, value)| !is_zero(value))
        .collect()
}

/// The update payload for `document`: every field except `_id` and
/// `created_on`.
pub fn changes<D: Document>(document: &D) -> Record {
    let mut record = encode(document);
    record.remove(ID_FIELD);
    record.remove(CREATED_ON_FIELD);
    record
}

/// Whether `value` is the zero value of its type.
pub fn is_zero(value: &Bson) -> bool {
    match value {
        Bson::Null => true,
        Bson::Boolean(b) => !b,
        Bson::Int32(v) => *v == 0,
        Bson::Int64(v) => *v == 0,
        Bson::Double(v) => *v == 0.0,
        Bson::String(s) => s.is_empty(),
        Bson::Array(items) => items.is_empty(),
        Bson::Document(doc) => doc.is_empty(),
        _ => false,
    }
}

/// Short name of a BSON value's type, for error messages.
pub fn kind(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binary",
        Bson::RegularExpression(_) => "regex",
        Bson::Decimal128(_) => "decimal",
        _ => "other",
    }
}

// ─── Typed getters ──────────────────────────────────────────────

fn field<'a>(record: &'a Record, key: &str) -> Result<&'a Bson, DecodeError> {
    record.get(key).ok_or_else(|| DecodeError::missing(key))
}

fn optional<'a>(record: &'a Record, key: &str) -> Option<&'a Bson> {
    match record.get(key) {
        None | Some(Bson::Null) => None,
        Some(value) => Some(value),
    }
}

fn wrong(key: &str, expected: &'static str, found: &Bson) -> DecodeError {
    DecodeError::wrong_type(key, expected, kind(found))
}

pub fn get_str<'a>(record: &'a Record, key: &str) -> Result<&'a str, DecodeError> {
    match field(record, key)? {
        Bson::String(s) => Ok(s),
        other => Err(wrong(key, "string", other)),
    }
}

pub fn get_i64(record: &Record, key: &str) -> Result<i64, DecodeError> {
    match field(record, key)? {
        Bson::Int64(v) => Ok(*v),
        other => Err(wrong(key, "int64", other)),
    }
}

pub fn get_i32(record: &Record, key: &str) -> Result<i32, DecodeError> {
    match field(record, key)? {
        Bson::Int32(v) => Ok(*v),
        other => Err(wrong(key, "int32", other)),
    }
}

pub fn get_f64(record: &Record, key: &str) -> Result<f64, DecodeError> {
    match field(record, key)? {
        Bson::Double(v) => Ok(*v),
        other => Err(wrong(key, "double", other)),
    }
}

pub fn get_bool(record: &Record, key: &str) -> Result<bool, DecodeError> {
    match field(record, key)? {
        Bson::Boolean(v) => Ok(*v),
        other => Err(wrong(key, "bool", other)),
    }
}

pub fn get_object_id(record: &Record, key: &str) -> Result<ObjectId, DecodeError> {
    match field(record, key)? {
        Bson::ObjectId(id) => Ok(*id),
        other => Err(wrong(key, "objectId", other)),
    }
}

pub fn get_record<'a>(record: &'a Record, key: &str) -> Result<&'a Record, DecodeError> {
    match field(record, key)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(wrong(key, "document", other)),
    }
}

/// A string array; every element must be a string.
pub fn get_str_array(record: &Record, key: &str) -> Result<Vec<String>, DecodeError> {
    match field(record, key)? {
        Bson::Array(items) => items
            .iter()
            .map(|item| match item {
                Bson::String(s) => Ok(s.clone()),
                other => Err(wrong(key, "string array", other)),
            })
            .collect(),
        other => Err(wrong(key, "array", other)),
    }
}

pub fn get_opt_str<'a>(record: &'a Record, key: &str) -> Result<Option<&'a str>, DecodeError> {
    match optional(record, key) {
        None => Ok(None),
        Some(Bson::String(s)) => Ok(Some(s)),
        Some(other) => Err(wrong(key, "string", other)),
    }
}

pub fn get_opt_i64(record: &Record, key: &str) -> Result<Option<i64>, DecodeError> {
    match optional(record, key) {
        None => Ok(None),
        Some(Bson::Int64(v)) => Ok(Some(*v)),
        Some(other) => Err(wrong(key, "int64", other)),
    }
}

pub fn get_opt_f64(record: &Record, key: &str) -> Result<Option<f64>, DecodeError> {
    match optional(record, key) {
        None => Ok(None),
        Some(Bson::Double(v)) => Ok(Some(*v)),
        Some(other) => Err(wrong(key, "double", other)),
    }
}

pub fn get_opt_bool(record: &Record, key: &str) -> Result<Option<bool>, DecodeError> {
    match optional(record, key) {
        None => Ok(None),
        Some(Bson::Boolean(v)) => Ok(Some(*v)),
        Some(other) => Err(wrong(key, "bool", other)),
    }
}

pub fn get_opt_object_id(record: &Record, key: &str) -> Result<Option<ObjectId>, DecodeError> {
    match optional(record, key) {
        None => Ok(None),
        Some(Bson::ObjectId(id)) => Ok(Some(*id)),
        Some(other) => Err(wrong(key, "objectId", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::fmt;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Note {
        id: Option<ObjectId>,
        created_on: i64,
        updated_on: i64,
        title: String,
        pinned: bool,
        author: Option<String>,
    }

    impl Document for Note {
        fn id(&self) -> Option<ObjectId> {
            self.id
        }
        fn set_id(&mut self, id: ObjectId) {
            self.id = Some(id);
        }
        fn created_on(&self) -> i64 {
            self.created_on
        }
        fn set_created_on(&mut self, t: i64) {
            self.created_on = t;
        }
        fn updated_on(&self) -> i64 {
            self.updated_on
        }
        fn set_updated_on(&mut self, t: i64) {
            self.updated_on = t;
        }
        fn encode_fields(&self, record: &mut Record) {
            record.insert("title", self.title.as_str());
            record.insert("pinned", self.pinned);
            record.insert("author", self.author.clone());
        }
        fn decode_fields(&mut self, record: &Record) -> Result<(), DecodeError> {
            self.title = get_str(record, "title")?.to_string();
            self.pinned = get_bool(record, "pinned")?;
            self.author = get_opt_str(record, "author")?.map(str::to_string);
            Ok(())
        }
    }

    fn full_note() -> Note {
        let mut note = Note {
            title: "groceries".into(),
            pinned: true,
            author: Some("sam".into()),
            ..Default::default()
        };
        note.generate_id();
        note.calculate_created_on();
        note.calculate_updated_on();
        note
    }

    #[test]
    fn test_round_trip() {
        let note = full_note();
        let back: Note = decode(&encode(&note)).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_encode_omits_unset_id() {
        let record = encode(&Note::default());
        assert!(!record.contains_key(ID_FIELD));
        assert_eq!(record.get(CREATED_ON_FIELD), Some(&Bson::Int64(0)));
        assert_eq!(record.get(UPDATED_ON_FIELD), Some(&Bson::Int64(0)));
    }

    #[test]
    fn test_decode_missing_field() {
        let mut record = encode(&full_note());
        record.remove("title");
        assert_eq!(
            decode::<Note>(&record),
            Err(DecodeError::MissingField("title".into()))
        );
    }

    #[test]
    fn test_decode_missing_id() {
        let record = encode(&Note::default());
        assert_eq!(
            decode::<Note>(&record),
            Err(DecodeError::MissingField("_id".into()))
        );
    }

    #[test]
    fn test_decode_does_not_coerce() {
        let mut record = encode(&full_note());
        record.insert(CREATED_ON_FIELD, 5_i32);
        assert_eq!(
            decode::<Note>(&record),
            Err(DecodeError::wrong_type(CREATED_ON_FIELD, "int64", "int32"))
        );

        let mut record = encode(&full_note());
        record.insert("pinned", "yes");
        assert!(matches!(
            decode::<Note>(&record),
            Err(DecodeError::WrongType { ref field, .. }) if field == "pinned"
        ));
    }

    #[test]
    fn test_null_optional_decodes_as_none() {
        let mut note = full_note();
        note.author = None;
        let record = encode(&note);
        assert_eq!(record.get("author"), Some(&Bson::Null));
        let back: Note = decode(&record).unwrap();
        assert_eq!(back.author, None);
    }

    #[test]
    fn test_filter_keeps_only_non_zero_fields() {
        let id = ObjectId::new();
        let mut note = Note::default();
        note.set_id(id);
        assert_eq!(filter(&note), doc! { "_id": id });
        assert!(filter(&Note::default()).is_empty());
    }

    #[test]
    fn test_changes_exclude_id_and_created_on() {
        let note = full_note();
        let changes = changes(&note);
        assert!(!changes.contains_key(ID_FIELD));
        assert!(!changes.contains_key(CREATED_ON_FIELD));
        assert_eq!(changes.get_i64(UPDATED_ON_FIELD).unwrap(), note.updated_on);
        assert_eq!(changes.get_str("title").unwrap(), "groceries");
    }

    fn sample() -> Record {
        doc! {
            "i32": 7_i32,
            "i64": 7_i64,
            "f64": 7.0,
            "flag": true,
            "oid": ObjectId::new(),
            "rec": { "a": 1_i32 },
            "nil": Bson::Null,
        }
    }

    fn assert_wrong(result: Result<impl fmt::Debug, DecodeError>, key: &str) {
        match result {
            Err(DecodeError::WrongType { field, .. }) => assert_eq!(field, key),
            other => panic!("{key}: expected WrongType, got {other:?}"),
        }
    }

    fn assert_missing(result: Result<impl fmt::Debug, DecodeError>, key: &str) {
        match result {
            Err(DecodeError::MissingField(field)) => assert_eq!(field, key),
            other => panic!("{key}: expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_required_getters_accept_exact_type() {
        let record = sample();
        assert_eq!(get_i32(&record, "i32").unwrap(), 7);
        assert_eq!(get_i64(&record, "i64").unwrap(), 7);
        assert_eq!(get_f64(&record, "f64").unwrap(), 7.0);
        assert!(get_bool(&record, "flag").unwrap());
        assert_eq!(get_object_id(&record, "oid").unwrap(), record.get_object_id("oid").unwrap());
        assert_eq!(get_record(&record, "rec").unwrap(), &doc! { "a": 1_i32 });
    }

    #[test]
    fn test_required_getters_never_coerce() {
        let record = sample();
        assert_wrong(get_i32(&record, "i64"), "i64");
        assert_wrong(get_i32(&record, "f64"), "f64");
        assert_wrong(get_i64(&record, "i32"), "i32");
        assert_wrong(get_f64(&record, "i32"), "i32");
        assert_wrong(get_f64(&record, "i64"), "i64");
        assert_wrong(get_bool(&record, "i32"), "i32");
        assert_wrong(get_str(&record, "oid"), "oid");
        assert_wrong(get_object_id(&record, "rec"), "rec");
        assert_wrong(get_record(&record, "oid"), "oid");
        assert_wrong(get_i64(&record, "nil"), "nil");
    }

    #[test]
    fn test_required_getters_report_missing() {
        let record = sample();
        assert_missing(get_str(&record, "absent"), "absent");
        assert_missing(get_i32(&record, "absent"), "absent");
        assert_missing(get_i64(&record, "absent"), "absent");
        assert_missing(get_f64(&record, "absent"), "absent");
        assert_missing(get_bool(&record, "absent"), "absent");
        assert_missing(get_object_id(&record, "absent"), "absent");
        assert_missing(get_record(&record, "absent"), "absent");
        assert_missing(get_str_array(&record, "absent"), "absent");
    }

    #[test]
    fn test_optional_getters() {
        let record = sample();
        assert_eq!(get_opt_i64(&record, "i64").unwrap(), Some(7));
        assert_eq!(get_opt_f64(&record, "f64").unwrap(), Some(7.0));
        assert_eq!(get_opt_bool(&record, "flag").unwrap(), Some(true));
        assert!(get_opt_object_id(&record, "oid").unwrap().is_some());

        for key in ["nil", "absent"] {
            assert_eq!(get_opt_str(&record, key).unwrap(), None);
            assert_eq!(get_opt_i64(&record, key).unwrap(), None);
            assert_eq!(get_opt_f64(&record, key).unwrap(), None);
            assert_eq!(get_opt_bool(&record, key).unwrap(), None);
            assert_eq!(get_opt_object_id(&record, key).unwrap(), None);
        }

        assert_wrong(get_opt_i64(&record, "i32"), "i32");
        assert_wrong(get_opt_f64(&record, "i32"), "i32");
        assert_wrong(get_opt_f64(&record, "i64"), "i64");
        assert_wrong(get_opt_bool(&record, "i32"), "i32");
        assert_wrong(get_opt_object_id(&record, "f64"), "f64");
        assert_wrong(get_opt_str(&record, "flag"), "flag");
    }

    #[test]
    fn test_str_array_rejects_mixed_elements() {
        let record = doc! { "tags": ["a", 1_i32] };
        assert!(get_str_array(&record, "tags").is_err());
        let record = doc! { "tags": ["a", "b"] };
        assert_eq!(get_str_array(&record, "tags").unwrap(), vec!["a", "b"]);
    }
}
