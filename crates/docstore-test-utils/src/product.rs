// Product fixture — a small document type exercising string, integer and
// array fields alongside the lifecycle fields.

use docstore_core::codec;
use docstore_core::{DecodeError, Document, ObjectId, Record};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    pub id: Option<ObjectId>,
    pub created_on: i64,
    pub updated_on: i64,
    pub name: String,
    pub price: i64,
    pub tags: Vec<String>,
}

impl Product {
    pub fn new(name: &str, price: i64) -> Self {
        Self {
            name: name.to_string(),
            price,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// An empty product carrying only `id`, the shape used to look one up.
    pub fn by_id(id: ObjectId) -> Self {
        Self::default().with_id(id)
    }
}

impl Document for Product {
    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn created_on(&self) -> i64 {
        self.created_on
    }

    fn set_created_on(&mut self, millis: i64) {
        self.created_on = millis;
    }

    fn updated_on(&self) -> i64 {
        self.updated_on
    }

    fn set_updated_on(&mut self, millis: i64) {
        self.updated_on = millis;
    }

    fn encode_fields(&self, record: &mut Record) {
        record.insert("name", self.name.as_str());
        record.insert("price", self.price);
        record.insert("tags", self.tags.clone());
    }

    fn decode_fields(&mut self, record: &Record) -> Result<(), DecodeError> {
        self.name = codec::get_str(record, "name")?.to_string();
        self.price = codec::get_i64(record, "price")?;
        self.tags = codec::get_str_array(record, "tags")?;
        Ok(())
    }
}
