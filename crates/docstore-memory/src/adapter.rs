// In-memory store — HashMap-based backend implementing the core store traits.
//
// Records live in `HashMap<String, Vec<Record>>` keyed by collection name,
// shared behind `Arc<tokio::sync::RwLock<...>>` by the database and every
// collection handle taken from it. Insertion order is kept, so unsorted
// reads come back in the order records were written.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use docstore_core::db::{
    validate_collection_name, ChangeInfo, Collection, Database, FindQuery, Record, SortDirection,
};
use docstore_core::error::{StoreError, StoreResult};
use docstore_core::{new_id, Bson};

/// Every collection's records, keyed by collection name.
pub type Store = HashMap<String, Vec<Record>>;

/// In-memory database.
///
/// Cloning shares the underlying store. Data is lost when the last clone is
/// dropped.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    name: String,
    store: Arc<RwLock<Store>>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new("test")
    }
}

impl MemoryDatabase {
    /// Create a new empty database.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a database pre-populated with records.
    pub fn with_data(name: impl Into<String>, data: Store) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(RwLock::new(data)),
        }
    }

    /// A copy of every collection (for debugging/testing).
    pub async fn snapshot(&self) -> Store {
        self.store.read().await.clone()
    }

    /// Drop every collection.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Number of records in one collection.
    pub async fn collection_len(&self, name: &str) -> usize {
        self.store
            .read()
            .await
            .get(name)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> StoreResult<Arc<dyn Collection>> {
        validate_collection_name(name)?;
        Ok(Arc::new(MemoryCollection {
            name: name.to_string(),
            store: self.store.clone(),
        }))
    }

    async fn collection_names(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.store.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn drop_database(&self) -> StoreResult<()> {
        self.clear().await;
        Ok(())
    }
}

/// One collection inside a [`MemoryDatabase`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: Arc<RwLock<Store>>,
}

// ─── Matching ───────────────────────────────────────────────────

/// Check if a record matches a filter.
fn matches_filter(record: &Record, filter: &Record) -> bool {
    filter.iter().all(|(key, condition)| {
        let value = record.get(key).unwrap_or(&Bson::Null);
        match condition {
            Bson::Document(ops) if is_operator_doc(ops) => ops
                .iter()
                .all(|(op, target)| match_operator(value, op, target)),
            target => values_equal(value, target),
        }
    })
}

fn is_operator_doc(doc: &Record) -> bool {
    !doc.is_empty() && doc.keys().all(|k| k.starts_with('$'))
}

/// Match a single operator condition.
fn match_operator(value: &Bson, op: &str, target: &Bson) -> bool {
    match op {
        "$eq" => values_equal(value, target),
        "$ne" => !values_equal(value, target),
        "$gt" => compare_bracketed(value, target) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare_bracketed(value, target),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => compare_bracketed(value, target) == Some(Ordering::Less),
        "$lte" => matches!(
            compare_bracketed(value, target),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "$in" => match target {
            Bson::Array(items) => items.iter().any(|item| values_equal(value, item)),
            _ => false,
        },
        _ => false,
    }
}

/// Numeric BSON value, kept at its stored width.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Bson) -> Option<Number> {
    match value {
        Bson::Int32(v) => Some(Number::Int(i64::from(*v))),
        Bson::Int64(v) => Some(Number::Int(*v)),
        Bson::Double(v) => Some(Number::Float(*v)),
        _ => None,
    }
}

/// Doubles order by value with NaN below every other number.
fn compare_f64(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer against a double.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first double above i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Ordering::Greater;
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => compare_f64(0.0, f - whole),
        other => other,
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (Number::Float(x), Number::Float(y)) => compare_f64(x, y),
        (Number::Int(x), Number::Float(y)) => compare_int_float(x, y),
        (Number::Float(x), Number::Int(y)) => compare_int_float(y, x).reverse(),
    }
}

/// Position of a value's type in the server's cross-type sort order.
/// Missing fields are looked up as `Null`.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => 2,
        Bson::Decimal128(_) => 3,
        Bson::String(_) | Bson::Symbol(_) => 4,
        Bson::Document(_) => 5,
        Bson::Array(_) => 6,
        Bson::Binary(_) => 7,
        Bson::ObjectId(_) => 8,
        Bson::Boolean(_) => 9,
        Bson::DateTime(_) => 10,
        Bson::Timestamp(_) => 11,
        Bson::RegularExpression(_) => 12,
        Bson::MaxKey => 14,
        _ => 13,
    }
}

/// Total order over BSON values: by type rank, then by value. Values of the
/// same rank with no natural order (documents, arrays) compare equal.
fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return compare_numbers(x, y);
    }
    match (a, b) {
        (Bson::String(x) | Bson::Symbol(x), Bson::String(y) | Bson::Symbol(y)) => x.cmp(y),
        (Bson::Binary(x), Bson::Binary(y)) => x.bytes.cmp(&y.bytes),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (Bson::RegularExpression(x), Bson::RegularExpression(y)) => {
            (&x.pattern, &x.options).cmp(&(&y.pattern, &y.options))
        }
        _ => Ordering::Equal,
    }
}

/// Range operators only match values in the target's type bracket.
fn compare_bracketed(value: &Bson, target: &Bson) -> Option<Ordering> {
    (type_rank(value) == type_rank(target)).then(|| compare_bson(value, target))
}

/// Equality where numbers of different widths compare by exact value.
fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => compare_numbers(x, y) == Ordering::Equal,
        _ => a == b,
    }
}

/// Apply sorting to records. Missing fields sort as `Null`.
fn sort_records(records: &mut [Record], query: &FindQuery) {
    if query.sort.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for key in &query.sort {
            let av = a.get(&key.field).unwrap_or(&Bson::Null);
            let bv = b.get(&key.field).unwrap_or(&Bson::Null);
            let cmp = match key.direction {
                SortDirection::Asc => compare_bson(av, bv),
                SortDirection::Desc => compare_bson(av, bv).reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

/// Merge update fields into an existing record. Returns whether anything
/// changed.
fn merge_update(record: &mut Record, changes: &Record) -> bool {
    let mut modified = false;
    for (key, value) in changes {
        if record.get(key) != Some(value) {
            record.insert(key.clone(), value.clone());
            modified = true;
        }
    }
    modified
}

/// Equality fields of a filter, used to seed an upserted record.
fn equality_fields(filter: &Record) -> Record {
    let mut seed = Record::new();
    for (key, condition) in filter {
        match condition {
            Bson::Document(ops) if is_operator_doc(ops) => {
                if let Some(value) = ops.get("$eq") {
                    seed.insert(key.clone(), value.clone());
                }
            }
            value => {
                seed.insert(key.clone(), value.clone());
            }
        }
    }
    seed
}

fn duplicate_id(records: &[Record], id: &Bson) -> bool {
    records.iter().any(|r| r.get("_id") == Some(id))
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self, filter: &Record) -> StoreResult<u64> {
        tracing::debug!("[Memory] COUNT on '{}'", self.name);
        let store = self.store.read().await;
        let count = store
            .get(&self.name)
            .map(|recs| recs.iter().filter(|r| matches_filter(r, filter)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn find_one(&self, filter: &Record) -> StoreResult<Option<Record>> {
        tracing::debug!("[Memory] FIND_ONE on '{}'", self.name);
        let store = self.store.read().await;
        Ok(store
            .get(&self.name)
            .and_then(|recs| recs.iter().find(|r| matches_filter(r, filter)).cloned()))
    }

    async fn find_all(&self, query: &FindQuery) -> StoreResult<Vec<Record>> {
        tracing::debug!("[Memory] FIND_ALL on '{}'", self.name);
        let store = self.store.read().await;
        let mut result: Vec<Record> = store
            .get(&self.name)
            .map(|recs| {
                recs.iter()
                    .filter(|r| matches_filter(r, &query.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_records(&mut result, query);

        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(result.into_iter().skip(skip).take(limit).collect())
    }

    async fn insert(&self, record: Record) -> StoreResult<Bson> {
        tracing::debug!("[Memory] INSERT on '{}'", self.name);
        let mut record = record;
        let id = match record.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(new_id());
                record.insert("_id", id.clone());
                id
            }
        };

        let mut store = self.store.write().await;
        let records = store.entry(self.name.clone()).or_default();
        if duplicate_id(records, &id) {
            return Err(StoreError::DuplicateKey(format!(
                "{} _id: {}",
                self.name, id
            )));
        }
        records.push(record);
        Ok(id)
    }

    async fn remove(&self, filter: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[Memory] REMOVE on '{}'", self.name);
        let mut store = self.store.write().await;
        if let Some(recs) = store.get_mut(&self.name) {
            if let Some(pos) = recs.iter().position(|r| matches_filter(r, filter)) {
                recs.remove(pos);
                return Ok(ChangeInfo::removed(1));
            }
        }
        Ok(ChangeInfo::removed(0))
    }

    async fn remove_all(&self, filter: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[Memory] REMOVE_ALL on '{}'", self.name);
        let mut store = self.store.write().await;
        if let Some(recs) = store.get_mut(&self.name) {
            let before = recs.len();
            recs.retain(|r| !matches_filter(r, filter));
            Ok(ChangeInfo::removed((before - recs.len()) as u64))
        } else {
            Ok(ChangeInfo::removed(0))
        }
    }

    async fn update(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[Memory] UPDATE on '{}'", self.name);
        let mut store = self.store.write().await;
        let found = store
            .get_mut(&self.name)
            .and_then(|recs| recs.iter_mut().find(|r| matches_filter(r, filter)));
        match found {
            Some(record) => {
                let modified = merge_update(record, changes);
                Ok(ChangeInfo::updated(u64::from(modified), 1))
            }
            None => Ok(ChangeInfo::updated(0, 0)),
        }
    }

    async fn update_all(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[Memory] UPDATE_ALL on '{}'", self.name);
        let mut store = self.store.write().await;
        let mut matched = 0u64;
        let mut updated = 0u64;
        if let Some(recs) = store.get_mut(&self.name) {
            for record in recs.iter_mut().filter(|r| matches_filter(r, filter)) {
                matched += 1;
                if merge_update(record, changes) {
                    updated += 1;
                }
            }
        }
        Ok(ChangeInfo::updated(updated, matched))
    }

    async fn upsert(&self, filter: &Record, changes: &Record) -> StoreResult<ChangeInfo> {
        tracing::debug!("[Memory] UPSERT on '{}'", self.name);
        let mut store = self.store.write().await;
        let records = store.entry(self.name.clone()).or_default();

        if let Some(record) = records.iter_mut().find(|r| matches_filter(r, filter)) {
            let modified = merge_update(record, changes);
            return Ok(ChangeInfo::upserted(u64::from(modified), 1, None));
        }

        let mut record = equality_fields(filter);
        merge_update(&mut record, changes);
        let id = match record.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(new_id());
                record.insert("_id", id.clone());
                id
            }
        };
        if duplicate_id(records, &id) {
            return Err(StoreError::DuplicateKey(format!(
                "{} _id: {}",
                self.name, id
            )));
        }
        records.push(record);
        Ok(ChangeInfo::upserted(0, 0, Some(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_core::{doc, ObjectId};

    fn products(db: &MemoryDatabase) -> Arc<dyn Collection> {
        db.collection("products").unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        let id = ObjectId::new();
        coll.insert(doc! { "_id": id, "name": "pen" }).await.unwrap();

        let found = coll.find_id(&id).await.unwrap().unwrap();
        assert_eq!(found.get_str("name").unwrap(), "pen");
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        let id = coll.insert(doc! { "name": "pen" }).await.unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));

        let found = coll.find_one(&doc! { "_id": id.clone() }).await.unwrap().unwrap();
        assert_eq!(found.get("_id"), Some(&id));
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        let id = ObjectId::new();
        coll.insert(doc! { "_id": id }).await.unwrap();
        let err = coll.insert(doc! { "_id": id }).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(db.collection_len("products").await, 1);
    }

    #[tokio::test]
    async fn test_find_one_not_found() {
        let db = MemoryDatabase::default();
        let found = products(&db).find_id(&ObjectId::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        for name in ["c", "a", "b"] {
            coll.insert(doc! { "name": name }).await.unwrap();
        }
        let all = coll.find_all(&FindQuery::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.get_str("name").unwrap()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_find_all_sorted_skip_limit() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        for price in [30_i64, 10, 50, 20, 40] {
            coll.insert(doc! { "price": price }).await.unwrap();
        }
        let query = FindQuery::default()
            .sort_by("price", SortDirection::Desc)
            .skip(1)
            .limit(2);
        let page = coll.find_all(&query).await.unwrap();
        let prices: Vec<i64> = page.iter().map(|r| r.get_i64("price").unwrap()).collect();
        assert_eq!(prices, vec![40, 30]);
    }

    #[tokio::test]
    async fn test_count_with_filter() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        coll.insert(doc! { "kind": "pen" }).await.unwrap();
        coll.insert(doc! { "kind": "pen" }).await.unwrap();
        coll.insert(doc! { "kind": "ink" }).await.unwrap();

        assert_eq!(coll.count(&doc! {}).await.unwrap(), 3);
        assert_eq!(coll.count(&doc! { "kind": "pen" }).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_operators() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        for (name, price) in [("a", 5_i64), ("b", 15), ("c", 25)] {
            coll.insert(doc! { "name": name, "price": price }).await.unwrap();
        }

        assert_eq!(coll.count(&doc! { "price": { "$gt": 10_i64 } }).await.unwrap(), 2);
        let band = doc! { "price": { "$gte": 15_i32, "$lt": 25_i64 } };
        assert_eq!(coll.count(&band).await.unwrap(), 1);
        assert_eq!(coll.count(&doc! { "price": { "$lte": 5.0 } }).await.unwrap(), 1);
        assert_eq!(coll.count(&doc! { "name": { "$ne": "a" } }).await.unwrap(), 2);
        assert_eq!(coll.count(&doc! { "name": { "$in": ["a", "c"] } }).await.unwrap(), 2);
        assert_eq!(coll.count(&doc! { "name": { "$eq": "b" } }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_numeric_widths_compare_by_value() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        coll.insert(doc! { "qty": 3_i32 }).await.unwrap();
        assert_eq!(coll.count(&doc! { "qty": 3_i64 }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_large_integers_compare_exactly() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        coll.insert(doc! { "n": 9_007_199_254_740_993_i64 }).await.unwrap();

        assert_eq!(coll.count(&doc! { "n": 9_007_199_254_740_992.0 }).await.unwrap(), 0);
        assert_eq!(coll.count(&doc! { "n": 9_007_199_254_740_993_i64 }).await.unwrap(), 1);
        let above = doc! { "n": { "$gt": 9_007_199_254_740_992.0 } };
        assert_eq!(coll.count(&above).await.unwrap(), 1);
        let below = doc! { "n": { "$lt": 9.3e18 } };
        assert_eq!(coll.count(&below).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_range_operators_stay_in_type() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        coll.insert(doc! { "v": 5_i64 }).await.unwrap();
        coll.insert(doc! { "v": "five" }).await.unwrap();
        coll.insert(doc! { "other": true }).await.unwrap();

        assert_eq!(coll.count(&doc! { "v": { "$gt": 1_i32 } }).await.unwrap(), 1);
        assert_eq!(coll.count(&doc! { "v": { "$gte": "a" } }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sort_mixed_types_by_type_then_value() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        for i in 0..200_i64 {
            let key = (i * 37) % 200;
            let record = if i % 2 == 0 {
                doc! { "v": key }
            } else {
                doc! { "v": format!("s{key:03}") }
            };
            coll.insert(record).await.unwrap();
        }
        coll.insert(doc! { "v": 2.5 }).await.unwrap();
        coll.insert(doc! { "name": "no v" }).await.unwrap();

        let query = FindQuery::default().sort_by("v", SortDirection::Asc);
        let sorted = coll.find_all(&query).await.unwrap();
        assert_eq!(sorted.len(), 202);
        assert!(sorted[0].get("v").is_none());

        let values: Vec<&Bson> = sorted[1..].iter().map(|r| r.get("v").unwrap()).collect();
        let numbers = values.iter().take_while(|v| as_number(v).is_some()).count();
        assert_eq!(numbers, 101);
        assert!(values[numbers..].iter().all(|v| matches!(v, Bson::String(_))));
        assert!(values
            .windows(2)
            .all(|w| compare_bson(w[0], w[1]) != Ordering::Greater));
        assert_eq!(values[2], &Bson::Double(2.5));
    }

    #[test]
    fn test_compare_numbers_exact() {
        use Number::{Float, Int};
        assert_eq!(compare_numbers(Int(2), Float(2.5)), Ordering::Less);
        assert_eq!(compare_numbers(Int(-2), Float(-2.5)), Ordering::Greater);
        assert_eq!(compare_numbers(Int(3), Float(3.0)), Ordering::Equal);
        assert_eq!(compare_numbers(Float(-0.0), Float(0.0)), Ordering::Equal);
        assert_eq!(compare_numbers(Int(i64::MAX), Float(9.3e18)), Ordering::Less);
        assert_eq!(compare_numbers(Int(i64::MIN), Float(-9.3e18)), Ordering::Greater);
        assert_eq!(compare_numbers(Float(f64::NAN), Int(i64::MIN)), Ordering::Less);
        assert_eq!(compare_numbers(Float(f64::NAN), Float(f64::NAN)), Ordering::Equal);
    }

    #[tokio::test]
    async fn test_update_first_match() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        let id = ObjectId::new();
        coll.insert(doc! { "_id": id, "name": "pen" }).await.unwrap();

        let info = coll.update_id(&id, &doc! { "name": "ink" }).await.unwrap();
        assert_eq!(info.matched_count(), 1);
        assert_eq!(info.updated_count(), 1);

        let found = coll.find_id(&id).await.unwrap().unwrap();
        assert_eq!(found.get_str("name").unwrap(), "ink");
    }

    #[tokio::test]
    async fn test_update_no_match() {
        let db = MemoryDatabase::default();
        let info = products(&db)
            .update_id(&ObjectId::new(), &doc! { "name": "ink" })
            .await
            .unwrap();
        assert_eq!(info.matched_count(), 0);
    }

    #[tokio::test]
    async fn test_update_all() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        coll.insert(doc! { "active": true }).await.unwrap();
        coll.insert(doc! { "active": true }).await.unwrap();
        coll.insert(doc! { "active": false }).await.unwrap();

        let info = coll.update_all(&doc! {}, &doc! { "active": false }).await.unwrap();
        assert_eq!(info.matched_count(), 3);
        assert_eq!(info.updated_count(), 2);
    }

    #[tokio::test]
    async fn test_remove_and_remove_all() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        for _ in 0..4 {
            coll.insert(doc! { "kind": "pen" }).await.unwrap();
        }

        let info = coll.remove(&doc! { "kind": "pen" }).await.unwrap();
        assert_eq!(info.removed_count(), 1);

        let info = coll.remove_all(&doc! { "kind": "pen" }).await.unwrap();
        assert_eq!(info.removed_count(), 3);
        assert_eq!(coll.count(&doc! {}).await.unwrap(), 0);

        let info = coll.remove_id(&ObjectId::new()).await.unwrap();
        assert_eq!(info.removed_count(), 0);
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let db = MemoryDatabase::default();
        let coll = products(&db);

        let info = coll
            .upsert(&doc! { "sku": "p-1" }, &doc! { "price": 10_i64 })
            .await
            .unwrap();
        assert!(info.upserted_id().is_some());
        assert_eq!(info.matched_count(), 0);

        let info = coll
            .upsert(&doc! { "sku": "p-1" }, &doc! { "price": 12_i64 })
            .await
            .unwrap();
        assert!(info.upserted_id().is_none());
        assert_eq!(info.matched_count(), 1);

        let found = coll.find_one(&doc! { "sku": "p-1" }).await.unwrap().unwrap();
        assert_eq!(found.get_i64("price").unwrap(), 12);
        assert_eq!(coll.count(&doc! {}).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_id_uses_given_id() {
        let db = MemoryDatabase::default();
        let coll = products(&db);
        let id = ObjectId::new();
        let info = coll.upsert_id(&id, &doc! { "name": "pen" }).await.unwrap();
        assert_eq!(info.upserted_id(), Some(&Bson::ObjectId(id)));
        assert!(coll.find_id(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_collections_share_store() {
        let db = MemoryDatabase::default();
        products(&db).insert(doc! { "name": "pen" }).await.unwrap();
        assert_eq!(products(&db).count(&doc! {}).await.unwrap(), 1);
        assert_eq!(db.collection_names().await.unwrap(), vec!["products"]);
    }

    #[tokio::test]
    async fn test_invalid_collection_name() {
        let db = MemoryDatabase::default();
        assert!(matches!(
            db.collection("system.indexes"),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_database_and_snapshot() {
        let db = MemoryDatabase::default();
        products(&db).insert(doc! { "name": "pen" }).await.unwrap();
        let snap = db.snapshot().await;
        assert_eq!(snap["products"].len(), 1);

        db.drop_database().await.unwrap();
        assert_eq!(db.collection_len("products").await, 0);
        assert!(db.collection_names().await.unwrap().is_empty());
    }
}
