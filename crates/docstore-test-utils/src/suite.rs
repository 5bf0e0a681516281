// Conformance suite — named async checks any backend must pass.
//
// A `TestSuite` groups checks and tracks simple statistics. Each check gets
// a `TestContext` naming the database and a collection that the runner
// empties before the check starts.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use docstore::Handle;
use docstore_core::{
    codec, doc, object_id_hex, Bson, Collection, Database, Document, FindQuery, HandleError,
    ObjectId, SortDirection, StoreError,
};

use crate::product::Product;

pub type CheckResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = CheckResult> + Send + 'a>>;

/// A check borrows its context for the duration of the returned future.
pub type CheckFn = for<'a> fn(&'a TestContext) -> CheckFuture<'a>;

/// Statistics for a completed suite.
#[derive(Debug, Clone)]
pub struct TestSuiteStats {
    pub suite_name: String,
    pub test_count: usize,
    pub passed: usize,
    pub suite_start_time: Instant,
    pub suite_duration_ms: f64,
}

/// A named check.
pub struct TestEntry {
    pub name: String,
    pub check: CheckFn,
}

/// Simple test logger.
#[derive(Debug, Clone)]
pub struct TestLogger {
    pub backend_name: String,
}

impl TestLogger {
    pub fn new(backend_name: &str) -> Self {
        Self {
            backend_name: backend_name.to_string(),
        }
    }

    pub fn info(&self, msg: &str) {
        tracing::info!("[{}] {}", self.backend_name, msg);
    }

    pub fn success(&self, msg: &str) {
        tracing::info!("[{}] ✓ {}", self.backend_name, msg);
    }

    pub fn error(&self, msg: &str) {
        tracing::error!("[{}] {}", self.backend_name, msg);
    }

    pub fn debug(&self, msg: &str) {
        tracing::debug!("[{}] {}", self.backend_name, msg);
    }
}

/// What a check may touch.
pub struct TestContext {
    pub db: Arc<dyn Database>,
    pub collection: String,
    pub log: TestLogger,
}

impl TestContext {
    /// A `Product` handle linked to the check's collection.
    pub fn handle(&self) -> Result<Handle<Product>, HandleError> {
        let mut handle = Handle::new();
        handle.link(self.db.as_ref(), &self.collection)?;
        Ok(handle)
    }

    /// The check's collection, for calls below the handle layer.
    pub fn collection(&self) -> Result<Arc<dyn Collection>, StoreError> {
        self.db.collection(&self.collection)
    }
}

/// A group of checks run in order against one backend.
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestEntry>,
    pub stats: TestSuiteStats,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
            stats: TestSuiteStats {
                suite_name: name.to_string(),
                test_count: 0,
                passed: 0,
                suite_start_time: Instant::now(),
                suite_duration_ms: 0.0,
            },
        }
    }

    /// Add a check to the suite.
    pub fn add_test(&mut self, name: &str, check: CheckFn) -> &mut Self {
        self.tests.push(TestEntry {
            name: name.to_string(),
            check,
        });
        self
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn finalize_stats(&mut self) {
        self.stats.test_count = self.tests.len();
        self.stats.suite_duration_ms = self.stats.suite_start_time.elapsed().as_secs_f64() * 1000.0;
    }

    /// The full set of checks every backend must pass.
    pub fn conformance() -> Self {
        let mut suite = Self::new("conformance");
        suite
            .add_test("round trip", round_trip)
            .add_test("distinct ids", distinct_ids)
            .add_test("insert then find", insert_then_find)
            .add_test("remove then not found", remove_then_not_found)
            .add_test("update stamps and keeps created_on", update_stamps)
            .add_test("remove all matching", remove_all_matching)
            .add_test("three documents", three_documents)
            .add_test("sorted find all", sorted_find_all)
            .add_test("unlinked handle", unlinked_handle)
            .add_test("duplicate id", duplicate_id)
            .add_test("find by id", find_by_id)
            .add_test("remove one by filter", remove_one_by_filter)
            .add_test("update all matching", update_all_matching)
            .add_test("upsert inserts then updates", upsert_inserts_then_updates);
        suite
    }
}

fn fail(msg: impl Into<String>) -> CheckResult {
    Err(msg.into().into())
}

fn ensure(condition: bool, msg: impl Into<String>) -> CheckResult {
    if condition {
        Ok(())
    } else {
        fail(msg)
    }
}

fn round_trip(_ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut product = Product::new("stapler", 1_299).with_tags(["office", "metal"]);
        product.generate_id();
        product.calculate_created_on();
        product.calculate_updated_on();
        let back: Product = codec::decode(&codec::encode(&product))?;
        ensure(back == product, format!("decoded {back:?}, expected {product:?}"))
    })
}

fn distinct_ids(_ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            let mut product = Product::default();
            product.generate_id();
            if let Some(id) = product.id() {
                ensure(seen.insert(id), format!("id {id} generated twice"))?;
            }
        }
        ensure(seen.len() == 1_000, "generate_id left an id unset")
    })
}

fn insert_then_find(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        let id = ObjectId::new();
        let returned = handle
            .set_document(Product::new("pen", 150).with_id(id))
            .insert()
            .await?;
        ensure(returned == id, format!("insert returned {returned}, expected {id}"))?;

        let found = handle.clean().set_document(Product::by_id(id)).find().await?;
        ensure(found.id() == Some(id), "found a different document")?;
        ensure(found.name == "pen" && found.price == 150, "fields did not survive")?;
        ensure(found.created_on() > 0, "created_on was not set on insert")
    })
}

fn remove_then_not_found(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        let id = ObjectId::new();
        handle.set_document(Product::by_id(id)).insert().await?;
        handle.remove(&id).await?;

        match handle.clean().set_document(Product::by_id(id)).find().await {
            Err(HandleError::NotFound) => Ok(()),
            Ok(_) => fail("removed document is still found"),
            Err(e) => Err(e.into()),
        }
    })
}

fn update_stamps(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        let id = ObjectId::new();
        handle
            .set_document(Product::new("pen", 100).with_id(id))
            .insert()
            .await?;

        handle.set_document(Product::new("pen", 120)).update(&id).await?;
        let before = handle.clean().set_document(Product::by_id(id)).find().await?;

        let mut changes = before.clone();
        changes.name = "fountain pen".to_string();
        changes.price = 250;
        changes.tags = vec!["gift".to_string()];
        changes.set_created_on(1);
        handle.set_document(changes).update(&id).await?;
        let after = handle.clean().set_document(Product::by_id(id)).find().await?;

        ensure(after.name == "fountain pen", format!("name is {:?}", after.name))?;
        ensure(after.price == 250, format!("price is {}", after.price))?;
        ensure(after.tags == ["gift"], format!("tags are {:?}", after.tags))?;
        ensure(
            after.created_on() == before.created_on(),
            "update rewrote created_on",
        )?;
        ensure(
            after.updated_on() > before.updated_on(),
            format!(
                "updated_on went from {} to {}",
                before.updated_on(),
                after.updated_on()
            ),
        )
    })
}

fn remove_all_matching(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        for price in [1, 2, 3] {
            handle.set_document(Product::new("bulk", price)).insert().await?;
        }
        handle.set_document(Product::new("single", 9)).insert().await?;

        handle.clean().set_document(Product::new("bulk", 0));
        let info = handle.remove_all().await?;
        ensure(
            info.removed_count() == 3,
            format!("removed {} documents", info.removed_count()),
        )?;
        ensure(handle.count().await? == 0, "matching documents remain")?;
        ensure(handle.clean().count().await? == 1, "non-matching document was removed")
    })
}

fn three_documents(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        let mut ids = vec![
            object_id_hex("000000007465737469643031")?,
            object_id_hex("000000007465737469643032")?,
            object_id_hex("000000007465737469643033")?,
        ];
        for id in &ids {
            handle.set_document(Product::by_id(*id)).insert().await?;
        }

        let count = handle.clean().count().await?;
        ensure(count == 3, format!("count is {count}"))?;

        let mut found: Vec<ObjectId> = handle
            .clean()
            .find_all()
            .await?
            .iter()
            .filter_map(Document::id)
            .collect();
        found.sort();
        ids.sort();
        ensure(found == ids, format!("find_all returned {found:?}"))?;

        let info = handle.clean().remove_all().await?;
        ensure(
            info.removed_count() == 3,
            format!("removed {} documents", info.removed_count()),
        )?;
        ensure(handle.clean().count().await? == 0, "documents remain")
    })
}

fn sorted_find_all(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        for price in [40, 10, 30, 20] {
            handle.set_document(Product::new("pad", price)).insert().await?;
        }

        let query = FindQuery::default()
            .sort_by("price", SortDirection::Desc)
            .skip(1)
            .limit(2);
        let prices: Vec<i64> = handle
            .clean()
            .find_all_with(query)
            .await?
            .iter()
            .map(|p| p.price)
            .collect();
        ensure(prices == [30, 20], format!("prices are {prices:?}"))
    })
}

fn unlinked_handle(_ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let handle: Handle<Product> = Handle::new();
        match handle.count().await {
            Err(HandleError::NotLinked) => Ok(()),
            other => fail(format!("unlinked count returned {other:?}")),
        }
    })
}

fn duplicate_id(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let mut handle = ctx.handle()?;
        let id = ObjectId::new();
        handle.set_document(Product::by_id(id)).insert().await?;
        match handle.set_document(Product::by_id(id)).insert().await {
            Err(HandleError::DuplicateKey(_)) => Ok(()),
            other => fail(format!("second insert returned {other:?}")),
        }
    })
}

fn find_by_id(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let coll = ctx.collection()?;
        let id = ObjectId::new();
        coll.insert(doc! { "_id": id, "name": "pen" }).await?;

        let found = coll.find_id(&id).await?;
        let name = found.as_ref().and_then(|r| r.get_str("name").ok());
        ensure(name == Some("pen"), format!("find_id returned {found:?}"))?;
        let missing = coll.find_id(&ObjectId::new()).await?;
        ensure(missing.is_none(), format!("unknown id returned {missing:?}"))
    })
}

fn remove_one_by_filter(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let coll = ctx.collection()?;
        for price in [1_i64, 2, 3] {
            coll.insert(doc! { "name": "dup", "price": price }).await?;
        }

        let info = coll.remove(&doc! { "name": "dup" }).await?;
        ensure(
            info.removed_count() == 1,
            format!("remove deleted {} records", info.removed_count()),
        )?;
        let left = coll.count(&doc! { "name": "dup" }).await?;
        ensure(left == 2, format!("{left} records left"))?;

        let info = coll.remove(&doc! { "name": "absent" }).await?;
        ensure(info.removed_count() == 0, "remove deleted a non-matching record")
    })
}

fn update_all_matching(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let coll = ctx.collection()?;
        for price in [1_i64, 1, 2] {
            coll.insert(doc! { "name": "bulk", "price": price }).await?;
        }
        coll.insert(doc! { "name": "single", "price": 2_i64 }).await?;

        let info = coll
            .update_all(&doc! { "name": "bulk" }, &doc! { "price": 1_i64 })
            .await?;
        ensure(
            info.matched_count() == 3 && info.updated_count() == 1,
            format!("update_all returned {info:?}"),
        )?;
        let ones = coll.count(&doc! { "price": 1_i64 }).await?;
        ensure(ones == 3, format!("{ones} records priced 1"))?;

        let info = coll
            .update_all(&doc! { "name": "absent" }, &doc! { "price": 9_i64 })
            .await?;
        ensure(
            info.matched_count() == 0 && info.updated_count() == 0,
            format!("update_all on no match returned {info:?}"),
        )
    })
}

fn upsert_inserts_then_updates(ctx: &TestContext) -> CheckFuture<'_> {
    Box::pin(async move {
        let coll = ctx.collection()?;
        let id = ObjectId::new();

        let info = coll.upsert_id(&id, &doc! { "name": "pen", "price": 1_i64 }).await?;
        ensure(
            info.upserted_id() == Some(&Bson::ObjectId(id)) && info.matched_count() == 0,
            format!("first upsert returned {info:?}"),
        )?;

        let info = coll.upsert_id(&id, &doc! { "price": 2_i64 }).await?;
        ensure(
            info.upserted_id().is_none()
                && info.matched_count() == 1
                && info.updated_count() == 1,
            format!("second upsert returned {info:?}"),
        )?;

        let stored = coll.find_id(&id).await?.unwrap_or_default();
        ensure(
            stored.get_str("name").ok() == Some("pen") && stored.get_i64("price").ok() == Some(2),
            format!("stored record is {stored:?}"),
        )?;

        let info = coll
            .upsert(&doc! { "name": "seeded" }, &doc! { "price": 5_i64 })
            .await?;
        ensure(info.upserted_id().is_some(), "upsert by filter inserted nothing")?;
        let seeded = coll.count(&doc! { "name": "seeded", "price": 5_i64 }).await?;
        ensure(seeded == 1, "upserted record lacks the filter's fields")
    })
}
