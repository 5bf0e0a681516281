// Suite runner — executes a `TestSuite` against one `Database`.
//
// The runner empties the target collection before every check and once
// more after the last, stops at the first failing check, and logs progress
// through `tracing`.

use std::sync::Arc;
use std::time::Instant;

use docstore_core::{Database, Record};

use crate::suite::{CheckResult, TestContext, TestLogger, TestSuite, TestSuiteStats};

/// Default collection the checks run in.
pub const DEFAULT_COLLECTION: &str = "docstore_conformance";

pub struct TestRunner {
    context: TestContext,
    all_stats: Vec<TestSuiteStats>,
}

impl TestRunner {
    pub fn new(display_name: &str, db: Arc<dyn Database>) -> Self {
        Self {
            context: TestContext {
                db,
                collection: DEFAULT_COLLECTION.to_string(),
                log: TestLogger::new(display_name),
            },
            all_stats: Vec::new(),
        }
    }

    /// Run the checks in `collection` instead of the default one.
    pub fn with_collection(mut self, collection: &str) -> Self {
        self.context.collection = collection.to_string();
        self
    }

    pub fn stats(&self) -> &[TestSuiteStats] {
        &self.all_stats
    }

    async fn clean(&self) -> CheckResult {
        let collection = self.context.db.collection(&self.context.collection)?;
        collection.remove_all(&Record::new()).await?;
        Ok(())
    }

    /// Run every check of `suite` in order.
    pub async fn execute(&mut self, suite: &mut TestSuite) -> CheckResult {
        let log = self.context.log.clone();
        log.info(&format!(
            "Running suite: {} on '{}.{}'",
            suite.name,
            self.context.db.name(),
            self.context.collection
        ));
        suite.stats.suite_start_time = Instant::now();
        suite.stats.passed = 0;

        for test in &suite.tests {
            self.clean().await?;
            log.debug(&format!("  Running test: {}", test.name));
            match (test.check)(&self.context).await {
                Ok(()) => {
                    suite.stats.passed += 1;
                    log.success(&test.name);
                }
                Err(e) => {
                    log.error(&format!("  ✗ {}: {}", test.name, e));
                    return Err(e);
                }
            }
        }

        let cleanup_start = Instant::now();
        self.clean().await?;
        log.success(&format!(
            "CLEAN-UP completed ({:.3}ms)",
            cleanup_start.elapsed().as_secs_f64() * 1000.0
        ));

        suite.finalize_stats();
        log.info(&format!(
            "{}: {}/{} passed in {:.2}ms",
            suite.stats.suite_name,
            suite.stats.passed,
            suite.stats.test_count,
            suite.stats.suite_duration_ms
        ));
        self.all_stats.push(suite.stats.clone());
        Ok(())
    }
}
