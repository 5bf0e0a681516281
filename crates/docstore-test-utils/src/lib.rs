// docstore-test-utils — shared test tooling for docstore backends.
//
// - `Product`, a fixture document type
// - `TestSuite`, named async checks, with `TestSuite::conformance()` as the
//   set every backend must pass
// - `TestRunner`, which runs a suite against any `Database`

pub mod product;
pub mod runner;
pub mod suite;

pub use product::Product;
pub use runner::{TestRunner, DEFAULT_COLLECTION};
pub use suite::{CheckFn, CheckResult, TestContext, TestLogger, TestSuite, TestSuiteStats};
