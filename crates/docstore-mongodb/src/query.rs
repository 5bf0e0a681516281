// MongoDB query builder — converts docstore query types into driver options.

use docstore_core::{doc, FindQuery, Record, SortDirection};
use mongodb::options::FindOptions;

/// The `$set` update document for a changes record.
pub fn build_update_doc(changes: &Record) -> Record {
    doc! { "$set": changes.clone() }
}

/// Sort document for `query`, or `None` when it has no sort keys.
pub fn build_sort(query: &FindQuery) -> Option<Record> {
    if query.sort.is_empty() {
        return None;
    }
    let mut sort = Record::new();
    for key in &query.sort {
        let direction = match key.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };
        sort.insert(key.field.clone(), direction);
    }
    Some(sort)
}

/// Find options (sort, skip, limit) for `query`.
pub fn build_find_options(query: &FindQuery) -> FindOptions {
    let mut find_opts = FindOptions::default();
    find_opts.sort = build_sort(query);
    find_opts.skip = query.skip;
    // Negative limits mean "single batch" to the driver, so clamp.
    find_opts.limit = query.limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
    find_opts
}
