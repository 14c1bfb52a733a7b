use crate::common::Result;
use crate::storage::table::record::Record;
use crate::storage::table::schema::RecordSchema;

/// A pull-based operator (spec.md §4.6). Callers `init()` once, then
/// alternate `next()`/`is_end()`/`get_record()` until `is_end()` is
/// true; `next()`'s precondition is `!is_end()`.
pub trait Executor {
    fn init(&mut self) -> Result<()>;

    fn next(&mut self) -> Result<()>;

    fn is_end(&self) -> bool;

    /// The record produced by the most recent `next()`. Panics if
    /// called before the first `next()`.
    fn get_record(&self) -> &Record;

    fn get_out_schema(&self) -> &RecordSchema;
}
