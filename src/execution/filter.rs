use super::Executor;
use crate::common::Result;
use crate::storage::table::record::Record;
use crate::storage::table::schema::RecordSchema;

/// Drives its child until the predicate holds, or the child exhausts
/// (spec.md §4.6). Grounded on `FilterExecutor` in
/// `execution/executor_filter.cpp`, but reworked to look ahead: the
/// original caches `record_` only on a match, which leaves it stale
/// (pointing at the last non-matching child record) on the call where
/// the search drives the child to exhaustion without ever matching.
/// Downstream operators that blindly project/forward whatever
/// `get_record()` returns after a `next()` call -- the very pattern
/// every other executor in this pipeline relies on -- would then
/// surface that stale record. Looking one match ahead keeps `is_end()`
/// an accurate predictor of "does the next `next()` call have a record
/// ready", matching the contract `SeqScanExecutor` already upholds, so
/// `record` is only ever `Some` with a genuinely matching row.
pub struct FilterExecutor {
    child: Box<dyn Executor>,
    predicate: Box<dyn Fn(&Record) -> bool>,
    record: Option<Record>,
    pending: Option<Record>,
    is_end: bool,
    out_schema: RecordSchema,
}

impl FilterExecutor {
    pub fn new(child: Box<dyn Executor>, predicate: Box<dyn Fn(&Record) -> bool>) -> Self {
        let out_schema = child.get_out_schema().clone();
        FilterExecutor {
            child,
            predicate,
            record: None,
            pending: None,
            is_end: true,
            out_schema,
        }
    }

    /// Drives `child` forward until the predicate holds or it ends,
    /// returning the matching record (if any) without consuming it.
    fn find_next_match(&mut self) -> Result<Option<Record>> {
        while !self.child.is_end() {
            self.child.next()?;
            if (self.predicate)(self.child.get_record()) {
                return Ok(Some(self.child.get_record().clone()));
            }
        }
        Ok(None)
    }
}

impl Executor for FilterExecutor {
    fn init(&mut self) -> Result<()> {
        self.child.init()?;
        self.record = None;
        self.pending = self.find_next_match()?;
        self.is_end = self.pending.is_none();
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        debug_assert!(!self.is_end, "next() called after is_end()");
        self.record = self.pending.take();
        self.pending = self.find_next_match()?;
        self.is_end = self.pending.is_none();
        Ok(())
    }

    fn is_end(&self) -> bool {
        self.is_end
    }

    fn get_record(&self) -> &Record {
        self.record.as_ref().expect("get_record() called before next()")
    }

    fn get_out_schema(&self) -> &RecordSchema {
        &self.out_schema
    }
}
