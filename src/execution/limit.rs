use super::Executor;
use crate::common::Result;
use crate::storage::table::record::Record;
use crate::storage::table::schema::RecordSchema;

/// Caps its child at `limit` records (spec.md §4.6). Grounded on
/// `LimitExecutor` in `execution/executor_limit.cpp`; `limit <= 0` ends
/// immediately, matching the original's literal `n <= 0` check.
pub struct LimitExecutor {
    child: Box<dyn Executor>,
    limit: i64,
    count: i64,
    is_end: bool,
    out_schema: RecordSchema,
}

impl LimitExecutor {
    pub fn new(child: Box<dyn Executor>, limit: i64) -> Self {
        let out_schema = child.get_out_schema().clone();
        LimitExecutor {
            child,
            limit,
            count: 0,
            is_end: true,
            out_schema,
        }
    }
}

impl Executor for LimitExecutor {
    fn init(&mut self) -> Result<()> {
        self.child.init()?;
        self.count = 0;
        self.is_end = self.child.is_end() || self.limit <= 0;
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        debug_assert!(!self.is_end, "next() called after is_end()");
        self.child.next()?;
        self.count += 1;
        self.is_end = self.child.is_end() || self.count >= self.limit;
        Ok(())
    }

    fn is_end(&self) -> bool {
        self.is_end
    }

    fn get_record(&self) -> &Record {
        self.child.get_record()
    }

    fn get_out_schema(&self) -> &RecordSchema {
        &self.out_schema
    }
}
