use super::Executor;
use crate::common::Result;
use crate::storage::table::record::{Record, Rid, INVALID_RID};
use crate::storage::table::schema::RecordSchema;
use crate::storage::table::table_handle::TableHandle;
use std::sync::{Arc, Mutex};

/// Reads every live record of a table in cursor order (spec.md §4.6).
/// Grounded on `SeqScanExecutor` in `execution/executor_seqscan.cpp`.
pub struct SeqScanExecutor {
    table: Arc<Mutex<TableHandle>>,
    rid: Rid,
    record: Option<Record>,
    is_end: bool,
    out_schema: RecordSchema,
}

impl SeqScanExecutor {
    pub fn new(table: Arc<Mutex<TableHandle>>) -> Self {
        let out_schema = table.lock().unwrap().schema().clone();
        SeqScanExecutor {
            table,
            rid: INVALID_RID,
            record: None,
            is_end: true,
            out_schema,
        }
    }
}

impl Executor for SeqScanExecutor {
    fn init(&mut self) -> Result<()> {
        self.rid = self.table.lock().unwrap().first_rid()?;
        self.is_end = !self.rid.is_valid();
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        debug_assert!(!self.is_end, "next() called after is_end()");
        let table = self.table.lock().unwrap();
        self.record = Some(table.get_record(self.rid)?);
        self.rid = table.next_rid(self.rid)?;
        self.is_end = !self.rid.is_valid();
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
