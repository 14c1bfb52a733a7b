use super::Executor;
use crate::common::Result;
use crate::storage::table::record::Record;
use crate::storage::table::schema::RecordSchema;

/// Narrows every record produced by its child onto `proj_schema`,
/// preserving the requested column order (spec.md §4.6). Grounded on
/// `ProjectionExecutor` in `execution/executor_projection.h`.
pub struct ProjectionExecutor {
    child: Box<dyn Executor>,
    child_schema: RecordSchema,
    proj_schema: RecordSchema,
    record: Option<Record>,
}

impl ProjectionExecutor {
    pub fn new(child: Box<dyn Executor>, proj_schema: RecordSchema) -> Self {
        let child_schema = child.get_out_schema().clone();
        ProjectionExecutor {
            child,
            child_schema,
            proj_schema,
            record: None,
        }
    }
}

impl Executor for ProjectionExecutor {
    fn init(&mut self) -> Result<()> {
        self.child.init()?;
        self.record = None;
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        debug_assert!(!self.child.is_end(), "next() called after is_end()");
        self.child.next()?;
        self.record = Some(self.child.get_record().project(&self.child_schema, &self.proj_schema));
        Ok(())
    }

    fn is_end(&self) -> bool {
        self.child.is_end()
    }

    fn get_record(&self) -> &Record {
        self.record.as_ref().expect("get_record() called before next()")
    }

    fn get_out_schema(&self) -> &RecordSchema {
        &self.proj_schema
    }
}
