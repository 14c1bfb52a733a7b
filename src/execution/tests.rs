//! Integration test wiring SeqScan -> Filter -> Limit -> Projection into
//! a single pipeline, exercising the scenario from spec.md §8 (#5).

use super::*;
use crate::storage::buffer::{BufferPoolManager, LruKReplacer};
use crate::storage::disk::disk_manager::DiskManager;
use crate::storage::table::record::Record;
use crate::storage::table::schema::{Column, DataType, Field, RecordSchema};
use crate::storage::table::table_handle::TableHandle;
use std::sync::{Arc, Mutex};

fn schema() -> RecordSchema {
    RecordSchema::new(vec![Column::new("x", DataType::Int, false)])
}

fn table_with(values: &[i32]) -> Arc<Mutex<TableHandle>> {
    let dm = DiskManager::new_with_handle_for_test();
    let fid = dm.write().unwrap().open_or_create_file("pipeline.tbl").unwrap();
    let bpm = Arc::new(Mutex::new(BufferPoolManager::new(8, 4096, Box::new(LruKReplacer::new(2)), dm)));
    let mut table = TableHandle::create(fid, schema(), bpm).unwrap();
    for &v in values {
        table.insert_record(&Record::new(&schema(), &[Field::Int(v)])).unwrap();
    }
    Arc::new(Mutex::new(table))
}

#[test]
fn seq_scan_filter_limit_projection_yields_first_two_positive_values() {
    let table = table_with(&[-1, 5, 7, 9]);
    let scan: Box<dyn Executor> = Box::new(SeqScanExecutor::new(table));
    let filter: Box<dyn Executor> = Box::new(FilterExecutor::new(
        scan,
        Box::new(|r: &Record| matches!(r.get_field(&schema(), 0), Field::Int(v) if v > 0)),
    ));
    let limit: Box<dyn Executor> = Box::new(LimitExecutor::new(filter, 2));
    let proj_schema = schema().project(&["x"]).unwrap();
    let mut pipeline = ProjectionExecutor::new(limit, proj_schema.clone());

    pipeline.init().unwrap();
    let mut seen = Vec::new();
    while !pipeline.is_end() {
        pipeline.next().unwrap();
        seen.push(pipeline.get_record().get_field(&proj_schema, 0));
    }

    assert_eq!(seen, vec![Field::Int(5), Field::Int(7)]);
}

#[test]
fn filter_into_projection_without_limit_drops_a_trailing_non_match() {
    // Regression test: Filter exhausting its child without a final
    // match must not leak that non-matching record through Projection.
    let table = table_with(&[5, -1]);
    let scan: Box<dyn Executor> = Box::new(SeqScanExecutor::new(table));
    let filter: Box<dyn Executor> = Box::new(FilterExecutor::new(
        scan,
        Box::new(|r: &Record| matches!(r.get_field(&schema(), 0), Field::Int(v) if v > 0)),
    ));
    let proj_schema = schema().project(&["x"]).unwrap();
    let mut pipeline = ProjectionExecutor::new(filter, proj_schema.clone());

    pipeline.init().unwrap();
    let mut seen = Vec::new();
    while !pipeline.is_end() {
        pipeline.next().unwrap();
        seen.push(pipeline.get_record().get_field(&proj_schema, 0));
    }

    assert_eq!(seen, vec![Field::Int(5)]);
}

#[test]
fn pipeline_over_an_empty_table_yields_nothing() {
    let table = table_with(&[]);
    let scan: Box<dyn Executor> = Box::new(SeqScanExecutor::new(table));
    let filter: Box<dyn Executor> =
        Box::new(FilterExecutor::new(scan, Box::new(|_: &Record| true)));
    let limit: Box<dyn Executor> = Box::new(LimitExecutor::new(filter, 10));
    let proj_schema = schema().project(&["x"]).unwrap();
    let mut pipeline = ProjectionExecutor::new(limit, proj_schema);

    pipeline.init().unwrap();
    assert!(pipeline.is_end());
}
