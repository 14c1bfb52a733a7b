//! A minimal typed value model backing slot (de)serialization.
//!
//! spec.md treats column-value encoding as an external concern; this
//! module supplies just enough of one (a handful of fixed-width scalar
//! types plus a fixed-capacity text type) to make the slotted page real
//! rather than opaque bytes. It is intentionally small -- a richer type
//! system is out of scope, same as spec.md's exclusion of "the encoding
//! of individual column values".

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column's storage type. `Text(cap)` is a fixed-capacity string: at
/// most `cap` bytes of UTF-8, stored with a 2-byte length prefix so the
/// slotted page can still keep fixed-size slots (spec.md's normative
/// N-ary layout requires it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int,
    BigInt,
    Float,
    Bool,
    Text(usize),
}

impl DataType {
    /// Bytes occupied by one value of this type within a slot's fixed
    /// payload region.
    pub fn width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::BigInt => 8,
            DataType::Float => 8,
            DataType::Bool => 1,
            DataType::Text(cap) => 2 + cap,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Bool => write!(f, "BOOL"),
            DataType::Text(cap) => write!(f, "TEXT({cap})"),
        }
    }
}

/// A single field value. `Null` carries its column's data type so that
/// callers can still tell what *kind* of absence they are looking at.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i32),
    BigInt(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null(DataType),
}

impl Field {
    pub fn data_type(&self) -> DataType {
        match self {
            Field::Int(_) => DataType::Int,
            Field::BigInt(_) => DataType::BigInt,
            Field::Float(_) => DataType::Float,
            Field::Bool(_) => DataType::Bool,
            Field::Text(s) => DataType::Text(s.len().max(1)),
            Field::Null(dt) => dt.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{v}"),
            Field::BigInt(v) => write!(f, "{v}"),
            Field::Float(v) => write!(f, "{v}"),
            Field::Bool(v) => write!(f, "{v}"),
            Field::Text(v) => write!(f, "{v}"),
            Field::Null(_) => write!(f, "NULL"),
        }
    }
}

/// One named, typed column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Column {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

/// An ordered list of columns, shared by a table and by the executors
/// reading from it. `Projection` builds a narrower `RecordSchema` that
/// keeps the original column order (spec.md §4.6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSchema {
    columns: Vec<Column>,
}

impl RecordSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        RecordSchema { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Total size, in bytes, of one record's fixed-width payload.
    pub fn rec_size(&self) -> usize {
        self.columns.iter().map(|c| c.data_type.width()).sum()
    }

    /// Size, in bytes, of one record's null bitmap.
    pub fn nullmap_size(&self) -> usize {
        super::super::page::bitmap::bytes_needed(self.columns.len())
    }

    /// Byte offset of column `idx` within the fixed payload region.
    pub fn field_offset(&self, idx: usize) -> usize {
        self.columns[..idx].iter().map(|c| c.data_type.width()).sum()
    }

    /// Builds a schema over the named subset of `self`'s columns,
    /// preserving the order given in `names`.
    pub fn project(&self, names: &[&str]) -> Result<RecordSchema> {
        let columns = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .find(|c| c.name == *name)
                    .cloned()
                    .ok_or_else(|| Error::InvalidInput(format!("unknown column: {name}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RecordSchema::new(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> RecordSchema {
        RecordSchema::new(vec![
            Column::new("id", DataType::Int, false),
            Column::new("balance", DataType::BigInt, false),
            Column::new("name", DataType::Text(16), true),
        ])
    }

    #[test]
    fn rec_size_sums_fixed_widths() {
        let schema = sample_schema();
        assert_eq!(schema.rec_size(), 4 + 8 + (2 + 16));
    }

    #[test]
    fn nullmap_size_rounds_up_to_bytes() {
        let schema = sample_schema();
        assert_eq!(schema.nullmap_size(), 1);
    }

    #[test]
    fn field_offset_is_cumulative() {
        let schema = sample_schema();
        assert_eq!(schema.field_offset(0), 0);
        assert_eq!(schema.field_offset(1), 4);
        assert_eq!(schema.field_offset(2), 12);
    }

    #[test]
    fn project_preserves_requested_order() {
        let schema = sample_schema();
        let proj = schema.project(&["name", "id"]).unwrap();
        assert_eq!(proj.columns()[0].name(), "name");
        assert_eq!(proj.columns()[1].name(), "id");
    }

    #[test]
    fn project_rejects_unknown_column() {
        let schema = sample_schema();
        assert!(schema.project(&["nope"]).is_err());
    }
}
