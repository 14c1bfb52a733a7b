use crate::common::constants::{INVALID_PAGE_ID, INVALID_SLOT_ID};
use crate::storage::disk::disk_manager::PageId;
use crate::storage::page::bitmap;
use crate::storage::table::schema::{DataType, Field, RecordSchema};

/// A slot index within a page.
pub type SlotId = i32;

/// `(page_id, slot_id)`, stable for the lifetime of the slot (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rid {
    page_id: PageId,
    slot_id: SlotId,
}

/// Signals end-of-scan or "no such record".
pub const INVALID_RID: Rid = Rid {
    page_id: INVALID_PAGE_ID,
    slot_id: INVALID_SLOT_ID,
};

impl Rid {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Rid { page_id, slot_id }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    pub fn is_valid(&self) -> bool {
        *self != INVALID_RID
    }
}

impl Default for Rid {
    fn default() -> Self {
        INVALID_RID
    }
}

/// A single row: owns its null bitmap and payload buffers outright.
///
/// spec.md §9 flags a defect in the source this was distilled from,
/// where `GetRecord` hands back pointers whose owning buffers are about
/// to be freed. Here that is structurally impossible: [`Record::new`]
/// and [`Record::from_bytes`] always take ownership of freshly built
/// `Vec<u8>`s, so there is nothing left dangling once the frame that
/// produced them is unpinned.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    nullmap: Vec<u8>,
    data: Vec<u8>,
    rid: Rid,
}

impl Record {
    /// Builds a record from typed values, encoding them into fresh
    /// nullmap/payload buffers per `schema`.
    pub fn new(schema: &RecordSchema, values: &[Field]) -> Self {
        assert_eq!(values.len(), schema.field_count());
        let mut nullmap = vec![0u8; schema.nullmap_size()];
        let mut data = vec![0u8; schema.rec_size()];

        for (idx, (column, value)) in schema.columns().iter().zip(values).enumerate() {
            if value.is_null() {
                bitmap::set_bit(&mut nullmap, idx, true);
                continue;
            }
            let offset = schema.field_offset(idx);
            let width = column.data_type().width();
            encode_field(&mut data[offset..offset + width], value, column.data_type());
        }

        Record {
            nullmap,
            data,
            rid: INVALID_RID,
        }
    }

    /// Wraps already-encoded bytes (as read from a slot) together with
    /// the RID they were read from.
    pub fn from_bytes(nullmap: Vec<u8>, data: Vec<u8>, rid: Rid) -> Self {
        Record { nullmap, data, rid }
    }

    pub fn rid(&self) -> Rid {
        self.rid
    }

    pub fn set_rid(&mut self, rid: Rid) {
        self.rid = rid;
    }

    pub fn null_map(&self) -> &[u8] {
        &self.nullmap
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get_field(&self, schema: &RecordSchema, idx: usize) -> Field {
        let column = &schema.columns()[idx];
        if bitmap::get_bit(&self.nullmap, idx) {
            return Field::Null(column.data_type().clone());
        }
        let offset = schema.field_offset(idx);
        let width = column.data_type().width();
        decode_field(&self.data[offset..offset + width], column.data_type())
    }

    pub fn values(&self, schema: &RecordSchema) -> Vec<Field> {
        (0..schema.field_count()).map(|i| self.get_field(schema, i)).collect()
    }

    /// Projects this record onto `proj_schema`, keeping the column order
    /// `proj_schema` specifies (spec.md §4.6, Projection).
    pub fn project(&self, schema: &RecordSchema, proj_schema: &RecordSchema) -> Record {
        let values: Vec<Field> = proj_schema
            .columns()
            .iter()
            .map(|c| {
                let idx = schema
                    .index_of(c.name())
                    .expect("projection schema column must exist in source schema");
                self.get_field(schema, idx)
            })
            .collect();
        Record::new(proj_schema, &values)
    }
}

fn encode_field(buf: &mut [u8], value: &Field, data_type: &DataType) {
    match (value, data_type) {
        (Field::Int(v), DataType::Int) => buf.copy_from_slice(&v.to_le_bytes()),
        (Field::BigInt(v), DataType::BigInt) => buf.copy_from_slice(&v.to_le_bytes()),
        (Field::Float(v), DataType::Float) => buf.copy_from_slice(&v.to_le_bytes()),
        (Field::Bool(v), DataType::Bool) => buf[0] = *v as u8,
        (Field::Text(s), DataType::Text(cap)) => {
            let bytes = s.as_bytes();
            let len = bytes.len().min(*cap);
            buf[0..2].copy_from_slice(&(len as u16).to_le_bytes());
            buf[2..2 + len].copy_from_slice(&bytes[..len]);
        }
        _ => panic!("field {value:?} does not match column type {data_type:?}"),
    }
}

fn decode_field(buf: &[u8], data_type: &DataType) -> Field {
    match data_type {
        DataType::Int => Field::Int(i32::from_le_bytes(buf.try_into().unwrap())),
        DataType::BigInt => Field::BigInt(i64::from_le_bytes(buf.try_into().unwrap())),
        DataType::Float => Field::Float(f64::from_le_bytes(buf.try_into().unwrap())),
        DataType::Bool => Field::Bool(buf[0] != 0),
        DataType::Text(_) => {
            let len = u16::from_le_bytes([buf[0], buf[1]]) as usize;
            let s = String::from_utf8_lossy(&buf[2..2 + len]).into_owned();
            Field::Text(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::schema::Column;

    fn schema() -> RecordSchema {
        RecordSchema::new(vec![
            Column::new("id", DataType::Int, false),
            Column::new("name", DataType::Text(8), true),
        ])
    }

    #[test]
    fn new_record_round_trips_through_get_field() {
        let schema = schema();
        let record = Record::new(&schema, &[Field::Int(42), Field::Text("hi".to_string())]);
        assert_eq!(record.get_field(&schema, 0), Field::Int(42));
        assert_eq!(record.get_field(&schema, 1), Field::Text("hi".to_string()));
    }

    #[test]
    fn null_field_round_trips() {
        let schema = schema();
        let record = Record::new(&schema, &[Field::Int(1), Field::Null(DataType::Text(8))]);
        assert!(record.get_field(&schema, 1).is_null());
    }

    #[test]
    fn from_bytes_preserves_rid() {
        let schema = schema();
        let record = Record::new(&schema, &[Field::Int(1), Field::Null(DataType::Text(8))]);
        let rid = Rid::new(3, 1);
        let rebuilt = Record::from_bytes(record.null_map().to_vec(), record.data().to_vec(), rid);
        assert_eq!(rebuilt.rid(), rid);
        assert_eq!(rebuilt.get_field(&schema, 0), Field::Int(1));
    }

    #[test]
    fn project_preserves_requested_column_order() {
        let schema = schema();
        let record = Record::new(&schema, &[Field::Int(9), Field::Text("abc".to_string())]);
        let proj_schema = schema.project(&["name", "id"]).unwrap();
        let projected = record.project(&schema, &proj_schema);
        assert_eq!(projected.get_field(&proj_schema, 0), Field::Text("abc".to_string()));
        assert_eq!(projected.get_field(&proj_schema, 1), Field::Int(9));
    }

    #[test]
    fn invalid_rid_is_default() {
        assert_eq!(Rid::default(), INVALID_RID);
        assert!(!INVALID_RID.is_valid());
    }
}
