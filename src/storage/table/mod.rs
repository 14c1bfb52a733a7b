pub mod record;
pub mod schema;
pub mod table_handle;

pub use record::{Record, Rid, SlotId, INVALID_RID};
pub use schema::{Column, DataType, Field, RecordSchema};
pub use table_handle::{TableHandle, TableHeader};
