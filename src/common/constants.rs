//! Process-wide sentinels. Geometry (page size, pool size, replacer
//! choice) lives in [`crate::config`] instead of here, per spec.md's
//! design note against reading configuration off of globals.

use crate::storage::disk::disk_manager::{FileId, PageId};
use crate::storage::table::record::SlotId;

/// The table file's header page, carrying the persisted [`crate::storage::table::table_handle::TableHeader`].
pub const FILE_HEADER_PAGE_ID: PageId = 0;

/// Sentinel meaning "no page" -- end of the free-page chain, or an
/// unresolved `RID`.
pub const INVALID_PAGE_ID: PageId = -1;

/// Sentinel meaning "no slot".
pub const INVALID_SLOT_ID: SlotId = -1;

/// A `file_id` that can never correspond to a real, opened table file.
pub const INVALID_FILE_ID: FileId = u32::MAX;
