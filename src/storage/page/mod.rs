pub mod bitmap;
pub mod pax_page;
pub mod table_page;

use crate::storage::disk::disk_manager::PageId;
use std::sync::{Arc, RwLock};

/// Fixed in-memory header carried by every data page:
/// `page_id` (4 bytes) + `next_free_page` (4 bytes) + `record_num` (4 bytes).
/// Written directly at byte offsets, not through a serde round-trip --
/// this is the hot path (spec.md §4.5 mutates it on every insert/delete).
pub const PAGE_HEADER_SIZE: usize = 12;

/// A fixed-size block of bytes, identified by `page_id`, holding either a
/// table's header (page 0, see [`crate::storage::table::table_handle::TableHeader`])
/// or a slotted data page. Page bytes are the single source of truth;
/// `page_id` is re-stamped on every fetch rather than trusted from the
/// raw bytes, since a freshly allocated page's bytes start out zeroed.
#[derive(Debug, Clone)]
pub struct Page {
    data: Vec<u8>,
}

/// Shared handle to a page as cached by the buffer pool. Frames hand
/// these out directly (spec.md §4.3's "returns a pinned frame... and
/// return its page"); callers take a read or write lock per access.
pub type PageRef = Arc<RwLock<Page>>;

impl Page {
    /// A freshly allocated page: zeroed payload, header set to
    /// `(page_id, INVALID_PAGE_ID, 0)`.
    pub fn new(page_id: PageId, page_size: usize) -> Self {
        let mut page = Page { data: vec![0u8; page_size] };
        page.set_page_id(page_id);
        page.set_next_free_page(crate::common::constants::INVALID_PAGE_ID);
        page.set_record_num(0);
        page
    }

    /// Wraps raw bytes read off disk, re-stamping `page_id` since the
    /// bytes alone cannot be trusted to carry it correctly (e.g. a page
    /// that was never written is all zero).
    ///
    /// The table's header page (`FILE_HEADER_PAGE_ID`) is the one
    /// exception: its first four bytes hold `TableHeader::rec_size`
    /// (see `table_handle.rs`), not a generic page header, so re-stamping
    /// them here would clobber the header every time page 0 is fetched
    /// off disk. Nothing reads `page_id()`/`next_free_page()`/
    /// `record_num()` on the header page, so skipping the stamp for it
    /// is safe.
    pub fn from_disk_bytes(page_id: PageId, data: Vec<u8>) -> Self {
        let mut page = Page { data };
        if page_id != crate::common::constants::FILE_HEADER_PAGE_ID {
            page.set_page_id(page_id);
        }
        page
    }

    pub fn page_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn page_id(&self) -> PageId {
        PageId::from_le_bytes(self.data[0..4].try_into().unwrap())
    }

    pub fn set_page_id(&mut self, page_id: PageId) {
        self.data[0..4].copy_from_slice(&page_id.to_le_bytes());
    }

    pub fn next_free_page(&self) -> PageId {
        PageId::from_le_bytes(self.data[4..8].try_into().unwrap())
    }

    pub fn set_next_free_page(&mut self, page_id: PageId) {
        self.data[4..8].copy_from_slice(&page_id.to_le_bytes());
    }

    pub fn record_num(&self) -> u32 {
        u32::from_le_bytes(self.data[8..12].try_into().unwrap())
    }

    pub fn set_record_num(&mut self, n: u32) {
        self.data[8..12].copy_from_slice(&n.to_le_bytes());
    }
}
