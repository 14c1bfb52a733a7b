//! Maps `Rid -> Record` through the buffer pool, and owns the free-page
//! chain and header counters (spec.md §4.5).
//!
//! Grounded on `system/handle/table_handle.cpp` of the NJU_DBPractice
//! original: `FetchPageHandle`/`CreatePageHandle`/`CreateNewPageHandle`
//! become [`TableHandle::fetch_page`]/[`TableHandle::acquire_page_for_insert`]
//! below, same free-page-chain splicing order.

use crate::common::constants::{FILE_HEADER_PAGE_ID, INVALID_PAGE_ID};
use crate::common::{Error, Result};
use crate::storage::buffer::BufferPoolManager;
use crate::storage::disk::disk_manager::{FileId, PageId};
use crate::storage::page::bitmap;
use crate::storage::page::table_page::{NAryPageHandle, PageHandle};
use crate::storage::page::PageRef;
use crate::storage::table::record::{Record, Rid, SlotId, INVALID_RID};
use crate::storage::table::schema::RecordSchema;
use std::sync::{Arc, Mutex};

/// Bytes occupied by [`TableHeader`] at the front of page 0.
const TABLE_HEADER_SIZE: usize = 24;

/// Persisted on page 0 of the table file (spec.md §3, §6). `page_num`
/// counts the header page too, so a fresh table has `page_num = 1` and
/// its first data page is id 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHeader {
    pub rec_size: u32,
    pub nullmap_size: u32,
    pub rec_per_page: u32,
    pub page_num: u32,
    pub rec_num: u32,
    pub first_free_page: PageId,
}

impl TableHeader {
    /// Picks the largest `rec_per_page` whose slotted layout (header +
    /// bitmap + slots) still fits in one page (spec.md §6).
    pub fn new(schema: &RecordSchema, page_size: usize) -> Self {
        let rec_size = schema.rec_size() as u32;
        let nullmap_size = schema.nullmap_size() as u32;
        let slot_size = rec_size + nullmap_size;
        let mut rec_per_page: u32 = 0;
        loop {
            let candidate = rec_per_page + 1;
            let bitmap_bytes = bitmap::bytes_needed(candidate as usize) as u32;
            let used = crate::storage::page::PAGE_HEADER_SIZE as u32 + bitmap_bytes + candidate * slot_size;
            if used as usize > page_size {
                break;
            }
            rec_per_page = candidate;
        }
        assert!(rec_per_page > 0, "page size too small to hold a single record of this schema");
        TableHeader {
            rec_size,
            nullmap_size,
            rec_per_page,
            page_num: 1,
            rec_num: 0,
            first_free_page: INVALID_PAGE_ID,
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.rec_size.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.nullmap_size.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.rec_per_page.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.page_num.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.rec_num.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.first_free_page.to_le_bytes());
    }

    fn read_from(bytes: &[u8]) -> Self {
        TableHeader {
            rec_size: u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            nullmap_size: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            rec_per_page: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            page_num: u32::from_le_bytes(bytes[12..16].try_into().unwrap()),
            rec_num: u32::from_le_bytes(bytes[16..20].try_into().unwrap()),
            first_free_page: PageId::from_le_bytes(bytes[20..24].try_into().unwrap()),
        }
    }
}

/// Row-major table access layer over one file. Single-threaded per
/// query (spec.md §5); the `Arc<Mutex<_>>` buffer pool handle is shared
/// across tables and queries, not across concurrent use of one
/// `TableHandle`.
#[derive(Debug)]
pub struct TableHandle {
    header: TableHeader,
    file_id: FileId,
    schema: RecordSchema,
    bpm: Arc<Mutex<BufferPoolManager>>,
}

impl TableHandle {
    /// Creates a brand-new table: picks `rec_per_page` for `schema` and
    /// persists a fresh header to page 0.
    pub fn create(file_id: FileId, schema: RecordSchema, bpm: Arc<Mutex<BufferPoolManager>>) -> Result<Self> {
        let page_size = bpm.lock().unwrap().page_size();
        let header = TableHeader::new(&schema, page_size);
        let mut handle = TableHandle { header, file_id, schema, bpm };
        handle.persist_header()?;
        Ok(handle)
    }

    /// Reopens a table whose header has already been persisted to page 0.
    pub fn open(file_id: FileId, schema: RecordSchema, bpm: Arc<Mutex<BufferPoolManager>>) -> Result<Self> {
        let page = bpm.lock().unwrap().fetch(file_id, FILE_HEADER_PAGE_ID)?;
        let header = TableHeader::read_from(&page.read().unwrap().data()[0..TABLE_HEADER_SIZE]);
        debug_assert!(bpm.lock().unwrap().unpin(file_id, FILE_HEADER_PAGE_ID, false));
        Ok(TableHandle { header, file_id, schema, bpm })
    }

    pub fn header(&self) -> TableHeader {
        self.header
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    fn persist_header(&mut self) -> Result<()> {
        let mut bpm = self.bpm.lock().unwrap();
        let page = bpm.fetch(self.file_id, FILE_HEADER_PAGE_ID)?;
        self.header.write_to(&mut page.write().unwrap().data_mut()[0..TABLE_HEADER_SIZE]);
        debug_assert!(bpm.unpin(self.file_id, FILE_HEADER_PAGE_ID, true));
        Ok(())
    }

    fn page_handle<'a>(&self, page: &'a mut crate::storage::page::Page) -> NAryPageHandle<'a> {
        NAryPageHandle::new(
            page,
            self.header.rec_per_page as usize,
            self.header.nullmap_size as usize,
            self.header.rec_size as usize,
        )
    }

    /// spec.md §4.5: fetch the containing page, bail with `record-miss`
    /// if the slot is clear, else copy it into an owned [`Record`].
    pub fn get_record(&self, rid: Rid) -> Result<Record> {
        let page_id = rid.page_id();
        let slot_id = rid.slot_id();
        let page = self.bpm.lock().unwrap().fetch(self.file_id, page_id)?;
        let found = {
            let mut guard = page.write().unwrap();
            let handle = self.page_handle(&mut *guard);
            if !bitmap::get_bit(handle.bitmap(), slot_id as usize) {
                None
            } else {
                let mut nullmap = vec![0u8; self.header.nullmap_size as usize];
                let mut data = vec![0u8; self.header.rec_size as usize];
                handle.read_slot(slot_id, &mut nullmap, &mut data);
                Some((nullmap, data))
            }
        };
        debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, false));
        match found {
            Some((nullmap, data)) => Ok(Record::from_bytes(nullmap, data, rid)),
            None => Err(Error::RecordMiss { page_id, slot_id }),
        }
    }

    /// spec.md §4.5.1: splice a fresh page onto the head of the
    /// free-page chain when none has capacity, else fetch the current
    /// head. Either way the returned page is fetched (pinned) once.
    fn acquire_page_for_insert(&mut self) -> Result<(PageId, PageRef)> {
        if self.header.first_free_page == INVALID_PAGE_ID {
            let page_id = self.header.page_num as PageId;
            self.header.page_num += 1;
            let page = self.bpm.lock().unwrap().new_page(self.file_id, page_id)?;
            let prior_first_free = self.header.first_free_page;
            page.write().unwrap().set_next_free_page(prior_first_free);
            self.header.first_free_page = page_id;
            Ok((page_id, page))
        } else {
            let page_id = self.header.first_free_page;
            let page = self.bpm.lock().unwrap().fetch(self.file_id, page_id)?;
            Ok((page_id, page))
        }
    }

    /// spec.md §4.5: insert into the first page with capacity, returning
    /// its newly assigned `Rid`.
    pub fn insert_record(&mut self, record: &Record) -> Result<Rid> {
        let (page_id, page) = self.acquire_page_for_insert()?;
        let rec_per_page = self.header.rec_per_page;
        let slot_id = {
            let mut guard = page.write().unwrap();
            let mut handle = self.page_handle(&mut *guard);
            let slot_id = bitmap::find_first(handle.bitmap(), rec_per_page as usize, 0, false) as SlotId;
            handle.write_slot(slot_id, record.null_map(), record.data(), false);
            bitmap::set_bit(handle.bitmap_mut(), slot_id as usize, true);
            drop(handle);
            let record_num = guard.record_num() + 1;
            guard.set_record_num(record_num);
            if record_num == rec_per_page {
                self.header.first_free_page = guard.next_free_page();
                guard.set_next_free_page(INVALID_PAGE_ID);
            }
            slot_id
        };
        self.header.rec_num += 1;
        self.persist_header()?;
        debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, true));
        Ok(Rid::new(page_id, slot_id))
    }

    /// spec.md §4.5: targeted insertion at a caller-chosen `rid`. Fails
    /// with `page-miss` / `record-exists` rather than silently
    /// allocating or overwriting.
    pub fn insert_record_at(&mut self, rid: Rid, record: &Record) -> Result<()> {
        let page_id = rid.page_id();
        if page_id == INVALID_PAGE_ID || page_id as u32 >= self.header.page_num {
            return Err(Error::PageMiss { page_id });
        }
        let slot_id = rid.slot_id();
        let page = self.bpm.lock().unwrap().fetch(self.file_id, page_id)?;
        let rec_per_page = self.header.rec_per_page;
        let exists = {
            let guard = page.read().unwrap();
            let bitmap_start = crate::storage::page::PAGE_HEADER_SIZE;
            let bitmap_len = bitmap::bytes_needed(rec_per_page as usize);
            bitmap::get_bit(&guard.data()[bitmap_start..bitmap_start + bitmap_len], slot_id as usize)
        };
        if exists {
            debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, false));
            return Err(Error::RecordExists { page_id, slot_id });
        }
        {
            let mut guard = page.write().unwrap();
            let mut handle = self.page_handle(&mut *guard);
            handle.write_slot(slot_id, record.null_map(), record.data(), false);
            bitmap::set_bit(handle.bitmap_mut(), slot_id as usize, true);
            drop(handle);
            let record_num = guard.record_num() + 1;
            guard.set_record_num(record_num);
            if record_num == rec_per_page {
                self.header.first_free_page = guard.next_free_page();
                guard.set_next_free_page(INVALID_PAGE_ID);
            }
        }
        self.header.rec_num += 1;
        self.persist_header()?;
        debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, true));
        Ok(())
    }

    /// spec.md §4.5 + §9: clears the slot bit, and -- fixing the
    /// source's documented dirty-bit defect -- unpins the frame dirty,
    /// since the bitmap and `record_num` did change in memory.
    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        let page_id = rid.page_id();
        let slot_id = rid.slot_id();
        let page = self.bpm.lock().unwrap().fetch(self.file_id, page_id)?;
        let rec_per_page = self.header.rec_per_page;
        let missing = {
            let mut guard = page.write().unwrap();
            let mut handle = self.page_handle(&mut *guard);
            if !bitmap::get_bit(handle.bitmap(), slot_id as usize) {
                true
            } else {
                bitmap::set_bit(handle.bitmap_mut(), slot_id as usize, false);
                drop(handle);
                let was_full = guard.record_num() == rec_per_page;
                guard.set_record_num(guard.record_num() - 1);
                if was_full {
                    guard.set_next_free_page(self.header.first_free_page);
                    self.header.first_free_page = page_id;
                }
                false
            }
        };
        if missing {
            debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, false));
            return Err(Error::RecordMiss { page_id, slot_id });
        }
        self.header.rec_num -= 1;
        self.persist_header()?;
        debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, true));
        Ok(())
    }

    /// spec.md §4.5: rewrites the null bitmap and payload of a live slot.
    pub fn update_record(&mut self, rid: Rid, record: &Record) -> Result<()> {
        let page_id = rid.page_id();
        let slot_id = rid.slot_id();
        let page = self.bpm.lock().unwrap().fetch(self.file_id, page_id)?;
        let missing = {
            let mut guard = page.write().unwrap();
            let mut handle = self.page_handle(&mut *guard);
            if !bitmap::get_bit(handle.bitmap(), slot_id as usize) {
                true
            } else {
                handle.write_slot(slot_id, record.null_map(), record.data(), true);
                false
            }
        };
        if missing {
            debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, false));
            return Err(Error::RecordMiss { page_id, slot_id });
        }
        debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, true));
        Ok(())
    }

    /// spec.md §4.5.2: first live `Rid` in page order, or `INVALID_RID`.
    pub fn first_rid(&self) -> Result<Rid> {
        self.scan_from(FILE_HEADER_PAGE_ID + 1, 0)
    }

    /// spec.md §4.5.2: the next live `Rid` after `rid`, or `INVALID_RID`
    /// past the last page.
    pub fn next_rid(&self, rid: Rid) -> Result<Rid> {
        self.scan_from(rid.page_id(), rid.slot_id() as usize + 1)
    }

    fn scan_from(&self, mut page_id: PageId, mut start_slot: usize) -> Result<Rid> {
        let rec_per_page = self.header.rec_per_page as usize;
        while (page_id as u32) < self.header.page_num {
            let page = self.bpm.lock().unwrap().fetch(self.file_id, page_id)?;
            let slot = {
                let mut guard = page.write().unwrap();
                let handle = self.page_handle(&mut *guard);
                bitmap::find_first(handle.bitmap(), rec_per_page, start_slot, true)
            };
            debug_assert!(self.bpm.lock().unwrap().unpin(self.file_id, page_id, false));
            if slot != rec_per_page {
                return Ok(Rid::new(page_id, slot as SlotId));
            }
            page_id += 1;
            start_slot = 0;
        }
        Ok(INVALID_RID)
    }
}
