use super::{bitmap, Page, PAGE_HEADER_SIZE};
use crate::storage::table::record::SlotId;

/// A view over a page's bytes, aware of the owning table's slot
/// geometry (spec.md §4.4). Both the N-ary and PAX layouts implement
/// this; the table handle only ever goes through the trait.
pub trait PageHandle {
    /// The slot liveness bitmap -- 1 bit per slot, bit `i` set iff slot
    /// `i` holds a live record.
    fn bitmap(&self) -> &[u8];
    fn bitmap_mut(&mut self) -> &mut [u8];

    /// Copies slot `slot`'s null bitmap and payload into the caller's
    /// buffers. Does not check liveness -- callers consult `bitmap()`
    /// first.
    fn read_slot(&self, slot: SlotId, nullmap_out: &mut [u8], data_out: &mut [u8]);

    /// Copies `nullmap`/`data` into slot `slot`'s storage. Does not flip
    /// the liveness bit; callers do that separately via `bitmap_mut()`
    /// (spec.md §4.4: "does not itself flip the live-bit").
    fn write_slot(&mut self, slot: SlotId, nullmap: &[u8], data: &[u8], is_update: bool);
}

/// Row-major slotted page: `[header][bitmap][slot0][slot1]...`, each
/// slot `nullmap_size + rec_size` bytes (spec.md §6). Normative layout
/// per spec.md §1.
pub struct NAryPageHandle<'a> {
    page: &'a mut Page,
    rec_per_page: usize,
    nullmap_size: usize,
    rec_size: usize,
}

impl<'a> NAryPageHandle<'a> {
    pub fn new(page: &'a mut Page, rec_per_page: usize, nullmap_size: usize, rec_size: usize) -> Self {
        NAryPageHandle {
            page,
            rec_per_page,
            nullmap_size,
            rec_size,
        }
    }

    fn bitmap_bytes(&self) -> usize {
        bitmap::bytes_needed(self.rec_per_page)
    }

    fn bitmap_offset(&self) -> usize {
        PAGE_HEADER_SIZE
    }

    fn slot_bytes(&self) -> usize {
        self.nullmap_size + self.rec_size
    }

    fn slot_offset(&self, slot: SlotId) -> usize {
        self.bitmap_offset() + self.bitmap_bytes() + slot as usize * self.slot_bytes()
    }

    pub fn page(&self) -> &Page {
        self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        self.page
    }
}

impl<'a> PageHandle for NAryPageHandle<'a> {
    fn bitmap(&self) -> &[u8] {
        let start = self.bitmap_offset();
        let end = start + self.bitmap_bytes();
        &self.page.data()[start..end]
    }

    fn bitmap_mut(&mut self) -> &mut [u8] {
        let start = self.bitmap_offset();
        let end = start + self.bitmap_bytes();
        &mut self.page.data_mut()[start..end]
    }

    fn read_slot(&self, slot: SlotId, nullmap_out: &mut [u8], data_out: &mut [u8]) {
        let start = self.slot_offset(slot);
        let nullmap_size = self.nullmap_size;
        let rec_size = self.rec_size;
        let bytes = self.page.data();
        nullmap_out.copy_from_slice(&bytes[start..start + nullmap_size]);
        data_out.copy_from_slice(&bytes[start + nullmap_size..start + nullmap_size + rec_size]);
    }

    fn write_slot(&mut self, slot: SlotId, nullmap: &[u8], data: &[u8], _is_update: bool) {
        let start = self.slot_offset(slot);
        let nullmap_size = self.nullmap_size;
        let bytes = self.page.data_mut();
        bytes[start..start + nullmap_size].copy_from_slice(nullmap);
        bytes[start + nullmap_size..start + nullmap_size + data.len()].copy_from_slice(data);
    }
}
