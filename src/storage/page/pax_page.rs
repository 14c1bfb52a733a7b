//! PAX (column-striped) page layout. Noted but not specified in depth by
//! spec.md §1; this is an illustrative second implementation of
//! [`super::table_page::PageHandle`], not a primary deliverable. The
//! table handle reaches it only through the trait plus
//! [`PaxPageHandle::get_chunk`].

use super::table_page::PageHandle;
use super::{bitmap, Page, PAGE_HEADER_SIZE};
use crate::storage::table::record::SlotId;

/// Byte width of each column, in schema order. Offsets into the page's
/// column region are derived from this at construction time, mirroring
/// the field-offset precomputation the original table handle does for
/// PAX tables (`field_offset_`, computed once when the table is opened).
pub struct PaxPageHandle<'a> {
    page: &'a mut Page,
    rec_per_page: usize,
    column_widths: Vec<usize>,
    column_offsets: Vec<usize>,
}

impl<'a> PaxPageHandle<'a> {
    pub fn new(page: &'a mut Page, rec_per_page: usize, column_widths: Vec<usize>) -> Self {
        let bitmap_bytes = bitmap::bytes_needed(rec_per_page);
        let mut column_offsets = Vec::with_capacity(column_widths.len());
        let mut offset = PAGE_HEADER_SIZE + bitmap_bytes;
        for width in &column_widths {
            column_offsets.push(offset);
            offset += width * rec_per_page;
        }
        PaxPageHandle {
            page,
            rec_per_page,
            column_widths,
            column_offsets,
        }
    }

    /// Raw bytes for column `col` across every slot in the page: useful
    /// for vectorized scans over a single column without touching the
    /// others.
    pub fn get_chunk(&self, col: usize) -> &[u8] {
        let start = self.column_offsets[col];
        let end = start + self.column_widths[col] * self.rec_per_page;
        &self.page.data()[start..end]
    }

    fn bitmap_offset(&self) -> usize {
        PAGE_HEADER_SIZE
    }

    fn bitmap_bytes(&self) -> usize {
        bitmap::bytes_needed(self.rec_per_page)
    }
}

impl<'a> PageHandle for PaxPageHandle<'a> {
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
        // The leading byte of each column's per-slot cell doubles as
        // that column's null flag for this slot (no separate nullmap
        // region, unlike the N-ary layout); nullmap_out is left zeroed
        // beyond what this loop sets.
        nullmap_out.fill(0);
        let mut data_offset = 0;
        for (col, &width) in self.column_widths.iter().enumerate() {
            let col_start = self.column_offsets[col] + slot as usize * width;
            let cell = &self.page.data()[col_start..col_start + width];
            if col / 8 < nullmap_out.len() && cell[0] == 0xFF {
                bitmap::set_bit(nullmap_out, col, true);
            }
            data_out[data_offset..data_offset + width].copy_from_slice(cell);
            data_offset += width;
        }
    }

    fn write_slot(&mut self, slot: SlotId, nullmap: &[u8], data: &[u8], _is_update: bool) {
        let mut data_offset = 0;
        for (col, &width) in self.column_widths.clone().iter().enumerate() {
            let col_start = self.column_offsets[col] + slot as usize * width;
            let cell = &mut self.page.data_mut()[col_start..col_start + width];
            if bitmap::get_bit(nullmap, col) {
                cell.fill(0xFF);
            } else {
                cell.copy_from_slice(&data[data_offset..data_offset + width]);
            }
            data_offset += width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_stored_contiguously_across_slots() {
        let rec_per_page = 4;
        let widths = vec![4usize, 2usize];
        let bitmap_bytes = bitmap::bytes_needed(rec_per_page);
        let page_size = PAGE_HEADER_SIZE + bitmap_bytes + rec_per_page * widths.iter().sum::<usize>();
        let mut page = Page::new(1, page_size);
        let mut handle = PaxPageHandle::new(&mut page, rec_per_page, widths);

        let nullmap = [0u8];
        handle.write_slot(0, &nullmap, &[1, 0, 0, 0, 9, 9], false);
        handle.write_slot(1, &nullmap, &[2, 0, 0, 0, 8, 8], false);

        let chunk0 = handle.get_chunk(0);
        assert_eq!(&chunk0[0..4], &[1, 0, 0, 0]);
        assert_eq!(&chunk0[4..8], &[2, 0, 0, 0]);
    }
}
