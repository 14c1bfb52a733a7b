use crate::storage::disk::disk_manager::{FileId, PageId};
use crate::storage::page::{Page, PageRef};

/// One in-memory slot holding at most one page (spec.md §3, §4.2).
///
/// Invariants enforced by the buffer pool manager, not by `Frame`
/// itself: pin count > 0 implies the frame must not be evicted; dirty
/// implies the page's bytes differ from disk; a frame is either free or
/// bound to exactly one `(file_id, page_id)`.
#[derive(Debug)]
pub struct Frame {
    identity: Option<(FileId, PageId)>,
    page: PageRef,
    pin_count: usize,
    dirty: bool,
}

impl Frame {
    pub fn empty(page_size: usize) -> Self {
        Frame {
            identity: None,
            page: std::sync::Arc::new(std::sync::RwLock::new(Page::new(
                crate::common::constants::INVALID_PAGE_ID,
                page_size,
            ))),
            pin_count: 0,
            dirty: false,
        }
    }

    pub fn pin(&mut self) {
        self.pin_count += 1;
    }

    /// Decrements the pin count. Returns `false` without mutating
    /// anything if the frame was already not in use (spec.md §5:
    /// "over-unpinning is reported as false by `unpin`").
    pub fn unpin(&mut self) -> bool {
        if self.pin_count == 0 {
            return false;
        }
        self.pin_count -= 1;
        true
    }

    pub fn in_use(&self) -> bool {
        self.pin_count > 0
    }

    pub fn pin_count(&self) -> usize {
        self.pin_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sticky-dirty: once set, stays set until [`Frame::reset`] (on
    /// delete/eviction) or an explicit clear after write-back.
    pub fn set_dirty(&mut self, flag: bool) {
        if !self.dirty {
            self.dirty = flag;
        }
    }

    /// Clears the dirty bit after a successful write-back, without
    /// touching pin count or identity (spec.md §9: flush and eviction
    /// write-back SHOULD clear the dirty bit).
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn identity(&self) -> Option<(FileId, PageId)> {
        self.identity
    }

    pub fn page(&self) -> PageRef {
        self.page.clone()
    }

    /// Binds this frame to a freshly fetched page, replacing whatever it
    /// held before. Callers are responsible for having already written
    /// back a dirty previous occupant.
    pub fn bind(&mut self, identity: (FileId, PageId), page: Page) {
        self.identity = Some(identity);
        self.page = std::sync::Arc::new(std::sync::RwLock::new(page));
        self.pin_count = 0;
        self.dirty = false;
    }

    /// Pin count = 0, dirty = false, identity cleared (spec.md §4.2).
    pub fn reset(&mut self) {
        self.identity = None;
        self.pin_count = 0;
        self.dirty = false;
    }
}
