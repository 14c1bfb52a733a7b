use crate::common::{Error, Result};
use crate::storage::buffer::frame::Frame;
use crate::storage::buffer::replacer::{LruKReplacer, LruReplacer, Replacer};
use crate::storage::disk::disk_manager::{DiskManager, FileId, PageId};
use crate::storage::page::{Page, PageRef};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

/// Index into the buffer pool's frame array.
pub type FrameId = usize;

/// Caches fixed-size disk pages from any number of open files in a
/// bounded set of in-memory frames (spec.md §4.2-§4.3). The whole
/// struct sits behind a single mutex -- every operation below runs
/// with exclusive access, giving callers a linearizable order over
/// fetch/unpin/flush/delete (spec.md §4.3 "single pool-wide mutex").
#[derive(Debug)]
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<Frame>,
    page_table: HashMap<(FileId, PageId), FrameId>,
    free_list: VecDeque<FrameId>,
    replacer: Box<dyn Replacer>,
    disk_manager: Arc<RwLock<DiskManager>>,
    page_size: usize,
}

#[derive(Default)]
pub struct BufferPoolManagerBuilder {
    pool_size: Option<usize>,
    page_size: Option<usize>,
    replacer: Option<Box<dyn Replacer>>,
    disk_manager: Option<Arc<RwLock<DiskManager>>>,
}

impl BufferPoolManagerBuilder {
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn replacer(mut self, replacer: Box<dyn Replacer>) -> Self {
        self.replacer = Some(replacer);
        self
    }

    pub fn disk_manager(mut self, disk_manager: Arc<RwLock<DiskManager>>) -> Self {
        self.disk_manager = Some(disk_manager);
        self
    }

    pub fn build(self) -> BufferPoolManager {
        let pool_size = self.pool_size.expect("`pool_size` not set before build");
        let page_size = self.page_size.expect("`page_size` not set before build");
        let disk_manager = self.disk_manager.expect("`disk_manager` not set before build");
        let replacer = self.replacer.unwrap_or_else(|| Box::new(LruReplacer::new()));
        BufferPoolManager::new(pool_size, page_size, replacer, disk_manager)
    }

    pub fn build_with_handle(self) -> Arc<Mutex<BufferPoolManager>> {
        Arc::new(Mutex::new(self.build()))
    }
}

impl BufferPoolManager {
    pub fn new(
        pool_size: usize,
        page_size: usize,
        replacer: Box<dyn Replacer>,
        disk_manager: Arc<RwLock<DiskManager>>,
    ) -> Self {
        BufferPoolManager {
            pool_size,
            frames: (0..pool_size).map(|_| Frame::empty(page_size)).collect(),
            page_table: HashMap::new(),
            free_list: (0..pool_size).collect(),
            replacer,
            disk_manager,
            page_size,
        }
    }

    pub fn builder() -> BufferPoolManagerBuilder {
        BufferPoolManagerBuilder::default()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Built from a [`crate::config::Config`], picking the replacer
    /// implementation it names.
    pub fn from_config(config: &crate::config::Config, disk_manager: Arc<RwLock<DiskManager>>) -> Self {
        let replacer: Box<dyn Replacer> = match config.replacer {
            crate::config::ReplacerKind::Lru => Box::new(LruReplacer::new()),
            crate::config::ReplacerKind::LruK => Box::new(LruKReplacer::new(config.replacer_k)),
        };
        Self::new(config.buffer_pool_size, config.page_size, replacer, disk_manager)
    }

    pub fn size(&self) -> usize {
        self.pool_size
    }

    fn claim_frame(&mut self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(frame_id);
        }
        let frame_id = self.replacer.victim().ok_or_else(|| {
            log::warn!("buffer pool exhausted: no evictable frame among {} frames", self.pool_size);
            Error::NoFreeFrame
        })?;
        self.evict_frame(frame_id)?;
        Ok(frame_id)
    }

    fn evict_frame(&mut self, frame_id: FrameId) -> Result<()> {
        let identity = self.frames[frame_id].identity();
        if let Some((file_id, page_id)) = identity {
            if self.frames[frame_id].is_dirty() {
                log::debug!("evicting dirty frame {frame_id} (file {file_id}, page {page_id}), flushing first");
                self.write_back(frame_id, file_id, page_id)?;
            } else {
                log::debug!("evicting clean frame {frame_id} (file {file_id}, page {page_id})");
            }
            self.page_table.remove(&(file_id, page_id));
        }
        self.frames[frame_id].reset();
        Ok(())
    }

    fn write_back(&mut self, frame_id: FrameId, file_id: FileId, page_id: PageId) -> Result<()> {
        let page_ref = self.frames[frame_id].page();
        let bytes = page_ref.read().unwrap().data().to_vec();
        self.disk_manager.write().unwrap().write_page(file_id, page_id, &bytes)?;
        self.frames[frame_id].clear_dirty();
        log::debug!("wrote back file {file_id} page {page_id}");
        Ok(())
    }

    /// Pins and returns the page `(file_id, page_id)`, fetching it from
    /// disk (or materializing it via implicit allocation) if it isn't
    /// already cached. Records the access with the replacer.
    pub fn fetch(&mut self, file_id: FileId, page_id: PageId) -> Result<PageRef> {
        if let Some(&frame_id) = self.page_table.get(&(file_id, page_id)) {
            self.frames[frame_id].pin();
            self.replacer.pin(frame_id);
            return Ok(self.frames[frame_id].page());
        }

        let frame_id = self.claim_frame()?;
        let mut bytes = vec![0u8; self.page_size];
        self.disk_manager.write().unwrap().read_page(file_id, page_id, &mut bytes)?;
        let page = Page::from_disk_bytes(page_id, bytes);
        self.frames[frame_id].bind((file_id, page_id), page);
        self.frames[frame_id].pin();
        self.page_table.insert((file_id, page_id), frame_id);
        self.replacer.pin(frame_id);
        Ok(self.frames[frame_id].page())
    }

    /// Registers a brand-new, zeroed page without reading it from disk
    /// (the table handle has already decided `page_id` is free to use).
    pub fn new_page(&mut self, file_id: FileId, page_id: PageId) -> Result<PageRef> {
        let frame_id = self.claim_frame()?;
        let page = Page::new(page_id, self.page_size);
        self.frames[frame_id].bind((file_id, page_id), page);
        self.frames[frame_id].pin();
        self.frames[frame_id].set_dirty(true);
        self.page_table.insert((file_id, page_id), frame_id);
        self.replacer.pin(frame_id);
        Ok(self.frames[frame_id].page())
    }

    /// Decrements the pin count of a cached page, folding in whether the
    /// caller's access dirtied it (sticky: never un-dirties a page).
    /// Becomes evictable once the pin count reaches zero. Returns `false`
    /// without mutating anything if the page isn't cached or the frame
    /// wasn't pinned in the first place.
    pub fn unpin(&mut self, file_id: FileId, page_id: PageId, dirty: bool) -> bool {
        let Some(&frame_id) = self.page_table.get(&(file_id, page_id)) else {
            return false;
        };
        if !self.frames[frame_id].unpin() {
            return false;
        }
        if dirty {
            self.frames[frame_id].set_dirty(true);
        }
        if !self.frames[frame_id].in_use() {
            self.replacer.unpin(frame_id);
        }
        true
    }

    /// Writes a page back to disk unconditionally and clears its dirty
    /// bit, regardless of whether it was actually dirty. Returns `false`
    /// if the page isn't cached; propagates genuine I/O failures.
    pub fn flush(&mut self, file_id: FileId, page_id: PageId) -> Result<bool> {
        let Some(&frame_id) = self.page_table.get(&(file_id, page_id)) else {
            return Ok(false);
        };
        self.write_back(frame_id, file_id, page_id)?;
        Ok(true)
    }

    /// Flushes every page currently cached for `file_id`.
    pub fn flush_all(&mut self, file_id: FileId) -> Result<()> {
        let page_ids: Vec<PageId> = self
            .page_table
            .keys()
            .filter(|(fid, _)| *fid == file_id)
            .map(|(_, pid)| *pid)
            .collect();
        for page_id in page_ids {
            self.flush(file_id, page_id)?;
        }
        Ok(())
    }

    /// Evicts a specific page from the cache, writing it back first if
    /// dirty, and freeing its frame. Returns `false` if the page isn't
    /// cached, or (without aborting) if it's pinned -- the caller can
    /// retry once it's released.
    pub fn delete(&mut self, file_id: FileId, page_id: PageId) -> Result<bool> {
        let Some(&frame_id) = self.page_table.get(&(file_id, page_id)) else {
            return Ok(false);
        };
        if self.frames[frame_id].in_use() {
            return Ok(false);
        }
        if self.frames[frame_id].is_dirty() {
            self.write_back(frame_id, file_id, page_id)?;
        }
        self.page_table.remove(&(file_id, page_id));
        self.frames[frame_id].reset();
        self.free_list.push_back(frame_id);
        Ok(true)
    }

    /// Evicts every page cached for `file_id`, continuing past pages
    /// that are currently pinned rather than aborting the sweep.
    /// Returns `true` only if every page was evicted.
    pub fn delete_all(&mut self, file_id: FileId) -> Result<bool> {
        let page_ids: Vec<PageId> = self
            .page_table
            .keys()
            .filter(|(fid, _)| *fid == file_id)
            .map(|(_, pid)| *pid)
            .collect();
        let mut all_deleted = true;
        for page_id in page_ids {
            if !self.delete(file_id, page_id)? {
                all_deleted = false;
            }
        }
        Ok(all_deleted)
    }

    pub fn pin_count(&self, file_id: FileId, page_id: PageId) -> Option<usize> {
        let frame_id = *self.page_table.get(&(file_id, page_id))?;
        Some(self.frames[frame_id].pin_count())
    }

    pub fn is_dirty(&self, file_id: FileId, page_id: PageId) -> Option<bool> {
        let frame_id = *self.page_table.get(&(file_id, page_id))?;
        Some(self.frames[frame_id].is_dirty())
    }
}

#[cfg(test)]
mod tests;
