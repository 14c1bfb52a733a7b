pub mod lru_k_replacer;
pub mod lru_replacer;

pub use lru_k_replacer::LruKReplacer;
pub use lru_replacer::LruReplacer;

use crate::storage::buffer::buffer_pool_manager::FrameId;

/// Chooses eviction victims among the buffer pool's currently
/// *evictable* frames (spec.md §4.1). Implementations are internally
/// serialized so concurrent callers see a linearizable order.
pub trait Replacer: std::fmt::Debug + Send + Sync {
    /// Selects an evictable frame, removes it from the evictable set,
    /// and returns it. `None` if no frame is evictable.
    fn victim(&mut self) -> Option<FrameId>;

    /// Marks `frame_id` as not evictable. Registers an unknown
    /// `frame_id` in the not-evictable state.
    fn pin(&mut self, frame_id: FrameId);

    /// Marks a known `frame_id` as evictable. Precondition: the frame is
    /// known (it was previously `pin`ned).
    fn unpin(&mut self, frame_id: FrameId);

    /// Count of entries currently evictable.
    fn size(&self) -> usize;
}
