pub mod buffer_pool_manager;
pub mod frame;
pub mod replacer;

pub use buffer_pool_manager::{BufferPoolManager, FrameId};
pub use frame::Frame;
pub use replacer::{LruKReplacer, LruReplacer, Replacer};
