use super::Replacer;
use crate::storage::buffer::buffer_pool_manager::FrameId;
use std::collections::{HashMap, VecDeque};

/// Classical LRU replacer (spec.md §4.1.1): an ordered sequence of
/// frames, most-recently-touched at the front, with an evictable flag
/// per frame. `victim` scans from the back for the first evictable
/// entry.
#[derive(Debug)]
pub struct LruReplacer {
    /// Front = most recently touched.
    order: VecDeque<FrameId>,
    evictable: HashMap<FrameId, bool>,
    curr_size: usize,
}

impl LruReplacer {
    pub fn new() -> Self {
        LruReplacer {
            order: VecDeque::new(),
            evictable: HashMap::new(),
            curr_size: 0,
        }
    }

    fn move_to_front(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.order.iter().position(|&f| f == frame_id) {
            self.order.remove(pos);
        }
        self.order.push_front(frame_id);
    }
}

impl Default for LruReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for LruReplacer {
    fn victim(&mut self) -> Option<FrameId> {
        let pos = self
            .order
            .iter()
            .rposition(|f| *self.evictable.get(f).unwrap_or(&false))?;
        let frame_id = self.order.remove(pos).unwrap();
        self.evictable.remove(&frame_id);
        self.curr_size -= 1;
        Some(frame_id)
    }

    fn pin(&mut self, frame_id: FrameId) {
        match self.evictable.get_mut(&frame_id) {
            Some(flag) => {
                if *flag {
                    *flag = false;
                    self.curr_size -= 1;
                }
                self.move_to_front(frame_id);
            }
            None => {
                self.evictable.insert(frame_id, false);
                self.order.push_front(frame_id);
            }
        }
    }

    fn unpin(&mut self, frame_id: FrameId) {
        let flag = self
            .evictable
            .get_mut(&frame_id)
            .expect("unpin called on a frame unknown to the replacer");
        if !*flag {
            *flag = true;
            self.curr_size += 1;
        }
    }

    fn size(&self) -> usize {
        self.curr_size
    }
}
