use super::Replacer;
use crate::storage::buffer::buffer_pool_manager::FrameId;
use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
struct LruKNode {
    /// Timestamps of the last (at most) `k` accesses, oldest first.
    history: VecDeque<usize>,
    k: usize,
    is_evictable: bool,
}

impl LruKNode {
    fn new(k: usize) -> Self {
        LruKNode {
            history: VecDeque::with_capacity(k),
            k,
            is_evictable: false,
        }
    }

    fn has_infinite_backwards_k_distance(&self) -> bool {
        self.history.len() < self.k
    }

    /// The k'th most recent access's distance from `current_timestamp`.
    /// Precondition: `!has_infinite_backwards_k_distance()`.
    fn backwards_k_distance(&self, current_timestamp: usize) -> usize {
        let k_th_last_access = self.history[self.history.len() - self.k];
        current_timestamp.saturating_sub(k_th_last_access)
    }

    fn record_access(&mut self, timestamp: usize) {
        if self.history.len() == self.k {
            self.history.pop_front();
        }
        self.history.push_back(timestamp);
    }
}

/// LRU-K replacer (spec.md §4.1.2): evicts the evictable frame with the
/// largest backward k-distance, treating frames with fewer than `k`
/// recorded accesses as having infinite backward k-distance and
/// breaking ties among those by earliest first access.
#[derive(Debug)]
pub struct LruKReplacer {
    node_store: HashMap<FrameId, LruKNode>,
    current_timestamp: usize,
    curr_size: usize,
    k: usize,
}

impl LruKReplacer {
    pub fn new(k: usize) -> Self {
        LruKReplacer {
            node_store: HashMap::new(),
            current_timestamp: 0,
            curr_size: 0,
            k,
        }
    }
}

impl Replacer for LruKReplacer {
    fn victim(&mut self) -> Option<FrameId> {
        let mut best_infinite: Option<(FrameId, usize)> = None;
        let mut best_finite: Option<(FrameId, usize)> = None;

        for (&frame_id, node) in &self.node_store {
            if !node.is_evictable {
                continue;
            }
            if node.has_infinite_backwards_k_distance() {
                let first_access = *node.history.front().unwrap_or(&0);
                if best_infinite.is_none_or(|(_, ts)| first_access < ts) {
                    best_infinite = Some((frame_id, first_access));
                }
            } else {
                let dist = node.backwards_k_distance(self.current_timestamp);
                if best_finite.is_none_or(|(_, d)| dist > d) {
                    best_finite = Some((frame_id, dist));
                }
            }
        }

        let victim = best_infinite.map(|(f, _)| f).or(best_finite.map(|(f, _)| f));
        if let Some(frame_id) = victim {
            self.node_store.remove(&frame_id);
            self.curr_size -= 1;
        }
        victim
    }

    fn pin(&mut self, frame_id: FrameId) {
        let node = self.node_store.entry(frame_id).or_insert_with(|| LruKNode::new(self.k));
        if node.is_evictable {
            node.is_evictable = false;
            self.curr_size -= 1;
        }
        node.record_access(self.current_timestamp);
        self.current_timestamp += 1;
    }

    fn unpin(&mut self, frame_id: FrameId) {
        let node = self
            .node_store
            .get_mut(&frame_id)
            .expect("unpin called on a frame unknown to the replacer");
        if !node.is_evictable {
            node.is_evictable = true;
            self.curr_size += 1;
        }
    }

    fn size(&self) -> usize {
        self.curr_size
    }
}
