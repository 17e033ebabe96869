//! Delayed despawn queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::types::Instance;

/// A despawn waiting for its due time.
struct DelayedDespawn<O> {
    due_ms: u128,
    seq: u64,
    instance: Instance<O>,
}

impl<O> PartialEq for DelayedDespawn<O> {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl<O> Eq for DelayedDespawn<O> {}

impl<O> PartialOrd for DelayedDespawn<O> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<O> Ord for DelayedDespawn<O> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest due first, FIFO within the same due time (reversed for max-heap).
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of despawns keyed by due time.
///
/// Entries are not cancellable. Whoever drains them must re-check that the
/// instance is still live under the same serial.
pub(crate) struct DeferredDespawns<O> {
    heap: BinaryHeap<DelayedDespawn<O>>,
    next_seq: u64,
}

impl<O> DeferredDespawns<O> {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn schedule(&mut self, instance: Instance<O>, due_ms: u128) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(DelayedDespawn {
            due_ms,
            seq,
            instance,
        });
    }

    /// Remove and return every entry due at or before `now_ms`, earliest first.
    pub(crate) fn drain_due(&mut self, now_ms: u128) -> Vec<Instance<O>> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|entry| entry.due_ms <= now_ms) {
            if let Some(entry) = self.heap.pop() {
                due.push(entry.instance);
            }
        }
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }
}
