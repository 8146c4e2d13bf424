//! Bounded, append-only rotation history.

use super::value_objects::RotationEvent;
use std::collections::VecDeque;

/// Ring buffer of [`RotationEvent`]s; the oldest entry is evicted when full.
#[derive(Debug, Clone)]
pub struct RotationLog {
    capacity: usize,
    events: VecDeque<RotationEvent>,
}

impl RotationLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: RotationEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<RotationEvent> {
        self.events.iter().cloned().collect()
    }
}
