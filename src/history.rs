use std::collections::VecDeque;

use serde::Serialize;

use crate::engagement::Engagement;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct InterestSample {
    pub interest: f32,
    pub state: Engagement,
}

/// Interest of every member at the moment the group entered a topic.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterestSnapshot {
    pub frame: u64,
    /// Catalog id of the topic the group had just entered.
    pub topic: usize,
    pub samples: Vec<InterestSample>,
}

/// Fixed-capacity ring of snapshots; the oldest is evicted first.
#[derive(Clone, Debug, Serialize)]
pub struct InterestHistory {
    capacity: usize,
    entries: VecDeque<InterestSnapshot>,
}

impl InterestHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, snapshot: InterestSnapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&InterestSnapshot> {
        self.entries.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &InterestSnapshot> {
        self.entries.iter()
    }

    /// Topic ids in visiting order, oldest first.
    pub fn topics(&self) -> Vec<usize> {
        self.entries.iter().map(|s| s.topic).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{InterestHistory, InterestSnapshot};

    fn snapshot(frame: u64) -> InterestSnapshot {
        InterestSnapshot {
            frame,
            topic: frame as usize,
            samples: Vec::new(),
        }
    }

    #[test]
    fn oldest_snapshot_is_evicted() {
        let mut history = InterestHistory::new(3);
        for frame in 0..5 {
            history.push(snapshot(frame));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.topics(), vec![2, 3, 4]);
        assert_eq!(history.latest().map(|s| s.frame), Some(4));
    }

    #[test]
    fn zero_capacity_still_keeps_latest() {
        let mut history = InterestHistory::new(0);
        history.push(snapshot(1));
        history.push(snapshot(2));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.topics(), vec![2]);
    }
}
