use std::collections::VecDeque;

use crate::grid::Frame;

/// Undo stack capacity; the oldest snapshot is evicted beyond this.
pub const UNDO_CAPACITY: usize = 30;

/// Bounded snapshot-based undo/redo. Snapshots are deep frame copies taken
/// before a mutation begins; the manager never mutates a frame in place.
#[derive(Debug, Default)]
pub struct History {
    undo: VecDeque<Frame>,
    redo: Vec<Frame>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot ahead of a mutation. Any redo history becomes
    /// unreachable from this point.
    pub fn push(&mut self, snapshot: Frame) {
        self.undo.push_back(snapshot);
        if self.undo.len() > UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Swap the current frame for the most recent snapshot. Returns `false`
    /// (and leaves `current` untouched) when there is nothing to undo.
    pub fn undo(&mut self, current: &mut Frame) -> bool {
        let Some(snapshot) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, snapshot));
        true
    }

    pub fn redo(&mut self, current: &mut Frame) -> bool {
        let Some(snapshot) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(std::mem::replace(current, snapshot));
        true
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
