use std::collections::HashMap;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};

/// Turns completion-order arrivals into strictly ascending index order.
///
/// Items for indices in `[start, end)` may arrive in any order. An item is released once
/// every lower index has been released.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    end: u64,
    pending: HashMap<u64, T>,
}

impl<T> ReorderBuffer<T> {
    /// Buffer for indices `[start, end)`.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            next: start,
            end,
            pending: HashMap::new(),
        }
    }

    /// Accept one item. Rejects indices already seen and indices outside the range.
    pub fn insert(&mut self, index: FrameIndex, item: T) -> ReelResult<()> {
        let i = index.0;
        if i >= self.end {
            return Err(ReelError::IndexOutOfRange {
                index: i,
                len: self.end,
            });
        }
        if i < self.next || self.pending.contains_key(&i) {
            return Err(ReelError::DuplicateFrame { index: i });
        }
        self.pending.insert(i, item);
        Ok(())
    }

    /// Next item in index order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<(FrameIndex, T)> {
        let item = self.pending.remove(&self.next)?;
        let index = FrameIndex(self.next);
        self.next += 1;
        Some((index, item))
    }

    /// First index not yet released.
    pub fn next_index(&self) -> FrameIndex {
        FrameIndex(self.next)
    }

    /// Items held back waiting for a lower index.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// `true` once every index in the range has been released.
    pub fn is_complete(&self) -> bool {
        self.next >= self.end
    }

    /// Close the buffer, failing with the first index that never arrived.
    pub fn finish(self) -> ReelResult<()> {
        if self.next < self.end {
            return Err(ReelError::MissingFrame { index: self.next });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/reorder.rs"]
mod tests;
