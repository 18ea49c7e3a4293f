//! Bounded wrap-around cursor over an ordered list
//!
//! Used by keyboard navigation in the speed/quality/volume menus: focus
//! moves forward or backward through menu entries and wraps at either end.

/// Cyclic cursor over a list captured at construction.
#[derive(Debug, Clone)]
pub struct CyclicIterator<T> {
    items: Vec<T>,
    index: usize,
}

impl<T: Clone> CyclicIterator<T> {
    /// Capture `items` and place the cursor at index 0.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, index: 0 }
    }

    fn last_index(&self) -> usize {
        self.items.len().saturating_sub(1)
    }

    /// Advance the cursor and return the element it lands on.
    ///
    /// If `explicit` is a valid index it is used as the base instead of the
    /// cursor. Wraps to the first element when the base is the last index.
    /// On an empty list this returns `None` and leaves the cursor unchanged.
    pub fn next(&mut self, explicit: Option<usize>) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let base = explicit.filter(|&i| i < self.items.len()).unwrap_or(self.index);
        self.index = if base == self.last_index() { 0 } else { base + 1 };
        self.items.get(self.index).cloned()
    }

    /// Move the cursor backward, wrapping to the last element below index 1.
    ///
    /// Symmetric with [`next`](Self::next), including the empty-list case.
    pub fn prev(&mut self, explicit: Option<usize>) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let base = explicit.filter(|&i| i < self.items.len()).unwrap_or(self.index);
        self.index = if base < 1 { self.last_index() } else { base - 1 };
        self.items.get(self.index).cloned()
    }

    /// Element at index 0 without moving the cursor.
    pub fn first(&self) -> Option<T> {
        self.items.first().cloned()
    }

    /// Element at the last index without moving the cursor.
    pub fn last(&self) -> Option<T> {
        self.items.last().cloned()
    }

    /// Element under the cursor.
    pub fn current(&self) -> Option<T> {
        self.items.get(self.index).cloned()
    }

    /// True iff the cursor is at the last index.
    pub fn is_end(&self) -> bool {
        !self.items.is_empty() && self.index == self.last_index()
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of captured elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True iff no elements were captured.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
