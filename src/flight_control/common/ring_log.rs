use std::collections::VecDeque;

/// A fixed-capacity FIFO log.
/// Appending to a full log evicts the oldest entry, so the log always holds
/// the most recent `capacity` entries in insertion order.
#[derive(Debug, Clone)]
pub struct RingLog<T> {
    /// The stored entries, oldest at the front.
    entries: VecDeque<T>,
    /// The maximum number of retained entries.
    capacity: usize,
}

impl<T> RingLog<T> {
    /// Creates a new, empty `RingLog`.
    ///
    /// # Arguments
    /// - `capacity`: The maximum number of retained entries.
    pub fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    /// Appends an entry, evicting the oldest one if the log is full.
    ///
    /// # Returns
    /// - The evicted entry, if any.
    pub fn push(&mut self, entry: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(entry);
        }
        let evicted =
            if self.entries.len() == self.capacity { self.entries.pop_front() } else { None };
        self.entries.push_back(entry);
        evicted
    }

    /// Returns a reference to the most recently appended entry.
    pub fn latest(&self) -> Option<&T> { self.entries.back() }

    /// Returns a reference to the oldest retained entry.
    pub fn oldest(&self) -> Option<&T> { self.entries.front() }

    /// Iterates over the entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> { self.entries.iter() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn capacity(&self) -> usize { self.capacity }

    /// Removes all entries. The capacity is kept.
    pub fn clear(&mut self) { self.entries.clear() }
}

impl<T: Clone> RingLog<T> {
    /// Copies the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<T> { self.entries.iter().cloned().collect() }
}
