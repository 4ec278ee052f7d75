//! Fixed-capacity ordered list with circular storage.
//!
//! ```text
//!   slots  = [D, B, C]      capacity = 3, len = 3
//!   cursor = 1              logical order: B, C, D
//!
//!   logical i  =>  slots[(cursor + i) % len]
//! ```
//!
//! Physical storage never holds more than `len` slots: the list grows by
//! pushing until it reaches `capacity`, after which `append` overwrites the
//! logical-first slot and advances `cursor`. The cursor is non-zero only while
//! the list is full; every O(n) operation (`insert_at`, `remove_range`,
//! `truncate`) first re-packs the slots so that the cursor is back at 0.
//!
//! Eviction of the oldest element on overflow is part of the contract, not an
//! error. It is reported through [`Pushed::evicted`].

use std::iter::FusedIterator;

use crate::error::{Result, SeriesError};

/// Result of pushing onto a [`RingList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pushed<T> {
    /// Logical position of the pushed element.
    pub position: usize,
    /// Element dropped from the logical front because the list was full.
    pub evicted: Option<T>,
}

#[derive(Debug, Clone)]
pub struct RingList<T> {
    slots: Vec<T>,
    capacity: usize,
    cursor: usize,
}

impl<T> RingList<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 {
            return Err(SeriesError::InvalidCapacity(capacity));
        }
        Ok(Self {
            slots: Vec::new(),
            capacity,
            cursor: 0,
        })
    }

    /// Empty list with the same capacity, for storage that must stay
    /// position-aligned with this one.
    pub fn empty_like<U>(&self) -> RingList<U> {
        RingList {
            slots: Vec::new(),
            capacity: self.capacity,
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Physical slot of the logical-first element.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    fn physical(&self, index: usize) -> usize {
        let len = self.slots.len();
        let p = self.cursor + index;
        if p >= len {
            p - len
        } else {
            p
        }
    }

    fn check(&self, index: usize) -> Result<()> {
        if index >= self.slots.len() {
            return Err(SeriesError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Move the logical-first element back to slot 0.
    fn repack(&mut self) {
        if self.cursor != 0 {
            self.slots.rotate_left(self.cursor);
            self.cursor = 0;
        }
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        self.check(index)?;
        Ok(&self.slots[self.physical(index)])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        self.check(index)?;
        let p = self.physical(index);
        Ok(&mut self.slots[p])
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    pub fn first(&self) -> Option<&T> {
        self.get(0).ok()
    }

    pub fn last(&self) -> Option<&T> {
        self.slots.len().checked_sub(1).and_then(|i| self.get(i).ok())
    }

    /// Append `value` at the logical end and return its position. When the
    /// list is full the oldest element is silently dropped.
    pub fn append(&mut self, value: T) -> usize {
        self.push_back(value).position
    }

    /// Like [`append`](Self::append), handing back the evicted element.
    pub fn push_back(&mut self, value: T) -> Pushed<T> {
        if self.slots.len() < self.capacity {
            // below capacity the cursor is always 0
            self.slots.push(value);
            return Pushed {
                position: self.slots.len() - 1,
                evicted: None,
            };
        }
        let old = std::mem::replace(&mut self.slots[self.cursor], value);
        self.cursor = (self.cursor + 1) % self.capacity;
        tracing::trace!(capacity = self.capacity, "ring full, evicted oldest element");
        Pushed {
            position: self.capacity - 1,
            evicted: Some(old),
        }
    }

    /// Insert `value` so that it ends up before the element currently at
    /// `index` (`index == len` appends).
    ///
    /// When the list is full, the logical-first element is evicted to make
    /// room and the value lands at `index - 1`. Inserting at position 0 of a
    /// full list would make the new value the oldest element, so it is dropped
    /// instead and `Ok(None)` is returned with the list unchanged.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<Option<usize>> {
        let len = self.slots.len();
        if index > len {
            return Err(SeriesError::IndexOutOfRange { index, len });
        }
        if index == len && !self.is_full() {
            return Ok(Some(self.append(value)));
        }
        if !self.is_full() {
            self.repack();
            self.slots.insert(index, value);
            return Ok(Some(index));
        }
        if index == 0 {
            tracing::trace!(capacity = self.capacity, "insert before oldest of full ring dropped");
            return Ok(None);
        }
        self.repack();
        self.slots.remove(0);
        self.slots.insert(index - 1, value);
        Ok(Some(index - 1))
    }

    /// Remove `count` elements starting at logical `index`.
    pub fn remove_range(&mut self, index: usize, count: usize) -> Result<()> {
        let len = self.slots.len();
        let end = index
            .checked_add(count)
            .filter(|&end| end <= len)
            .ok_or(SeriesError::IndexOutOfRange {
                index: index.saturating_add(count),
                len,
            })?;
        if count == 0 {
            return Ok(());
        }
        self.repack();
        self.slots.drain(index..end);
        Ok(())
    }

    /// Keep the first `len` elements. No-op when `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.slots.len() {
            return;
        }
        self.repack();
        self.slots.truncate(len);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }

    /// The logical contents as at most two contiguous physical runs.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (tail, head) = self.slots.split_at(self.cursor);
        (head, tail)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let (front, back) = self.as_slices();
        Iter {
            front: front.iter(),
            back: back.iter(),
        }
    }

    /// Index of the first element for which `pred` is false, assuming the
    /// list is partitioned by `pred` in logical order.
    pub fn partition_point<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut left = 0usize;
        let mut right = self.slots.len();
        while left < right {
            let mid = left + (right - left) / 2;
            if pred(&self.slots[self.physical(mid)]) {
                left = mid + 1;
            } else {
                right = mid;
            }
        }
        left
    }
}

impl<T: Clone> RingList<T> {
    /// Logically ordered copy of the whole list.
    pub fn to_vec(&self) -> Vec<T> {
        let (front, back) = self.as_slices();
        let mut out = Vec::with_capacity(self.slots.len());
        out.extend_from_slice(front);
        out.extend_from_slice(back);
        out
    }

    /// Logically ordered copy of `len` elements starting at `from`.
    pub fn slice(&self, from: usize, len: usize) -> Result<Vec<T>> {
        let size = self.slots.len();
        let end = from
            .checked_add(len)
            .filter(|&end| end <= size)
            .ok_or(SeriesError::IndexOutOfRange {
                index: from.saturating_add(len),
                len: size,
            })?;
        let (front, back) = self.as_slices();
        let mut out = Vec::with_capacity(len);
        if from < front.len() {
            out.extend_from_slice(&front[from..end.min(front.len())]);
        }
        if end > front.len() {
            let start = from.saturating_sub(front.len());
            out.extend_from_slice(&back[start..end - front.len()]);
        }
        Ok(out)
    }
}

impl<'a, T> IntoIterator for &'a RingList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Logical-order iterator over a [`RingList`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    front: std::slice::Iter<'a, T>,
    back: std::slice::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.front.next().or_else(|| self.back.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.front.len() + self.back.len();
        (n, Some(n))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.back.next_back().or_else(|| self.front.next_back())
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
