//! Growable double-ended circular buffer.
//!
//! Every streaming component buffers its raw input and its transformed output
//! in a [`RingBuffer`]. Capacity is always zero or a power of two so that logical
//! positions map to storage with a mask instead of a division.
//!
//! ## RT-Safety
//!
//! Pushes only allocate when the buffer outgrows its capacity. Once a stream has
//! reached its high-water mark, push/pop/copy operations are allocation-free.

use std::ops::{Index, IndexMut};

use crate::math::next_power_of_two;

/// Double-ended queue over a power-of-two backing store.
///
/// Logical index `i` lives at `(front + i) & (capacity - 1)`.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    front: usize,
    len: usize,
}

impl<T: Clone + Default> RingBuffer<T> {
    /// Create an empty buffer without allocating.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            front: 0,
            len: 0,
        }
    }

    /// Create an empty buffer able to hold `capacity` elements without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.reserve(capacity);
        buffer
    }

    /// Create a buffer holding `len` copies of `value`.
    pub fn from_value(len: usize, value: T) -> Self {
        let mut buffer = Self::with_capacity(len);
        buffer.resize_with_value(len, value);
        buffer
    }

    /// Number of stored elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing store (zero or a power of two).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn mask(&self) -> usize {
        self.data.len().wrapping_sub(1)
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        (self.front + logical) & self.mask()
    }

    /// Grow the backing store so it holds at least `total` elements.
    ///
    /// Reallocates to the next power of two and lays the contents out from
    /// physical index zero. Never shrinks.
    pub fn reserve(&mut self, total: usize) {
        if total <= self.capacity() {
            return;
        }

        let new_capacity = next_power_of_two(total);
        let mut data = vec![T::default(); new_capacity];
        let (head, tail) = self.segments(0, self.len);
        data[..head.len()].clone_from_slice(head);
        data[head.len()..head.len() + tail.len()].clone_from_slice(tail);

        self.data = data;
        self.front = 0;
    }

    /// Physical slices covering logical range `[start, start + count)`.
    fn segments(&self, start: usize, count: usize) -> (&[T], &[T]) {
        if count == 0 {
            return (&[], &[]);
        }
        let begin = self.physical(start);
        let first = count.min(self.capacity() - begin);
        (
            &self.data[begin..begin + first],
            &self.data[..count - first],
        )
    }

    fn segments_mut(&mut self, start: usize, count: usize) -> (&mut [T], &mut [T]) {
        if count == 0 {
            return (&mut [], &mut []);
        }
        let begin = self.physical(start);
        let first = count.min(self.capacity() - begin);
        let (low, high) = self.data.split_at_mut(begin);
        (&mut high[..first], &mut low[..count - first])
    }

    pub fn push_back(&mut self, value: T) {
        self.reserve(self.len + 1);
        let idx = self.physical(self.len);
        self.data[idx] = value;
        self.len += 1;
    }

    pub fn push_front(&mut self, value: T) {
        self.reserve(self.len + 1);
        self.front = (self.front + self.capacity() - 1) & self.mask();
        self.data[self.front] = value;
        self.len += 1;
    }

    /// Append a slice at the back.
    pub fn extend_back(&mut self, items: &[T]) {
        if items.is_empty() {
            return;
        }
        self.reserve(self.len + items.len());

        let start = self.len;
        let (head, tail) = self.segments_mut(start, items.len());
        let split = head.len();
        head.clone_from_slice(&items[..split]);
        tail.clone_from_slice(&items[split..]);
        self.len += items.len();
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = std::mem::take(&mut self.data[self.front]);
        self.front = (self.front + 1) & self.mask();
        self.len -= 1;
        Some(value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let idx = self.physical(self.len - 1);
        self.len -= 1;
        Some(std::mem::take(&mut self.data[idx]))
    }

    /// Remove up to `n` elements from the front.
    ///
    /// When `out` is given the removed elements are copied into its head, in
    /// order. The count is also limited by `out.len()`. Elements of `out` past
    /// the returned count are left untouched.
    pub fn pop_front_many(&mut self, out: Option<&mut [T]>, n: usize) -> usize {
        let mut count = n.min(self.len);
        if let Some(out) = out {
            count = count.min(out.len());
            self.copy_range(0, &mut out[..count]);
        }
        if count > 0 {
            self.front = self.physical(count);
            self.len -= count;
        }
        count
    }

    /// Remove up to `n` elements from the back.
    ///
    /// Copied elements keep their front-to-back order.
    pub fn pop_back_many(&mut self, out: Option<&mut [T]>, n: usize) -> usize {
        let mut count = n.min(self.len);
        if let Some(out) = out {
            count = count.min(out.len());
            self.copy_range(self.len - count, &mut out[..count]);
        }
        self.len -= count;
        count
    }

    /// Copy up to `n` leading elements into `out` without removing them.
    pub fn to_slice(&self, out: &mut [T], n: usize) -> usize {
        let count = n.min(self.len).min(out.len());
        self.copy_range(0, &mut out[..count]);
        count
    }

    /// Copy up to `n` trailing elements into `out` without removing them.
    pub fn to_slice_back(&self, out: &mut [T], n: usize) -> usize {
        let count = n.min(self.len).min(out.len());
        self.copy_range(self.len - count, &mut out[..count]);
        count
    }

    fn copy_range(&self, start: usize, out: &mut [T]) {
        let (head, tail) = self.segments(start, out.len());
        out[..head.len()].clone_from_slice(head);
        out[head.len()..].clone_from_slice(tail);
    }

    /// Resize to `len`, padding the back with `T::default()`.
    pub fn resize(&mut self, len: usize) {
        self.resize_with_value(len, T::default());
    }

    /// Resize to `len`.
    ///
    /// Growing pads the back with `fill`. Shrinking drops elements from the back.
    pub fn resize_with_value(&mut self, len: usize, fill: T) {
        if len <= self.len {
            self.truncate(len);
            return;
        }

        self.reserve(len);
        let start = self.len;
        let (head, tail) = self.segments_mut(start, len - start);
        head.fill(fill.clone());
        tail.fill(fill);
        self.len = len;
    }

    /// Keep only the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Drop all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.front = 0;
        self.len = 0;
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Element at logical position `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        (index < self.len).then(|| &self.data[self.physical(index)])
    }

    /// Element at a wrapped logical position. `-1` is the back.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    pub fn wrapped(&self, index: isize) -> &T {
        let idx = self.wrap_index(index);
        &self.data[idx]
    }

    /// Mutable element at a wrapped logical position. `-1` is the back.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    pub fn wrapped_mut(&mut self, index: isize) -> &mut T {
        let idx = self.wrap_index(index);
        &mut self.data[idx]
    }

    #[inline]
    fn wrap_index(&self, index: isize) -> usize {
        assert!(self.len > 0, "index into empty RingBuffer");
        let logical = index.rem_euclid(self.len as isize) as usize;
        self.physical(logical)
    }

    /// Iterate front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (head, tail) = self.segments(0, self.len);
        head.iter().chain(tail.iter())
    }
}

impl<T: Clone + Default> Index<usize> for RingBuffer<T> {
    type Output = T;

    /// Indices past the end wrap modulo the length.
    #[inline]
    fn index(&self, index: usize) -> &T {
        assert!(self.len > 0, "index into empty RingBuffer");
        &self.data[self.physical(index % self.len)]
    }
}

impl<T: Clone + Default> IndexMut<usize> for RingBuffer<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(self.len > 0, "index into empty RingBuffer");
        let idx = self.physical(index % self.len);
        &mut self.data[idx]
    }
}

impl<T: Clone + Default> FromIterator<T> for RingBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::new();
        for value in iter {
            buffer.push_back(value);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    #[test]
    fn test_push_pop_order() {
        let mut buffer = RingBuffer::new();
        for i in 0..10 {
            buffer.push_back(i);
        }
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.capacity(), 16);

        let mut out = [0; 4];
        assert_eq!(buffer.pop_front_many(Some(&mut out), 4), 4);
        assert_eq!(out, [0, 1, 2, 3]);
        assert_eq!(buffer.pop_front(), Some(4));
        assert_eq!(buffer.pop_back(), Some(9));
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_growth_preserves_order_across_wrap() {
        let mut buffer = RingBuffer::with_capacity(4);
        buffer.extend_back(&[1, 2, 3, 4]);
        buffer.pop_front_many(None, 3);
        buffer.extend_back(&[5, 6]);
        // Contents now straddle the physical end.
        buffer.extend_back(&[7, 8, 9]);

        assert_eq!(buffer.capacity(), 8);
        let collected: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(collected, vec![4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_capacity_is_power_of_two() {
        let buffer: RingBuffer<f32> = RingBuffer::with_capacity(1000);
        assert_eq!(buffer.capacity(), 1024);

        let mut buffer: RingBuffer<f32> = RingBuffer::new();
        buffer.resize(2049);
        assert_eq!(buffer.capacity(), 4096);
    }

    #[test]
    fn test_push_front() {
        let mut buffer = RingBuffer::new();
        buffer.push_back(2);
        buffer.push_front(1);
        buffer.push_front(0);
        let collected: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(collected, vec![0, 1, 2]);
        assert_eq!(buffer.front(), Some(&0));
        assert_eq!(buffer.back(), Some(&2));
    }

    #[test]
    fn test_pop_more_than_available() {
        let mut buffer: RingBuffer<i32> = (1..=3).collect();
        let mut out = [-1; 6];
        assert_eq!(buffer.pop_front_many(Some(&mut out), 6), 3);
        assert_eq!(out, [1, 2, 3, -1, -1, -1]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop_front_many(None, 10), 0);
    }

    #[test]
    fn test_pop_back_many_keeps_order() {
        let mut buffer: RingBuffer<i32> = (0..8).collect();
        let mut tail = [0; 3];
        assert_eq!(buffer.pop_back_many(Some(&mut tail), 3), 3);
        assert_eq!(tail, [5, 6, 7]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.back(), Some(&4));
    }

    #[test]
    fn test_wrapped_index() {
        let buffer: RingBuffer<i32> = (10..15).collect();
        assert_eq!(buffer[0], 10);
        assert_eq!(buffer[6], 11);
        assert_eq!(*buffer.wrapped(-1), 14);
        assert_eq!(*buffer.wrapped(-5), 10);
        assert_eq!(*buffer.wrapped(-6), 14);
    }

    #[test]
    fn test_resize_pads_and_truncates() {
        let mut buffer: RingBuffer<f32> = RingBuffer::from_value(2, 1.0);
        buffer.resize_with_value(4, 0.5);
        let collected: Vec<_> = buffer.iter().copied().collect();
        assert_eq!(collected, vec![1.0, 1.0, 0.5, 0.5]);

        buffer.resize(6);
        assert_eq!(buffer[5], 0.0);

        buffer.resize(1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer[0], 1.0);
    }

    #[test]
    fn test_to_slice_does_not_consume() {
        let buffer: RingBuffer<i32> = (0..6).collect();
        let mut head = [0; 4];
        let mut tail = [0; 2];
        assert_eq!(buffer.to_slice(&mut head, 4), 4);
        assert_eq!(buffer.to_slice_back(&mut tail, 2), 2);
        assert_eq!(head, [0, 1, 2, 3]);
        assert_eq!(tail, [4, 5]);
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut buffer: RingBuffer<i32> = (0..20).collect();
        let capacity = buffer.capacity();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);
        assert_eq!(buffer.front(), None);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(Vec<i32>),
        PushFront(i32),
        PopFront(usize),
        PopBack(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            prop::collection::vec(any::<i32>(), 0..40).prop_map(Op::Push),
            any::<i32>().prop_map(Op::PushFront),
            (0usize..50).prop_map(Op::PopFront),
            (0usize..50).prop_map(Op::PopBack),
        ]
    }

    proptest! {
        #[test]
        fn prop_matches_vecdeque(ops in prop::collection::vec(op_strategy(), 0..60)) {
            let mut buffer = RingBuffer::new();
            let mut model = VecDeque::new();
            let mut pushed = 0usize;
            let mut popped = 0usize;

            for op in ops {
                match op {
                    Op::Push(items) => {
                        buffer.extend_back(&items);
                        pushed += items.len();
                        model.extend(items);
                    }
                    Op::PushFront(value) => {
                        buffer.push_front(value);
                        model.push_front(value);
                        pushed += 1;
                    }
                    Op::PopFront(n) => {
                        let mut out = vec![0; n];
                        let count = buffer.pop_front_many(Some(&mut out), n);
                        let expected: Vec<_> = model.drain(..n.min(model.len())).collect();
                        prop_assert_eq!(&out[..count], &expected[..]);
                        popped += count;
                    }
                    Op::PopBack(n) => {
                        let mut out = vec![0; n];
                        let count = buffer.pop_back_many(Some(&mut out), n);
                        let keep = model.len() - n.min(model.len());
                        let expected: Vec<_> = model.drain(keep..).collect();
                        prop_assert_eq!(&out[..count], &expected[..]);
                        popped += count;
                    }
                }
                prop_assert_eq!(buffer.len(), pushed - popped);
                prop_assert!(buffer.capacity() == 0 || buffer.capacity().is_power_of_two());
            }

            let remaining: Vec<_> = buffer.iter().copied().collect();
            let expected: Vec<_> = model.into_iter().collect();
            prop_assert_eq!(remaining, expected);
        }
    }
}
