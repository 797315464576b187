/*
 *  ringbuf.rs
 *
 *  keyload - load on the keys
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed capacity circular sample history
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::ops::{Add, Div};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("index {index} out of range for ring buffer of capacity {capacity}")]
    IndexOutOfRange { index: usize, capacity: usize },
}

/// Anything the ring buffer can fold into a sum and an average.
pub trait Sample: Copy + Default + Add<Output = Self> + Div<Output = Self> {
    /// Converts an element count into the sample type, used as the divisor for averages.
    fn from_count(count: usize) -> Self;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn from_count(count: usize) -> Self { count as $t }
            }
        )*
    };
}

impl_sample!(f32, f64, u32, u64, i32, i64, usize);

/// Circular store of the last `capacity` samples.
///
/// Capacity is fixed at construction. Storage is zero (`Default`) initialised,
/// the write cursor wraps modulo capacity and the logical length saturates at
/// capacity, after which the buffer reports itself as wrapped for good.
///
/// Note on ordering:
/// * `sum`/`average` fold over the first `len` *storage slots*, in raw slot
///   order, not in insertion order.
/// * `time_ordered` reads forward from the write cursor, so the first value is
///   the slot due to be overwritten next. Until the first wrap that read
///   includes zero slots.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    cursor: usize,
    len: usize,
    wrapped: bool,
}

impl<T: Sample> RingBuffer<T> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity.max(1)],
            cursor: 0,
            len: 0,
            wrapped: false,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of slots holding real samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the cursor has gone all the way round at least once.
    #[inline]
    pub fn wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn add_val(&mut self, value: T) {
        self.data[self.cursor] = value;
        self.cursor += 1;
        if !self.wrapped {
            self.len += 1;
        }
        if self.cursor == self.data.len() {
            self.wrapped = true;
            debug_assert_eq!(self.len, self.data.len());
            self.cursor = 0;
        }
    }

    pub fn sum(&self) -> T {
        self.data[..self.len]
            .iter()
            .fold(T::default(), |acc, v| acc + *v)
    }

    /// Mean of the occupied slots, `None` until the first insertion.
    pub fn average(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        Some(self.sum() / T::from_count(self.len))
    }

    /// `count` values read forward from the write cursor, wrapping at capacity.
    pub fn time_ordered(&self, count: usize) -> Result<Vec<T>, RingBufferError> {
        let capacity = self.data.len();
        if count > capacity {
            return Err(RingBufferError::IndexOutOfRange { index: count, capacity });
        }
        let mut idx = self.cursor;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.data[idx]);
            idx += 1;
            if idx >= capacity {
                idx = 0;
            }
        }
        Ok(out)
    }

    /// Raw storage slot, regardless of whether it has been written yet.
    pub fn get(&self, index: usize) -> Result<T, RingBufferError> {
        self.data
            .get(index)
            .copied()
            .ok_or(RingBufferError::IndexOutOfRange { index, capacity: self.data.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_then_wraps() {
        let mut rb = RingBuffer::<f32>::new(4);
        assert!(rb.is_empty());
        for v in [1.0, 2.0, 3.0] {
            rb.add_val(v);
        }
        assert_eq!(rb.len(), 3);
        assert!(!rb.wrapped());

        rb.add_val(4.0);
        assert_eq!(rb.len(), 4);
        assert!(rb.wrapped());

        for v in [5.0, 6.0, 7.0, 8.0, 9.0] {
            rb.add_val(v);
            assert_eq!(rb.len(), 4);
            assert!(rb.wrapped());
        }
        assert_eq!(rb.capacity(), 4);
    }

    #[test]
    fn test_average_of_three() {
        let mut rb = RingBuffer::<f64>::new(3);
        rb.add_val(10.0);
        rb.add_val(20.0);
        rb.add_val(60.0);
        assert_eq!(rb.average(), Some(30.0));
        assert_eq!(rb.sum(), 90.0);
    }

    #[test]
    fn test_average_is_stable() {
        let mut rb = RingBuffer::<f32>::new(5);
        rb.add_val(12.5);
        rb.add_val(40.0);
        let first = rb.average();
        assert_eq!(rb.average(), first);
        assert_eq!(rb.average(), first);
    }

    #[test]
    fn test_average_empty_is_none() {
        let rb = RingBuffer::<f32>::new(3);
        assert_eq!(rb.average(), None);
        assert_eq!(rb.sum(), 0.0);
    }

    #[test]
    fn test_partial_sum_covers_occupied_prefix() {
        let mut rb = RingBuffer::<u64>::new(8);
        rb.add_val(3);
        rb.add_val(4);
        assert_eq!(rb.sum(), 7);
        assert_eq!(rb.average(), Some(3));
    }

    #[test]
    fn test_average_after_wrap_uses_whole_buffer() {
        let mut rb = RingBuffer::<f32>::new(2);
        rb.add_val(100.0);
        rb.add_val(0.0);
        rb.add_val(50.0); // overwrites the 100
        assert_eq!(rb.average(), Some(25.0));
    }

    #[test]
    fn test_time_ordered_reads_from_cursor() {
        let mut rb = RingBuffer::<u32>::new(3);
        rb.add_val(1);
        // cursor sits on slot 1, which has never been written
        assert_eq!(rb.time_ordered(3).unwrap(), vec![0, 0, 1]);

        rb.add_val(2);
        rb.add_val(3);
        assert_eq!(rb.time_ordered(3).unwrap(), vec![1, 2, 3]);

        rb.add_val(4);
        assert_eq!(rb.time_ordered(3).unwrap(), vec![2, 3, 4]);
        assert_eq!(rb.time_ordered(2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_time_ordered_rejects_oversized_read() {
        let rb = RingBuffer::<f32>::new(3);
        assert_eq!(
            rb.time_ordered(4),
            Err(RingBufferError::IndexOutOfRange { index: 4, capacity: 3 })
        );
    }

    #[test]
    fn test_get_bounds() {
        let mut rb = RingBuffer::<i32>::new(2);
        rb.add_val(-7);
        assert_eq!(rb.get(0), Ok(-7));
        assert_eq!(rb.get(1), Ok(0));
        assert!(rb.get(2).is_err());
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let mut rb = RingBuffer::<f32>::new(0);
        assert_eq!(rb.capacity(), 1);
        rb.add_val(9.0);
        rb.add_val(11.0);
        assert_eq!(rb.average(), Some(11.0));
    }
}
