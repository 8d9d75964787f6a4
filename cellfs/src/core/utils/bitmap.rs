// SPDX-License-Identifier: MIT

//! Bit manipulation on single-word bitmaps.
//!
//! Bit `i` is `1 << i`. Callers decide what a set bit means; the
//! superblock bitmaps use set = free.

pub trait BitmapOps {
    /// Number of addressable bits.
    const WIDTH: usize;

    /// Sets or clears `bit`. Out-of-range bits are ignored.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Out-of-range bits read as `false`.
    fn get_bit(&self, bit: usize) -> bool;

    /// Set bits in `[start, end)`.
    fn count_ones_in_range(&self, start: usize, end: usize) -> usize;

    /// Lowest set bit in `[start, end)`.
    fn find_first_set(&self, start: usize, end: usize) -> Option<usize>;

    /// Sets every bit in `[start, end)` to `value`.
    fn fill_range(&mut self, start: usize, end: usize, value: bool);
}

impl BitmapOps for u64 {
    const WIDTH: usize = 64;

    #[inline]
    fn set_bit(&mut self, bit: usize, value: bool) {
        if bit >= Self::WIDTH {
            return;
        }
        if value {
            *self |= 1 << bit;
        } else {
            *self &= !(1 << bit);
        }
    }

    #[inline]
    fn get_bit(&self, bit: usize) -> bool {
        bit < Self::WIDTH && (*self >> bit) & 1 == 1
    }

    #[inline]
    fn count_ones_in_range(&self, start: usize, end: usize) -> usize {
        (*self & range_mask(start, end)).count_ones() as usize
    }

    #[inline]
    fn find_first_set(&self, start: usize, end: usize) -> Option<usize> {
        let masked = *self & range_mask(start, end);
        (masked != 0).then(|| masked.trailing_zeros() as usize)
    }

    fn fill_range(&mut self, start: usize, end: usize, value: bool) {
        let mask = range_mask(start, end);
        if value {
            *self |= mask;
        } else {
            *self &= !mask;
        }
    }
}

/// Mask with bits `[start, end)` set, clamped to 64 bits.
#[inline]
fn range_mask(start: usize, end: usize) -> u64 {
    let end = end.min(64);
    if start >= end {
        return 0;
    }
    let upper = if end == 64 { u64::MAX } else { (1u64 << end) - 1 };
    let lower = (1u64 << start) - 1;
    upper & !lower
}
